mod cancellation;
mod coec;
mod engine;
mod import;
mod request;
mod strategy;

pub use engine::{GenerationResult, JudgmentEngine};
pub use request::GenerationRequest;

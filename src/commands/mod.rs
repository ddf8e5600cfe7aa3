pub mod coec;
mod generate;
pub mod import;
pub mod load_events;
pub mod run;
pub mod status;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::model::JudgmentType;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventStatName {
    ImportJudgmentRatingGenerations,
    UbiJudgmentRatingGenerations,
}

impl EventStatName {
    pub fn for_judgment_type(judgment_type: JudgmentType) -> Self {
        match judgment_type {
            JudgmentType::Import => Self::ImportJudgmentRatingGenerations,
            JudgmentType::ClickModel => Self::UbiJudgmentRatingGenerations,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImportJudgmentRatingGenerations => "import_judgment_rating_generations",
            Self::UbiJudgmentRatingGenerations => "ubi_judgment_rating_generations",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventStatsSnapshot {
    pub import_judgment_rating_generations: u64,
    pub ubi_judgment_rating_generations: u64,
}

/// Advisory usage counters shared across concurrent generations.
#[derive(Debug)]
pub struct EventStats {
    enabled: bool,
    import_generations: AtomicU64,
    ubi_generations: AtomicU64,
}

impl EventStats {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            import_generations: AtomicU64::new(0),
            ubi_generations: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn increment(&self, stat: EventStatName) {
        if !self.is_enabled() {
            return;
        }

        let counter = match stat {
            EventStatName::ImportJudgmentRatingGenerations => &self.import_generations,
            EventStatName::UbiJudgmentRatingGenerations => &self.ubi_generations,
        };
        let value = counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(stat = stat.as_str(), value, "event stat incremented");
    }

    pub fn snapshot(&self) -> EventStatsSnapshot {
        EventStatsSnapshot {
            import_judgment_rating_generations: self.import_generations.load(Ordering::Relaxed),
            ubi_judgment_rating_generations: self.ubi_generations.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventStats {
    fn default() -> Self {
        Self::new(true)
    }
}

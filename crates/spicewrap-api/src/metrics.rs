use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters collected during one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Complete prototypes handed to the generator
    pub total: usize,

    /// Prototypes that produced a wrapper
    pub accepted: usize,

    /// Prototypes discarded through the exclusion set
    pub excluded: usize,

    /// Prototypes dropped by a parse or classification fault
    pub failed: usize,

    /// Unknown native types encountered (one per occurrence)
    pub unknown_types: usize,

    /// Whether the input ended in the middle of a prototype
    pub unterminated: bool,

    /// Wall time spent generating
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self {
            total: 0,
            accepted: 0,
            excluded: 0,
            failed: 0,
            unknown_types: 0,
            unterminated: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl GenerationMetrics {
    /// Accepted share of all prototypes (0.0 to 1.0)
    pub fn acceptance_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.accepted as f64 / self.total as f64
        }
    }

    /// The line printed on the diagnostic stream at the end of a run
    pub fn summary(&self) -> String {
        format!("prototypes used: {}, total: {}", self.accepted, self.total)
    }

    /// Merge another metrics object into this one
    pub fn merge(&mut self, other: &GenerationMetrics) {
        self.total += other.total;
        self.accepted += other.accepted;
        self.excluded += other.excluded;
        self.failed += other.failed;
        self.unknown_types += other.unknown_types;
        self.unterminated |= other.unterminated;
        self.elapsed += other.elapsed;
    }
}

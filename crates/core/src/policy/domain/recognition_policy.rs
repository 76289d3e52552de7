use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::policy::domain::person::{PersonDirectory, PersonRecord};
use crate::recognition::domain::gallery::PersonId;
use crate::recognition::domain::match_result::MatchResult;
use crate::shared::constants::{DEFAULT_ALERT_COOLDOWN_SECS, DEFAULT_MAX_DISTANCE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyConfig {
    /// Largest match distance accepted as a known person.
    pub max_distance: f64,
    /// Minimum time between two alerts for the same person.
    pub alert_cooldown: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            alert_cooldown: Duration::from_secs(DEFAULT_ALERT_COOLDOWN_SECS),
        }
    }
}

/// What the application should do with one match.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Unknown,
    Recognized { person: PersonRecord, distance: f64 },
    Alert { person: PersonRecord, distance: f64 },
}

impl Verdict {
    pub fn person(&self) -> Option<&PersonRecord> {
        match self {
            Verdict::Unknown => None,
            Verdict::Recognized { person, .. } | Verdict::Alert { person, .. } => Some(person),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Verdict::Alert { .. })
    }
}

/// Running counters over every evaluated match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecognitionStats {
    /// Accepted matches, alerts included.
    pub recognized: u64,
    pub unknown: u64,
    pub alerts: u64,
}

/// Thresholding and alert cooldown applied on top of raw match results.
///
/// Holds per-person alert timestamps, so one instance should live as long
/// as the monitoring session.
#[derive(Debug, Default)]
pub struct RecognitionPolicy {
    config: PolicyConfig,
    last_alert: HashMap<PersonId, Instant>,
    stats: RecognitionStats,
}

impl RecognitionPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            last_alert: HashMap::new(),
            stats: RecognitionStats::default(),
        }
    }

    pub fn stats(&self) -> RecognitionStats {
        self.stats
    }

    /// Classifies one match result at time `now`.
    ///
    /// A flagged person alerts only when strictly more than the cooldown
    /// has passed since their previous alert. Whether an alert is also
    /// announced loudly is up to the sinks the caller installs.
    pub fn evaluate(
        &mut self,
        result: &MatchResult,
        directory: &PersonDirectory,
        now: Instant,
    ) -> Verdict {
        let accepted = result
            .person_id
            .filter(|_| result.distance <= self.config.max_distance)
            .and_then(|id| directory.get(id));
        let Some(person) = accepted else {
            self.stats.unknown += 1;
            return Verdict::Unknown;
        };

        self.stats.recognized += 1;
        let person = person.clone();
        let distance = result.distance;
        if !person.is_flagged() {
            return Verdict::Recognized { person, distance };
        }

        let cooled_down = self
            .last_alert
            .get(&person.id)
            .map_or(true, |last| now.saturating_duration_since(*last) > self.config.alert_cooldown);
        if !cooled_down {
            return Verdict::Recognized { person, distance };
        }

        self.last_alert.insert(person.id, now);
        self.stats.alerts += 1;
        Verdict::Alert { person, distance }
    }
}

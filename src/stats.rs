use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::model::config::FlagUsage;

#[derive(Default, Clone, Copy)]
struct Counts {
    positive: u64,
    negative: u64,
}

/// Aggregates which flags and values were evaluated and with what outcome
/// distribution between two sync exchanges.
///
/// Incremented from evaluation call sites, drained by the sync task; the
/// counters are lock-guarded so concurrent increments are not lost.
#[derive(Default)]
pub struct StatsCollector {
    counters: Mutex<HashMap<String, Counts>>,
}

impl StatsCollector {
    /// Seeds zero-count usage for the declared defaults, so the server learns
    /// which flags and values are consulted even before first organic access.
    pub fn from_defaults<'a>(names: impl Iterator<Item = &'a String>) -> Self {
        Self {
            counters: Mutex::new(
                names
                    .map(|name| (name.clone(), Counts::default()))
                    .collect(),
            ),
        }
    }

    /// Records one observed outcome of a flag or value access.
    pub fn track(&self, name: &str, positive: bool) {
        let mut counters = self.counters.lock().unwrap();
        let counts = counters.entry(name.to_owned()).or_default();
        if positive {
            counts.positive += 1;
        } else {
            counts.negative += 1;
        }
    }

    /// Drains and resets the counters atomically, returning the snapshot to
    /// be sent on the next sync exchange.
    pub fn flush(&self) -> Vec<FlagUsage> {
        let drained = {
            let mut counters = self.counters.lock().unwrap();
            std::mem::take(&mut *counters)
        };
        let interval = Utc::now().timestamp();
        drained
            .into_iter()
            .map(|(name, counts)| FlagUsage {
                name,
                positive_count: counts.positive,
                negative_count: counts.negative,
                interval,
            })
            .collect()
    }
}

#[cfg(test)]
mod stats_tests {
    use super::*;

    #[test]
    fn flush_drains_and_resets() {
        let stats = StatsCollector::default();
        stats.track("TEST", true);
        stats.track("TEST", true);
        stats.track("TEST", false);
        stats.track("LIMIT", false);

        let mut usage = stats.flush();
        usage.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[1].name, "TEST");
        assert_eq!(usage[1].positive_count, 2);
        assert_eq!(usage[1].negative_count, 1);
        assert_eq!(usage[0].name, "LIMIT");
        assert_eq!(usage[0].negative_count, 1);

        assert!(stats.flush().is_empty());
    }

    #[test]
    fn seeded_from_defaults() {
        let names = vec!["TEST".to_owned(), "LIMIT".to_owned()];
        let stats = StatsCollector::from_defaults(names.iter());

        let usage = stats.flush();
        assert_eq!(usage.len(), 2);
        assert!(usage
            .iter()
            .all(|u| u.positive_count == 0 && u.negative_count == 0));

        // Seeding is one-shot, the first flush drains it.
        assert!(stats.flush().is_empty());
    }
}

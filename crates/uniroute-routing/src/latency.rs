//! Rolling per-provider latency history
//!
//! Keeps the most recent round-trip samples for each provider in a bounded
//! FIFO window. In-memory only.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use uniroute_config::DEFAULT_LATENCY_SAMPLES;

/// Latency assumed for a provider with no samples
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

/// Aggregate view over a provider's latency window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    /// Arithmetic mean of the window
    pub average: Duration,
    /// Fastest sample in the window
    pub min: Duration,
    /// Slowest sample in the window
    pub max: Duration,
    /// Number of samples in the window
    pub count: usize,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            average: DEFAULT_LATENCY,
            min: DEFAULT_LATENCY,
            max: DEFAULT_LATENCY,
            count: 0,
        }
    }
}

/// Track recent latency across all providers
#[derive(Debug)]
pub struct LatencyTracker {
    samples: DashMap<String, VecDeque<Duration>>,
    max_samples: usize,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY_SAMPLES)
    }
}

impl LatencyTracker {
    /// Create a tracker keeping `max_samples` per provider (0 means the default of 100)
    pub fn new(max_samples: usize) -> Self {
        let max_samples = if max_samples == 0 {
            DEFAULT_LATENCY_SAMPLES
        } else {
            max_samples
        };

        Self {
            samples: DashMap::new(),
            max_samples,
        }
    }

    /// Window size per provider
    pub const fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Record one round-trip, evicting the oldest samples once over capacity
    pub fn record(&self, provider: &str, latency: Duration) {
        let mut window = self
            .samples
            .entry(provider.to_owned())
            .or_insert_with(|| VecDeque::with_capacity(self.max_samples));

        window.push_back(latency);
        while window.len() > self.max_samples {
            window.pop_front();
        }
    }

    /// Mean latency, or [`DEFAULT_LATENCY`] when nothing was recorded
    pub fn average(&self, provider: &str) -> Duration {
        self.samples
            .get(provider)
            .and_then(|window| mean(&window))
            .unwrap_or(DEFAULT_LATENCY)
    }

    /// Most recent sample, if any
    pub fn recent(&self, provider: &str) -> Option<Duration> {
        self.samples.get(provider).and_then(|window| window.back().copied())
    }

    /// Average, min, max, and count in one pass
    pub fn stats(&self, provider: &str) -> LatencyStats {
        let Some(window) = self.samples.get(provider) else {
            return LatencyStats::default();
        };

        let (Some(min), Some(max), Some(average)) =
            (window.iter().min().copied(), window.iter().max().copied(), mean(&window))
        else {
            return LatencyStats::default();
        };

        LatencyStats {
            average,
            min,
            max,
            count: window.len(),
        }
    }

    /// Providers with at least one recorded sample, sorted by name
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .samples
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Forget every provider's history
    pub fn reset(&self) {
        self.samples.clear();
    }
}

fn mean(window: &VecDeque<Duration>) -> Option<Duration> {
    let count = u32::try_from(window.len()).ok().filter(|n| *n > 0)?;
    let total: Duration = window.iter().sum();
    Some(total / count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn window_keeps_most_recent_samples() {
        let tracker = LatencyTracker::new(3);
        for value in [500, 400, 30, 20, 10] {
            tracker.record("openai", ms(value));
        }

        let stats = tracker.stats("openai");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, ms(10));
        assert_eq!(stats.max, ms(30));
        assert_eq!(stats.average, ms(20));
        assert_eq!(tracker.recent("openai"), Some(ms(10)));
    }

    #[test]
    fn defaults_without_samples() {
        let tracker = LatencyTracker::new(10);

        assert_eq!(tracker.average("anthropic"), DEFAULT_LATENCY);
        assert_eq!(tracker.recent("anthropic"), None);
        assert_eq!(
            tracker.stats("anthropic"),
            LatencyStats {
                average: DEFAULT_LATENCY,
                min: DEFAULT_LATENCY,
                max: DEFAULT_LATENCY,
                count: 0,
            }
        );
    }

    #[test]
    fn zero_capacity_uses_default() {
        assert_eq!(LatencyTracker::new(0).max_samples(), DEFAULT_LATENCY_SAMPLES);
    }

    #[test]
    fn reset_clears_all_providers() {
        let tracker = LatencyTracker::default();
        tracker.record("b", ms(5));
        tracker.record("a", ms(7));
        assert_eq!(tracker.providers(), vec!["a", "b"]);

        tracker.reset();

        assert!(tracker.providers().is_empty());
        assert_eq!(tracker.average("a"), DEFAULT_LATENCY);
    }
}

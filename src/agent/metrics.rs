//! Run metrics: per-run accounting plus cross-agent aggregation.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Snapshot of a run's accumulated metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub api_calls: u64,
    pub tool_calls: u64,
    pub errors: u64,
    pub total_duration_ms: u64,
    pub average_latency_ms: u64,
}

impl Metrics {
    /// Fold several agents' metrics into one. Token and call counts add up;
    /// total duration is the wall-clock max (concurrent work overlaps);
    /// average latency is the api-call-weighted mean.
    pub fn combine(parts: &[Metrics]) -> Metrics {
        let mut out = Metrics::default();
        let mut weighted_latency: u128 = 0;
        for m in parts {
            out.input_tokens += m.input_tokens;
            out.output_tokens += m.output_tokens;
            out.api_calls += m.api_calls;
            out.tool_calls += m.tool_calls;
            out.errors += m.errors;
            out.total_duration_ms = out.total_duration_ms.max(m.total_duration_ms);
            weighted_latency += u128::from(m.average_latency_ms) * u128::from(m.api_calls);
        }
        if out.api_calls > 0 {
            out.average_latency_ms = (weighted_latency / u128::from(out.api_calls)) as u64;
        }
        out
    }
}

/// Accumulator the conversation loop feeds as a run progresses.
#[derive(Debug)]
pub struct MetricsTracker {
    input_tokens: u64,
    output_tokens: u64,
    api_calls: u64,
    tool_calls: u64,
    errors: u64,
    latency_total_ms: u64,
    started: Instant,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            api_calls: 0,
            tool_calls: 0,
            errors: 0,
            latency_total_ms: 0,
            started: Instant::now(),
        }
    }

    /// Record one backend round-trip.
    pub fn record_api_call(&mut self, input_tokens: u64, output_tokens: u64, latency_ms: u64) {
        self.api_calls += 1;
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.latency_total_ms += latency_ms;
    }

    pub fn record_tool_call(&mut self) {
        self.tool_calls += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Current totals. Duration runs from construction or the last reset.
    pub fn snapshot(&self) -> Metrics {
        Metrics {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            api_calls: self.api_calls,
            tool_calls: self.tool_calls,
            errors: self.errors,
            total_duration_ms: self.started.elapsed().as_millis() as u64,
            average_latency_ms: if self.api_calls > 0 {
                self.latency_total_ms / self.api_calls
            } else {
                0
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is unavailable.
pub(crate) fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_accumulates_calls_and_tokens() {
        let mut tracker = MetricsTracker::new();
        tracker.record_api_call(100, 50, 20);
        tracker.record_api_call(200, 100, 40);
        tracker.record_tool_call();
        tracker.record_tool_call();
        tracker.record_tool_call();
        tracker.record_error();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.input_tokens, 300);
        assert_eq!(snapshot.output_tokens, 150);
        assert_eq!(snapshot.api_calls, 2);
        assert_eq!(snapshot.tool_calls, 3);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.average_latency_ms, 30);
    }

    #[test]
    fn empty_tracker_reports_zero_latency() {
        let snapshot = MetricsTracker::new().snapshot();
        assert_eq!(snapshot.api_calls, 0);
        assert_eq!(snapshot.average_latency_ms, 0);
    }

    #[test]
    fn reset_clears_accumulated_state() {
        let mut tracker = MetricsTracker::new();
        tracker.record_api_call(10, 10, 10);
        tracker.reset();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.api_calls, 0);
        assert_eq!(snapshot.input_tokens, 0);
    }

    #[test]
    fn combine_sums_counts_and_maxes_duration() {
        let a = Metrics {
            input_tokens: 100,
            output_tokens: 10,
            api_calls: 2,
            tool_calls: 1,
            errors: 0,
            total_duration_ms: 500,
            average_latency_ms: 100,
        };
        let b = Metrics {
            input_tokens: 50,
            output_tokens: 20,
            api_calls: 1,
            tool_calls: 4,
            errors: 2,
            total_duration_ms: 900,
            average_latency_ms: 400,
        };

        let combined = Metrics::combine(&[a, b]);
        assert_eq!(combined.input_tokens, 150);
        assert_eq!(combined.output_tokens, 30);
        assert_eq!(combined.api_calls, 3);
        assert_eq!(combined.tool_calls, 5);
        assert_eq!(combined.errors, 2);
        // Concurrent runs overlap: the longest one bounds the wall clock.
        assert_eq!(combined.total_duration_ms, 900);
        // (100*2 + 400*1) / 3
        assert_eq!(combined.average_latency_ms, 200);
    }

    #[test]
    fn combine_of_nothing_is_all_zeros() {
        assert_eq!(Metrics::combine(&[]), Metrics::default());
    }

    #[test]
    fn combine_ignores_latency_of_zero_call_parts() {
        let idle = Metrics {
            average_latency_ms: 999,
            ..Metrics::default()
        };
        let active = Metrics {
            api_calls: 2,
            average_latency_ms: 50,
            ..Metrics::default()
        };
        assert_eq!(Metrics::combine(&[idle, active]).average_latency_ms, 50);
    }
}

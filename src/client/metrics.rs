use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionMetric {
    pub start_time: u64, // milliseconds since epoch
    pub latency_ms: u64,
    pub success: bool,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_submissions: usize,
    pub accepted_submissions: usize,
    pub refused_submissions: usize,
    pub refusal_rate: f64,

    // Latency of accepted submissions (milliseconds)
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub latency_avg_ms: f64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub latency_p99_ms: u64,

    // Refusal reasons breakdown (throttled, invalid_score, ...)
    pub failure_reasons: HashMap<String, usize>,
}

#[derive(Debug)]
pub struct ClientMetrics {
    client_name: String,
    start_time: Instant,
    submissions: Vec<SubmissionMetric>,
}

impl ClientMetrics {
    pub fn new(client_name: String) -> Self {
        Self {
            client_name,
            start_time: Instant::now(),
            submissions: Vec::new(),
        }
    }

    pub fn record_submission(
        &mut self,
        latency: Duration,
        success: bool,
        failure_reason: Option<String>,
    ) {
        let start_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        self.submissions.push(SubmissionMetric {
            start_time,
            latency_ms: latency.as_millis() as u64,
            success,
            failure_reason,
        });
    }

    pub fn aggregate(&self) -> AggregatedStats {
        let mut stats = AggregatedStats::default();

        if self.submissions.is_empty() {
            return stats;
        }

        stats.total_submissions = self.submissions.len();
        stats.accepted_submissions = self.submissions.iter().filter(|s| s.success).count();
        stats.refused_submissions = stats.total_submissions - stats.accepted_submissions;
        stats.refusal_rate =
            (stats.refused_submissions as f64 / stats.total_submissions as f64) * 100.0;

        let mut latencies: Vec<u64> = self
            .submissions
            .iter()
            .filter(|s| s.success)
            .map(|s| s.latency_ms)
            .collect();
        latencies.sort_unstable();

        if let (Some(&min), Some(&max)) = (latencies.first(), latencies.last()) {
            stats.latency_min_ms = min;
            stats.latency_max_ms = max;
            stats.latency_avg_ms = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;

            stats.latency_p50_ms = percentile(&latencies, 50.0);
            stats.latency_p95_ms = percentile(&latencies, 95.0);
            stats.latency_p99_ms = percentile(&latencies, 99.0);
        }

        for submission in self.submissions.iter().filter(|s| !s.success) {
            if let Some(reason) = &submission.failure_reason {
                *stats.failure_reasons.entry(reason.clone()).or_insert(0) += 1;
            }
        }

        stats
    }

    pub fn export_to_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let stats = self.aggregate();

        let output = serde_json::json!({
            "client_name": self.client_name,
            "session_duration_secs": self.start_time.elapsed().as_secs(),
            "aggregated_stats": stats,
        });

        let json_string = serde_json::to_string_pretty(&output)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;

        Ok(())
    }
}

/// Nearest-rank percentile: the smallest value with at least `p`% of the
/// samples at or below it.
fn percentile(sorted_data: &[u64], p: f64) -> u64 {
    let Some(last) = sorted_data.len().checked_sub(1) else {
        return 0;
    };

    let rank = (p.clamp(0.0, 100.0) / 100.0 * sorted_data.len() as f64).ceil() as usize;
    sorted_data[rank.saturating_sub(1).min(last)]
}

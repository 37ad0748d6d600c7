use std::time::Duration;

use anyhow::Result;
use serde::{Serialize, Serializer};

use crate::engine::{AnalysisEngine, QueryOutput};

/// One timed execution of a query
#[derive(Debug, Clone, Serialize)]
pub struct TimedRun {
    pub label: String,
    #[serde(rename = "elapsed_seconds", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
    pub rows: usize,
}

impl TimedRun {
    pub fn from_output(label: impl Into<String>, output: &QueryOutput) -> Self {
        Self {
            label: label.into(),
            elapsed: output.elapsed,
            rows: output.row_count(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// The same query timed twice, e.g. before and after caching
#[derive(Debug, Clone, Serialize)]
pub struct TimingComparison {
    pub before: TimedRun,
    pub after: TimedRun,
    /// `before / after`; `None` when the second run took no measurable time
    pub speedup: Option<f64>,
}

impl TimingComparison {
    pub fn new(before: TimedRun, after: TimedRun) -> Self {
        let speedup = if after.elapsed.is_zero() {
            None
        } else {
            Some(before.elapsed_secs() / after.elapsed_secs())
        };
        Self {
            before,
            after,
            speedup,
        }
    }

    pub fn speedup(&self) -> Option<f64> {
        self.speedup
    }
}

/// Run `sql` on `engine` and keep both the timing and the result.
pub async fn time_query(
    engine: &AnalysisEngine,
    label: &str,
    sql: &str,
) -> Result<(TimedRun, QueryOutput)> {
    let output = engine.execute(sql).await?;
    let run = TimedRun::from_output(label, &output);
    tracing::info!(
        target: "queries",
        label,
        elapsed_ms = run.elapsed.as_millis() as u64,
        rows = run.rows,
        "Timed query"
    );
    Ok((run, output))
}

fn as_secs_f64<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(label: &str, millis: u64) -> TimedRun {
        TimedRun {
            label: label.to_string(),
            elapsed: Duration::from_millis(millis),
            rows: 5,
        }
    }

    #[test]
    fn test_speedup() {
        let cmp = TimingComparison::new(run("uncached", 900), run("cached", 300));
        let speedup = cmp.speedup().unwrap();
        assert!((speedup - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_has_no_speedup() {
        let cmp = TimingComparison::new(run("uncached", 900), run("cached", 0));
        assert!(cmp.speedup().is_none());
    }

    #[test]
    fn test_serializes_seconds() {
        let json = serde_json::to_value(run("cached", 1500)).unwrap();
        assert_eq!(json["label"], "cached");
        assert_eq!(json["elapsed_seconds"], 1.5);
        assert_eq!(json["rows"], 5);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Control metric recording when the scraper last ran.
pub const EXEC_TIMESTAMP_METRIC: &str = "scraper_exec_timestamp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(rename = "__name__")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// One line of the VictoriaMetrics JSON import format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "metric")]
    pub labels: Labels,
    pub values: Vec<f64>,
    pub timestamps: Vec<i64>,
}

impl MetricSample {
    pub fn new(labels: Labels, value: f64, at: DateTime<Utc>) -> Self {
        Self {
            labels,
            values: vec![value],
            timestamps: vec![at.timestamp_millis()],
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Samples collected for a single push.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBatch {
    samples: Vec<MetricSample>,
}

impl SampleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pr_metric(&mut self, name: &str, repo: &str, value: f64, at: DateTime<Utc>) {
        self.samples.push(MetricSample::new(
            Labels {
                name: name.to_string(),
                repo: Some(repo.to_string()),
            },
            value,
            at,
        ));
    }

    /// Appends the control sample carrying `at` as both value and
    /// timestamp. Nothing is sent until the batch is pushed.
    pub fn record_exec_timestamp(&mut self, at: DateTime<Utc>) {
        self.samples.push(MetricSample::new(
            Labels {
                name: EXEC_TIMESTAMP_METRIC.to_string(),
                repo: None,
            },
            at.timestamp_millis() as f64,
            at,
        ));
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newline-delimited JSON, one object per sample.
    pub fn to_json_lines(&self) -> Result<Vec<u8>> {
        let mut exported = Vec::new();
        for sample in &self.samples {
            exported.extend(sample.to_json()?);
            exported.push(b'\n');
        }
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_pr_metric_line() {
        let mut batch = SampleBatch::new();
        batch.add_pr_metric("MergeRate", "stmcginnis/gofish", 60.0, at());

        let body = String::from_utf8(batch.to_json_lines().unwrap()).unwrap();
        assert_eq!(
            body,
            "{\"metric\":{\"__name__\":\"MergeRate\",\"repo\":\"stmcginnis/gofish\"},\"values\":[60.0],\"timestamps\":[1700000000123]}\n"
        );
    }

    #[test]
    fn test_exec_timestamp_has_no_repo_label() {
        let mut batch = SampleBatch::new();
        batch.record_exec_timestamp(at());

        let sample = &batch.samples()[0];
        assert_eq!(sample.labels.name, EXEC_TIMESTAMP_METRIC);
        assert_eq!(sample.values, vec![1_700_000_000_123.0]);
        assert_eq!(sample.timestamps, vec![1_700_000_000_123]);

        let json: serde_json::Value = serde_json::from_slice(&sample.to_json().unwrap()).unwrap();
        assert!(json["metric"].get("repo").is_none());
    }

    #[test]
    fn test_lines_are_independent() {
        let mut batch = SampleBatch::new();
        batch.add_pr_metric("MergeRate", "a/b", 50.0, at());
        batch.add_pr_metric("MedianLifeTime", "a/b", 3600.0, at());
        batch.record_exec_timestamp(at());

        let body = batch.to_json_lines().unwrap();
        let lines: Vec<&[u8]> = body.split(|b| *b == b'\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let sample: MetricSample = serde_json::from_slice(line).unwrap();
            assert_eq!(sample.values.len(), 1);
            assert_eq!(sample.timestamps.len(), 1);
        }
    }

    #[test]
    fn test_empty_batch_has_empty_body() {
        let batch = SampleBatch::new();
        assert!(batch.is_empty());
        assert!(batch.to_json_lines().unwrap().is_empty());
    }
}

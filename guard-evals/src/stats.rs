//! Small descriptive statistics helpers for sweep output.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values.
#[must_use]
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let centre = mean(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - centre).powi(2)).collect();
    mean(&squared).sqrt()
}

/// Response frequencies, most common first. Ties keep first-seen order.
#[must_use]
pub fn histogram<S: AsRef<str>>(responses: &[S]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for response in responses {
        let response = response.as_ref();
        if let Some(&slot) = index.get(response) {
            counts[slot].1 += 1;
        } else {
            index.insert(response, counts.len());
            counts.push((response.to_owned(), 1));
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Renders a histogram as `  <response>: <count> (<pct>%)` lines.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_histogram(histogram: &[(String, usize)], total: usize) -> String {
    let mut out = String::new();
    for (response, count) in histogram {
        let percentage = if total == 0 {
            0.0
        } else {
            *count as f64 / total as f64 * 100.0
        };
        let _ = writeln!(out, "  {response}: {count} ({percentage:.1}%)");
    }
    out
}

/// How varied a batch of responses was.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uniqueness {
    /// Number of distinct responses.
    pub unique_count: usize,
    /// Distinct responses as a percentage of all responses.
    pub uniqueness_percentage: f64,
    /// Distinct responses in first-seen order.
    pub unique_responses: Vec<String>,
}

/// Counts distinct responses.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn uniqueness<S: AsRef<str>>(responses: &[S]) -> Uniqueness {
    let unique_responses: Vec<String> = first_seen(responses);
    let unique_count = unique_responses.len();
    let uniqueness_percentage = if responses.is_empty() {
        0.0
    } else {
        unique_count as f64 / responses.len() as f64 * 100.0
    };
    Uniqueness {
        unique_count,
        uniqueness_percentage,
        unique_responses,
    }
}

fn first_seen<S: AsRef<str>>(responses: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for response in responses {
        let response = response.as_ref();
        if !seen.iter().any(|s| s == response) {
            seen.push(response.to_owned());
        }
    }
    seen
}

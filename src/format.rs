use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{ItemResult, WorkItem};

const PREVIEW_CHARS: usize = 80;

// Formatter for console previews and JSONL result records.
pub struct Formatter;

impl Formatter {
    /// First `max_chars` characters of `text`, cut on a char boundary.
    pub fn truncate(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((offset, _)) => &text[..offset],
            None => text
        }
    }

    pub fn to_summary_line(position: usize, result: &ItemResult<String>) -> String {
        match result {
            Ok(summary) => format!("\nSummary of file {}: {}", position + 1, Self::truncate(summary, PREVIEW_CHARS)),
            Err(failure) => format!("\nSummary of file {}: {}", position + 1, failure)
        }
    }

    pub fn to_elapsed(elapsed: Duration) -> String {
        format!("Took {:.3} seconds", elapsed.as_secs_f64())
    }

    pub fn to_jsonl<T: Serialize>(record: &OutputRecord<'_, T>) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        Ok(line)
    }
}

/// One line of a results file.
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a, T: Serialize> {
    pub run_id: Uuid,
    pub created: DateTime<Utc>,
    pub index: usize,
    pub source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl<'a, T: Serialize> OutputRecord<'a, T> {
    pub fn new(run_id: Uuid, created: DateTime<Utc>, item: &'a WorkItem, result: &'a ItemResult<T>) -> Self {
        let (value, error) = match result {
            Ok(value) => (Some(value), None),
            Err(failure) => (None, Some(failure.to_string()))
        };
        OutputRecord {
            run_id,
            created,
            index: item.index,
            source: &item.source,
            value,
            error
        }
    }
}

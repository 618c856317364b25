use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{LineCountMismatch, Segment, VideoContext};

/// Machine-readable output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinedTranscript {
    pub title: String,
    pub description: String,
    /// Segments with refined text and original timing
    pub segments: Vec<RefinedSegment>,
    /// Chunks whose oracle output needed mismatch recovery
    pub mismatches: Vec<LineCountMismatch>,
    /// Metadata about the processing
    pub metadata: RefineMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinedSegment {
    pub text: String,
    pub original_text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub start_time_text: String,
    pub was_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineMetadata {
    pub run_id: String,
    pub refined_at: DateTime<Utc>,
    /// Oracle that produced the corrections
    pub oracle: String,
    pub total_segments: usize,
    pub total_chunks: usize,
    pub segments_changed: usize,
    pub segments_kept_original: usize,
}

impl RefinedTranscript {
    /// Pair refined segments with their originals
    pub fn from_segments(
        context: &VideoContext,
        original: &[Segment],
        refined: &[Segment],
        mismatches: Vec<LineCountMismatch>,
        metadata: RefineMetadata,
    ) -> Self {
        let segments = refined
            .iter()
            .zip(original)
            .map(|(r, o)| RefinedSegment {
                text: r.text.clone(),
                original_text: o.text.clone(),
                start_ms: r.start_ms,
                end_ms: r.end_ms,
                start_time_text: r.start_time_text.clone(),
                was_changed: r.text.trim() != o.text.trim(),
            })
            .collect();

        Self {
            title: context.title.clone(),
            description: context.description.clone(),
            segments,
            mismatches,
            metadata,
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable transcript format: one `[time] text` line per segment
pub struct HumanTranscript<'a> {
    segments: &'a [Segment],
}

impl<'a> HumanTranscript<'a> {
    pub fn new(segments: &'a [Segment]) -> Self {
        Self { segments }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        for segment in self.segments {
            let label = if segment.start_time_text.is_empty() {
                format_timestamp(segment.start_ms)
            } else {
                segment.start_time_text.clone()
            };
            output.push_str(&format!(
                "[{}] {}\n",
                label,
                segment.text.split_whitespace().collect::<Vec<_>>().join(" ")
            ));
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Comparison of a refined sequence against its input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementSummary {
    pub segments_sent: usize,
    pub segments_received: usize,
    /// Segments whose start, end and label all survived
    pub timestamps_preserved: usize,
    pub segments_changed: usize,
    /// Mean change in characters per segment (refined minus original)
    pub avg_length_change: f64,
    pub max_length_change: usize,
}

impl RefinementSummary {
    pub fn compare(original: &[Segment], refined: &[Segment]) -> Self {
        let pairs: Vec<(&Segment, &Segment)> = original.iter().zip(refined).collect();

        let timestamps_preserved = pairs
            .iter()
            .filter(|(o, r)| {
                o.start_ms == r.start_ms
                    && o.end_ms == r.end_ms
                    && o.start_time_text == r.start_time_text
            })
            .count();
        let segments_changed = pairs
            .iter()
            .filter(|(o, r)| o.text.trim() != r.text.trim())
            .count();
        let length_changes: Vec<i64> = pairs
            .iter()
            .map(|(o, r)| r.text.chars().count() as i64 - o.text.chars().count() as i64)
            .collect();

        let avg_length_change = if length_changes.is_empty() {
            0.0
        } else {
            length_changes.iter().sum::<i64>() as f64 / length_changes.len() as f64
        };
        let max_length_change = length_changes
            .iter()
            .map(|d| d.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);

        Self {
            segments_sent: original.len(),
            segments_received: refined.len(),
            timestamps_preserved,
            segments_changed,
            avg_length_change,
            max_length_change,
        }
    }

    /// Whether every input segment came back with its timing intact
    pub fn is_complete(&self) -> bool {
        self.segments_sent == self.segments_received
            && self.timestamps_preserved == self.segments_sent
    }
}

/// Format milliseconds as MM:SS.mmm
pub fn format_timestamp(ms: u64) -> String {
    let seconds = ms / 1000;
    let millis = ms % 1000;
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}

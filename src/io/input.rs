use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::models::{Segment, VideoContext, VideoResponse, validate_segments};

/// Parsed input document: oracle context plus the ordered segments
#[derive(Debug, Clone)]
pub struct TranscriptInput {
    pub context: VideoContext,
    pub segments: Vec<Segment>,
}

/// Parse a video transcript JSON file
pub fn parse_video_file(path: &Path) -> Result<TranscriptInput> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_video_json(&content)
}

/// Parse a video transcript JSON string
pub fn parse_video_json(json: &str) -> Result<TranscriptInput> {
    let response: VideoResponse =
        serde_json::from_str(json).context("Failed to parse transcript JSON")?;
    segments_from_response(&response)
}

fn segments_from_response(response: &VideoResponse) -> Result<TranscriptInput> {
    let segments = response
        .segments()
        .iter()
        .enumerate()
        .map(|(index, seg)| {
            let start_ms = seg.start_ms.as_millis().ok_or_else(|| {
                anyhow!("Segment {}: unparsable startMs {:?}", index, seg.start_ms)
            })?;
            let end_ms = seg.end_ms.as_millis().ok_or_else(|| {
                anyhow!("Segment {}: unparsable endMs {:?}", index, seg.end_ms)
            })?;
            Ok(Segment {
                text: seg.text.clone(),
                start_ms,
                end_ms,
                start_time_text: seg.start_time_text.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    validate_segments(&segments)?;

    Ok(TranscriptInput {
        context: response.context(),
        segments,
    })
}

/// Read back a raw sentinel-joined oracle buffer saved by `refine --raw-output`
pub fn read_raw_buffer(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read raw buffer: {:?}", path))
}

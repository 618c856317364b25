use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::io::{HumanTranscript, RefinedTranscript};
use crate::models::Segment;

/// Result of Stage 3 rendering
#[derive(Debug, Default)]
pub struct Stage3Result {
    pub machine_path: Option<PathBuf>,
    pub human_path: Option<PathBuf>,
    pub raw_path: Option<PathBuf>,
}

/// Where Stage 3 writes each view; `None` skips that view
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputPaths<'a> {
    pub machine: Option<&'a Path>,
    pub human: Option<&'a Path>,
    pub raw: Option<&'a Path>,
}

/// Execute Stage 3: Rendering
///
/// Produces up to three views:
/// 1. Machine transcript: JSON with refined and original text per segment
/// 2. Human transcript: one `[time] text` line per segment
/// 3. Raw buffer: the sentinel-joined oracle output, for later `realign` runs
pub fn execute_stage3(
    transcript: &RefinedTranscript,
    refined: &[Segment],
    raw_buffer: &str,
    paths: OutputPaths<'_>,
) -> Result<Stage3Result> {
    let mut result = Stage3Result::default();

    if let Some(path) = paths.machine {
        info!("Writing machine transcript to {:?}", path);
        transcript.write_json(path)?;
        result.machine_path = Some(path.to_path_buf());
    }

    if let Some(path) = paths.human {
        info!("Writing human transcript to {:?}", path);
        HumanTranscript::new(refined).write_file(path)?;
        result.human_path = Some(path.to_path_buf());
    }

    if let Some(path) = paths.raw {
        info!("Writing raw oracle buffer to {:?}", path);
        std::fs::write(path, raw_buffer)
            .with_context(|| format!("Failed to write raw buffer: {:?}", path))?;
        result.raw_path = Some(path.to_path_buf());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::io::RefineMetadata;
    use crate::models::VideoContext;

    #[test]
    fn test_execute_stage3_writes_requested_views() {
        let segments = vec![Segment::new("hello", 0, 1_000)];
        let transcript = RefinedTranscript::from_segments(
            &VideoContext::new("t", ""),
            &segments,
            &segments,
            vec![],
            RefineMetadata {
                run_id: "r".to_string(),
                refined_at: Utc::now(),
                oracle: "echo".to_string(),
                total_segments: 1,
                total_chunks: 1,
                segments_changed: 0,
                segments_kept_original: 0,
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let machine = dir.path().join("out.json");
        let raw = dir.path().join("raw.txt");

        let result = execute_stage3(
            &transcript,
            &segments,
            "hello\n<<<__CHUNK_END__>>>\n",
            OutputPaths {
                machine: Some(&machine),
                human: None,
                raw: Some(&raw),
            },
        )
        .unwrap();

        assert_eq!(result.machine_path.as_deref(), Some(machine.as_path()));
        assert!(result.human_path.is_none());
        assert!(machine.exists());
        assert_eq!(
            std::fs::read_to_string(&raw).unwrap(),
            "hello\n<<<__CHUNK_END__>>>\n"
        );
    }
}

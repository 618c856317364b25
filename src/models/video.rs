use serde::{Deserialize, Serialize};

/// Root of the video metadata + transcript document produced by the scraper
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transcript: Option<Vec<VideoSegment>>,
    /// Plain-text rendition of the whole transcript, if the scraper supplied one
    #[serde(default)]
    pub transcript_only_text: Option<String>,
}

/// A single caption as delivered by the scraper
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoSegment {
    #[serde(default)]
    pub text: String,
    /// Start timestamp in milliseconds, sometimes sent as a string
    #[serde(rename = "startMs")]
    pub start_ms: Millis,
    /// End timestamp in milliseconds, sometimes sent as a string
    #[serde(rename = "endMs")]
    pub end_ms: Millis,
    /// Display label such as "0:05"
    #[serde(rename = "startTimeText", default)]
    pub start_time_text: String,
}

/// Millisecond value that may arrive as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Millis {
    Number(u64),
    Float(f64),
    Text(String),
}

impl Millis {
    /// Interpret the value as whole milliseconds
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Millis::Number(ms) => Some(*ms),
            Millis::Float(ms) if ms.is_finite() && *ms >= 0.0 => Some(ms.round() as u64),
            Millis::Float(_) => None,
            Millis::Text(text) => {
                let text = text.trim();
                text.parse::<u64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|ms| ms.is_finite() && *ms >= 0.0)
                        .map(|ms| ms.round() as u64)
                })
            }
        }
    }
}

impl VideoResponse {
    /// Captions in delivery order, empty when the scraper found no transcript
    pub fn segments(&self) -> &[VideoSegment] {
        self.transcript.as_deref().unwrap_or(&[])
    }

    pub fn context(&self) -> VideoContext {
        VideoContext {
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
        }
    }
}

/// Free-text context given to the oracle alongside every chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContext {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl VideoContext {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

use std::{fmt, path::PathBuf};

use serde::Serialize;
use url::Url;

/// Location of a fragment or initialization segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentAddress {
    Url(Url),
    /// Manifests loaded from disk without an absolute base resolve to local paths.
    Path(PathBuf),
}

impl fmt::Display for FragmentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url.as_str()),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub address: FragmentAddress,
    /// Seconds. `None` when the manifest does not declare a segment duration.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Classifies a `mimeType`/`contentType` value. Text and other top-level
    /// types yield `None`.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let top_level = mime_type.split('/').next().unwrap_or_default();
        match top_level {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub kind: MediaKind,
    /// `Representation@id`
    pub format_id: String,
    pub manifest_url: String,

    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bitrate_kbps: Option<f64>,
    pub sample_rate: Option<u32>,
    pub frame_rate: Option<u32>,
    pub language: Option<String>,
    pub codecs: String,

    pub initialization: Option<FragmentAddress>,
    pub fragment_base_url: String,
    pub fragments: Vec<Fragment>,
}

impl Track {
    /// Tracks carrying a resolution are treated as video, the rest as audio.
    pub fn has_resolution(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    /// Sum of all declared fragment durations, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.fragments.iter().filter_map(|f| f.duration).sum()
    }
}

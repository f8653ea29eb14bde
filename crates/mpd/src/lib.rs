//! Converts a DASH manifest into HLS style segment playlists.
//!
//! ```text
//! manifest text ─► xml tree ─► Period / AdaptationSet / Representation
//!                                        │
//!              segment descriptor + BaseURL + template expansion
//!                                        │
//!                                        ▼
//!                              Vec<Track> (ranked)
//!                                        │ select (prompt on multiple audio languages)
//!                                        ▼
//!                    video.m3u8 / audio.m3u8 [+ master.m3u8]
//! ```

pub mod dash;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod playlist;
pub mod select;
pub mod track;
pub mod util;
pub mod xml;

use std::path::PathBuf;

pub use error::{MpdError, MpdResult};
pub use manifest::Manifest;
pub use select::{FixedPrompt, Selection, TerminalPrompt, TrackPrompt};
pub use track::{Fragment, FragmentAddress, MediaKind, Track};
pub use util::http::HttpClient;

pub const DEFAULT_CREATED_BY: &str = concat!("iori-mpd ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// URL or local path the manifest was read from. Relative BaseURLs resolve
    /// against its directory.
    pub manifest_url: String,
    /// Overrides the manifest directory as the base for relative BaseURLs.
    pub base_url: Option<String>,
    pub output_dir: PathBuf,
    /// Fail on template identifiers without a value instead of leaving them in place.
    pub strict_templates: bool,
    /// Written to the `#CREATED-BY` tag.
    pub created_by: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            manifest_url: String::new(),
            base_url: None,
            output_dir: PathBuf::from("."),
            strict_templates: false,
            created_by: DEFAULT_CREATED_BY.to_string(),
        }
    }
}

impl ConvertOptions {
    fn extract_options(&self) -> dash::ExtractOptions<'_> {
        dash::ExtractOptions {
            manifest_url: &self.manifest_url,
            base_url: self.base_url.as_deref(),
            strict_templates: self.strict_templates,
        }
    }
}

/// Parses the manifest and returns every audio and video track, best first.
pub fn extract_tracks(manifest_text: &str, options: &ConvertOptions) -> MpdResult<Vec<Track>> {
    let manifest = Manifest::parse(manifest_text)?;
    let mut tracks = dash::extract_tracks(&manifest, &options.extract_options())?;
    select::rank_tracks(&mut tracks);
    Ok(tracks)
}

/// Converts a manifest into playlists under `options.output_dir`.
///
/// Returns the path of the playlist to open: `master.m3u8` when both a video
/// and an audio track were selected, the single track's playlist otherwise.
pub fn convert(
    manifest_text: &str,
    options: &ConvertOptions,
    prompt: &mut dyn TrackPrompt,
) -> MpdResult<PathBuf> {
    let tracks = extract_tracks(manifest_text, options)?;
    let selection = select::select_tracks(&tracks, prompt)?;

    let video = selection.video(&tracks);
    let audio = selection.audio(&tracks);
    if let Some(video) = video {
        log::info!("Selected video: {}", select::describe(video));
    }
    if let Some(audio) = audio {
        log::info!("Selected audio: {}", select::describe(audio));
    }

    playlist::PlaylistWriter::new(&options.output_dir, &options.created_by).emit(video, audio)
}

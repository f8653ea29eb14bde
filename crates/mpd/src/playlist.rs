use std::{
    fmt::{self, Write as _},
    fs,
    path::{Path, PathBuf},
};

use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    track::Track,
};

pub const VIDEO_PLAYLIST: &str = "video.m3u8";
pub const AUDIO_PLAYLIST: &str = "audio.m3u8";
pub const MASTER_PLAYLIST: &str = "master.m3u8";

const AUDIO_GROUP: &str = "default-audio-group";

/// Segment playlist of a single track.
///
/// `#EXT-X-KEY:METHOD=PLZ-KEEP-RAW` tells the downloader to concatenate the
/// fragments as they are instead of decrypting them.
pub struct MediaPlaylist<'a> {
    pub track: &'a Track,
    pub created_by: &'a str,
}

impl fmt::Display for MediaPlaylist<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let track = self.track;

        writeln!(f, "#EXTM3U")?;
        writeln!(f, "#EXT-X-VERSION:3")?;
        writeln!(f, "#EXT-X-PLAYLIST-TYPE:VOD")?;
        writeln!(f, "#CREATED-BY:{}", self.created_by)?;
        if let Some((width, height)) = track.resolution() {
            writeln!(f, "#EXT-VIDEO-WIDTH:{width}")?;
            writeln!(f, "#EXT-VIDEO-HEIGHT:{height}")?;
        }
        writeln!(f, "#EXT-CODEC:{}", track.codecs)?;
        writeln!(f, "#EXT-TBR:{}", track.bitrate_kbps.unwrap_or(-1.))?;
        if let Some(initialization) = &track.initialization {
            writeln!(f, "#EXT-X-MAP:URI=\"{initialization}\"")?;
        }
        writeln!(f, "#EXT-X-KEY:METHOD=PLZ-KEEP-RAW,URI=\"None\"")?;

        for fragment in track.fragments.iter() {
            writeln!(f, "#EXTINF:{:.2}", fragment.duration.unwrap_or(0.))?;
            writeln!(f, "{}", fragment.address)?;
        }

        writeln!(f, "#EXT-X-ENDLIST")
    }
}

/// Master playlist pairing one video variant with one audio rendition.
pub struct MasterPlaylist<'a> {
    pub video: &'a Track,
    pub video_uri: &'a Url,
    pub audio: &'a Track,
    pub audio_uri: &'a Url,
}

impl MasterPlaylist<'_> {
    /// Sum of both tracks' bitrates in bits per second. Unknown bitrates count as zero.
    pub fn bandwidth(&self) -> i64 {
        [self.video, self.audio]
            .iter()
            .filter_map(|t| t.bitrate_kbps)
            .map(|kbps| (kbps * 1000.).round() as i64)
            .sum()
    }

    pub fn codecs(&self) -> String {
        let mut codecs = String::new();
        for track in [self.video, self.audio] {
            if track.codecs.is_empty() {
                continue;
            }
            if !codecs.is_empty() {
                codecs.push(',');
            }
            codecs.push_str(&track.codecs);
        }
        codecs
    }
}

impl fmt::Display for MasterPlaylist<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#EXTM3U")?;
        writeln!(
            f,
            "#EXT-X-MEDIA:TYPE=AUDIO,URI=\"{}\",GROUP-ID=\"{AUDIO_GROUP}\",NAME=\"stream_0\",AUTOSELECT=YES,CHANNELS=\"0\"",
            self.audio_uri
        )?;

        let mut stream_inf = format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},CODECS=\"{}\"",
            self.bandwidth(),
            self.codecs()
        );
        if let Some((width, height)) = self.video.resolution() {
            write!(stream_inf, ",RESOLUTION={width}x{height}")?;
        }
        write!(stream_inf, ",AUDIO=\"{AUDIO_GROUP}\"")?;
        writeln!(f, "{stream_inf}")?;

        writeln!(f, "{}", self.video_uri)
    }
}

fn file_uri(path: &Path) -> MpdResult<Url> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute).map_err(|_| MpdError::InvalidOutputPath(absolute))
}

/// Writes playlists into an output directory.
pub struct PlaylistWriter {
    output_dir: PathBuf,
    created_by: String,
}

impl PlaylistWriter {
    pub fn new(output_dir: impl Into<PathBuf>, created_by: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            created_by: created_by.into(),
        }
    }

    fn write(&self, file_name: &str, content: String) -> MpdResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        fs::write(&path, content)?;
        log::info!("Playlist written to {}", path.display());
        Ok(path)
    }

    pub fn write_media(&self, track: &Track, file_name: &str) -> MpdResult<PathBuf> {
        let playlist = MediaPlaylist {
            track,
            created_by: &self.created_by,
        };
        self.write(file_name, playlist.to_string())
    }

    /// Writes the selected tracks and returns the playlist a player should open:
    /// the master playlist when both kinds are present, otherwise the single
    /// track's playlist.
    pub fn emit(&self, video: Option<&Track>, audio: Option<&Track>) -> MpdResult<PathBuf> {
        match (video, audio) {
            (Some(video), Some(audio)) => {
                let video_path = self.write_media(video, VIDEO_PLAYLIST)?;
                let audio_path = self.write_media(audio, AUDIO_PLAYLIST)?;
                let video_uri = file_uri(&video_path)?;
                let audio_uri = file_uri(&audio_path)?;

                let master = MasterPlaylist {
                    video,
                    video_uri: &video_uri,
                    audio,
                    audio_uri: &audio_uri,
                };
                self.write(MASTER_PLAYLIST, master.to_string())
            }
            (Some(video), None) => self.write_media(video, VIDEO_PLAYLIST),
            (None, Some(audio)) => self.write_media(audio, AUDIO_PLAYLIST),
            (None, None) => Err(MpdError::NoSelectableTrack),
        }
    }
}

use std::{
    collections::HashSet,
    io::{self, BufRead, Write},
};

use crate::{
    error::{MpdError, MpdResult},
    track::Track,
};

/// `(width + height) * 1000 + bitrate`, with `-1` standing in for unknown values.
pub fn rank_key(track: &Track) -> f64 {
    let width = track.width.map_or(-1., f64::from);
    let height = track.height.map_or(-1., f64::from);
    let bitrate = track.bitrate_kbps.unwrap_or(-1.);
    (width + height) * 1000. + bitrate
}

/// Stable sort by [`rank_key`], best first.
pub fn rank_tracks(tracks: &mut [Track]) {
    tracks.sort_by(|a, b| rank_key(b).total_cmp(&rank_key(a)));
}

fn select_best(tracks: &[Track], video: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, track) in tracks.iter().enumerate() {
        if track.has_resolution() != video {
            continue;
        }
        let key = rank_key(track);
        if best.map_or(true, |(_, best_key)| key > best_key) {
            best = Some((index, key));
        }
    }
    best.map(|(index, _)| index)
}

/// Index of the best track carrying a resolution.
pub fn select_best_video(tracks: &[Track]) -> Option<usize> {
    select_best(tracks, true)
}

/// Index of the best track without a resolution.
pub fn select_best_audio(tracks: &[Track]) -> Option<usize> {
    select_best(tracks, false)
}

/// Tracks chosen for emission, as indices into the ranked track list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub video: Option<usize>,
    pub audio: Option<usize>,
}

impl Selection {
    pub fn best(tracks: &[Track]) -> Self {
        Self {
            video: select_best_video(tracks),
            audio: select_best_audio(tracks),
        }
    }

    pub fn video<'a>(&self, tracks: &'a [Track]) -> Option<&'a Track> {
        self.video.and_then(|index| tracks.get(index))
    }

    pub fn audio<'a>(&self, tracks: &'a [Track]) -> Option<&'a Track> {
        self.audio.and_then(|index| tracks.get(index))
    }
}

/// One line of the candidate list, e.g.
/// `Video => [v1] [5000 Kbps] [25 fps] [avc1.640028] [1920x1080]`.
pub fn describe(track: &Track) -> String {
    let mut line = String::new();
    line.push_str(if track.has_resolution() { "Video" } else { "Audio" });
    line.push_str(" => ");
    line.push_str(&format!("[{}] ", track.format_id));
    line.push_str(&format!(
        "[{:>4} Kbps] ",
        track.bitrate_kbps.map_or(-1, |b| b as i64)
    ));
    if let Some(sample_rate) = track.sample_rate {
        line.push_str(&format!("[{sample_rate} Hz] "));
    }
    if let Some(frame_rate) = track.frame_rate {
        line.push_str(&format!("[{frame_rate} fps] "));
    }
    if let Some(language) = track.language.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!("[{language}] "));
    }
    line.push_str(&format!("[{}] ", track.codecs));
    if let Some((width, height)) = track.resolution() {
        line.push_str(&format!("[{width}x{height}]"));
    }
    line.trim_end().to_string()
}

/// Parses a space separated list of track indices.
///
/// For each kind the last index wins. A kind without any chosen index is not selected.
pub fn parse_selection(input: &str, tracks: &[Track]) -> MpdResult<Selection> {
    let mut selection = Selection::default();
    for token in input.split_whitespace() {
        let index: usize = token
            .parse()
            .map_err(|_| MpdError::InvalidSelection(format!("{token:?} is not a track index")))?;
        let track = tracks.get(index).ok_or_else(|| {
            MpdError::InvalidSelection(format!(
                "{index} is out of range, expected 0 to {}",
                tracks.len().saturating_sub(1)
            ))
        })?;
        if track.has_resolution() {
            selection.video = Some(index);
        } else {
            selection.audio = Some(index);
        }
    }
    Ok(selection)
}

/// Asks the user which tracks to keep when the automatic choice is ambiguous.
pub trait TrackPrompt {
    /// Presents `candidates` and returns the raw answer, or `None` once input is closed.
    fn ask(&mut self, candidates: &[String]) -> MpdResult<Option<String>>;

    /// Called with an answer that could not be used. Returning `Ok` asks again.
    fn reject(&mut self, error: MpdError) -> MpdResult<()>;
}

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TrackPrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, candidates: &[String]) -> MpdResult<Option<String>> {
        for (index, candidate) in candidates.iter().enumerate() {
            writeln!(self.output, "[{index:>2}]. {candidate}")?;
        }
        writeln!(self.output, "Found multiple audio languages.")?;
        write!(
            self.output,
            "Select up to 1 video and 1 audio track (numbers separated by spaces): "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn reject(&mut self, error: MpdError) -> MpdResult<()> {
        writeln!(self.output, "{error}")?;
        Ok(())
    }
}

/// Answers with a pre-supplied selection, for non-interactive runs.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt {
    answer: Option<String>,
}

impl FixedPrompt {
    pub fn new(answer: Option<String>) -> Self {
        Self { answer }
    }
}

impl TrackPrompt for FixedPrompt {
    fn ask(&mut self, _candidates: &[String]) -> MpdResult<Option<String>> {
        Ok(self.answer.take())
    }

    fn reject(&mut self, error: MpdError) -> MpdResult<()> {
        Err(error)
    }
}

fn audio_language_count(tracks: &[Track]) -> usize {
    tracks
        .iter()
        .filter(|t| !t.has_resolution())
        .map(|t| t.language.as_deref().unwrap_or_default())
        .collect::<HashSet<_>>()
        .len()
}

/// Chooses the tracks to emit from a list already ordered by [`rank_tracks`].
///
/// The best video and audio tracks are picked automatically. The prompt is only
/// consulted when the audio tracks span more than one language.
pub fn select_tracks(tracks: &[Track], prompt: &mut dyn TrackPrompt) -> MpdResult<Selection> {
    let best = Selection::best(tracks);
    if audio_language_count(tracks) <= 1 {
        return Ok(best);
    }

    let candidates: Vec<String> = tracks.iter().map(describe).collect();
    loop {
        let answer = match prompt.ask(&candidates)? {
            None => {
                log::debug!("Selection input closed, keeping the best tracks");
                return Ok(best);
            }
            Some(answer) if answer.trim().is_empty() => return Ok(best),
            Some(answer) => answer,
        };

        match parse_selection(&answer, tracks) {
            Ok(selection) => return Ok(selection),
            Err(e) => prompt.reject(e)?,
        }
    }
}

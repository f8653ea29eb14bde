//! # MPEG-DASH Track Extraction
//!
//! Every audio and video `Representation` of every `Period` becomes one
//! [`Track`] with a flat, playback-ordered list of fragments.
//!
//! For each Representation the segment addressing attributes are merged down
//! the `Period -> AdaptationSet -> Representation` chain (see [`segment`]),
//! the BaseURL is collected bottom-up (see [`url`]), and one of the
//! addressing schemes is enumerated (see [`fragment`]):
//!
//! *   `SegmentList` with or without a `SegmentTimeline`.
//! *   `SegmentTemplate` with a `SegmentTimeline`, binding `$Time$` and `$Number$`.
//! *   `SegmentTemplate` with `@duration`, counting segments over the period.
//! *   A bare BaseURL pointing at the whole media file.
//!
//! Text tracks and other content types are skipped.

pub mod attribute;
pub mod fragment;
pub mod segment;
pub mod template;
pub mod url;

use crate::{
    error::MpdResult,
    manifest::{Manifest, Representation},
    track::{MediaKind, Track},
};
use fragment::{Addressing, FragmentContext, FragmentEnumerator};
use segment::SegmentDescriptor;

/// Where the manifest came from and how strictly templates are expanded.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions<'a> {
    /// URL or path the manifest was loaded from.
    pub manifest_url: &'a str,
    /// Replaces the manifest directory as the base of relative BaseURLs.
    pub base_url: Option<&'a str>,
    pub strict_templates: bool,
}

fn media_kind(representation: &Representation<'_>) -> Option<MediaKind> {
    attribute::resolve_opt(representation, "mimeType")
        .and_then(MediaKind::from_mime_type)
        .or_else(|| {
            attribute::resolve_opt(representation, "contentType").and_then(MediaKind::from_mime_type)
        })
}

fn extract_track(
    representation: &Representation<'_>,
    kind: MediaKind,
    descriptor: &SegmentDescriptor,
    options: &ExtractOptions<'_>,
) -> MpdResult<Track> {
    let format_id = attribute::resolve(representation, "id");
    let bandwidth: Option<u64> =
        attribute::resolve_opt(representation, "bandwidth").and_then(|b| b.trim().parse().ok());

    let collected = url::collect_base_url(representation);
    let base_url = url::resolve_against(options.manifest_url, &collected, options.base_url);

    let context = FragmentContext {
        representation_id: format_id,
        bandwidth,
        base_url: &base_url,
        period_duration: representation.period().duration()?,
        presentation_duration: representation.manifest().presentation_duration()?,
        strict_templates: options.strict_templates,
    };
    let addressing = Addressing::select(descriptor, format_id)?;
    let mut enumerator = FragmentEnumerator::new(descriptor, context);
    let initialization = enumerator.initialization()?;
    let fragments = enumerator.enumerate(&addressing)?;

    Ok(Track {
        kind,
        format_id: format_id.to_string(),
        manifest_url: options.manifest_url.to_string(),
        width: attribute::resolve_u32(representation, "width"),
        height: attribute::resolve_u32(representation, "height"),
        bitrate_kbps: bandwidth.map(|b| b as f64 / 1000.),
        sample_rate: attribute::resolve_u32(representation, "audioSamplingRate"),
        frame_rate: attribute::resolve_frame_rate(representation),
        language: attribute::resolve_opt(representation, "lang").map(str::to_string),
        codecs: attribute::resolve(representation, "codecs").to_string(),
        initialization,
        fragment_base_url: base_url,
        fragments,
    })
}

/// Extracts every audio and video track of the manifest, in document order.
pub fn extract_tracks(manifest: &Manifest, options: &ExtractOptions<'_>) -> MpdResult<Vec<Track>> {
    if manifest.is_dynamic() {
        log::warn!("Dynamic manifest detected, converting the current snapshot only");
    }

    let mut tracks = Vec::new();
    for period in manifest.periods() {
        let period_descriptor = segment::extract(period.element, &SegmentDescriptor::default())?;

        for adaptation_set in period.adaptation_sets() {
            let adaptation_set_descriptor =
                segment::extract(adaptation_set.element, &period_descriptor)?;

            for representation in adaptation_set.representations() {
                let Some(kind) = media_kind(&representation) else {
                    log::debug!(
                        "Skipping representation {:?} with content type {:?}",
                        representation.element.attr("id"),
                        attribute::resolve(&representation, "mimeType")
                    );
                    continue;
                };

                let descriptor =
                    segment::extract(representation.element, &adaptation_set_descriptor)?;
                let track = extract_track(&representation, kind, &descriptor, options)?;
                log::debug!(
                    "Extracted {} track {:?} with {} fragments",
                    track.kind.as_str(),
                    track.format_id,
                    track.fragments.len()
                );
                tracks.push(track);
            }
        }
    }

    log::info!("Found {} audio/video tracks", tracks.len());
    Ok(tracks)
}

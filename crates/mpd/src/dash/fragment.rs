use crate::{
    error::{MpdError, MpdResult},
    track::{Fragment, FragmentAddress},
};

use super::{
    segment::{SegmentDescriptor, TimelineEntry},
    template::{Template, TemplateUrl, UnresolvedSlot},
    url::combine_url,
};

/// Upper bound on the segments of one Representation.
const MAX_SEGMENTS: u64 = 1 << 20;

/// `ceil`, except that a value within rounding noise of an integer is that integer.
fn ceil_count(exact: f64) -> u64 {
    let nearest = exact.round();
    if (exact - nearest).abs() <= 1e-6 * nearest.max(1.) {
        nearest as u64
    } else {
        exact.ceil() as u64
    }
}

/// How the segments of one Representation are addressed.
#[derive(Debug, Clone, PartialEq)]
pub enum Addressing<'a> {
    /// `SegmentList` whose durations come from a `SegmentTimeline`.
    ExplicitListWithTimeline {
        urls: &'a [String],
        timeline: &'a [TimelineEntry],
    },
    ExplicitList {
        urls: &'a [String],
    },
    TemplateWithTimeline {
        template: TemplateUrl,
        timeline: &'a [TimelineEntry],
    },
    /// Segment count derived from the period duration.
    TemplateWithCount {
        template: TemplateUrl,
        /// In timescale units.
        segment_duration: f64,
    },
    /// The BaseURL is the whole media file.
    Unsegmented,
}

impl<'a> Addressing<'a> {
    /// Picks the addressing mode, first match wins. An explicit segment list
    /// takes priority over an inherited media template.
    pub fn select(descriptor: &'a SegmentDescriptor, representation_id: &str) -> MpdResult<Self> {
        let timeline = descriptor.timeline.as_deref();

        if let Some(urls) = descriptor.explicit_segment_urls.as_deref() {
            return Ok(match timeline {
                Some(timeline) => Self::ExplicitListWithTimeline { urls, timeline },
                None => Self::ExplicitList { urls },
            });
        }

        if let Some(media) = descriptor.media_template.as_deref() {
            let template = TemplateUrl::parse(media, Template::MEDIA_IDENTIFIERS, representation_id);
            return match (timeline, descriptor.segment_duration) {
                (Some(timeline), _) => Ok(Self::TemplateWithTimeline { template, timeline }),
                (None, Some(segment_duration))
                    if segment_duration > 0. && segment_duration.is_finite() =>
                {
                    Ok(Self::TemplateWithCount {
                        template,
                        segment_duration,
                    })
                }
                (None, Some(segment_duration)) => Err(MpdError::invalid(
                    "SegmentTemplate",
                    "duration",
                    &segment_duration.to_string(),
                )),
                (None, None) => Err(MpdError::MissingAttribute {
                    element: "SegmentTemplate",
                    attribute: "duration",
                }),
            };
        }

        Ok(Self::Unsegmented)
    }
}

/// A timeline segment after repeats were expanded, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimelineSegment {
    time: u64,
    duration: u64,
}

/// Everything about a Representation the enumeration needs besides its descriptor.
#[derive(Debug, Clone)]
pub struct FragmentContext<'a> {
    pub representation_id: &'a str,
    /// `Representation@bandwidth`, bound to `$Bandwidth$`.
    pub bandwidth: Option<u64>,
    /// Absolute base every segment address is resolved against.
    pub base_url: &'a str,
    /// Seconds.
    pub period_duration: Option<f64>,
    /// Seconds.
    pub presentation_duration: Option<f64>,
    /// Unbound template identifiers are errors instead of warnings.
    pub strict_templates: bool,
}

pub struct FragmentEnumerator<'a> {
    context: FragmentContext<'a>,
    descriptor: &'a SegmentDescriptor,
    /// Only the first unresolved slot of a Representation is reported.
    warned_unresolved: bool,
}

impl<'a> FragmentEnumerator<'a> {
    pub fn new(descriptor: &'a SegmentDescriptor, context: FragmentContext<'a>) -> Self {
        Self {
            context,
            descriptor,
            warned_unresolved: false,
        }
    }

    fn bindings(&self) -> Template {
        let mut args = Template::new();
        args.insert_optional(
            Template::BANDWIDTH,
            self.context.bandwidth.map(|b| b.to_string()),
        );
        args
    }

    fn expand(&mut self, template: &TemplateUrl, args: &Template) -> MpdResult<String> {
        match template.resolve(args) {
            Ok(address) => Ok(address),
            Err(UnresolvedSlot {
                identifier,
                partial,
            }) => {
                if self.context.strict_templates {
                    return Err(MpdError::UnresolvedTemplate {
                        representation: self.context.representation_id.to_string(),
                        identifier: identifier.to_string(),
                    });
                }
                if !self.warned_unresolved {
                    log::warn!(
                        "Representation {}: no value for ${identifier}$, leaving it in the address",
                        self.context.representation_id
                    );
                    self.warned_unresolved = true;
                }
                Ok(partial)
            }
        }
    }

    fn number(&self, offset: u64) -> MpdResult<u64> {
        let start_number = self.descriptor.start_number;
        start_number.checked_add(offset).ok_or_else(|| {
            MpdError::invalid("SegmentTemplate", "startNumber", &start_number.to_string())
        })
    }

    fn seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.descriptor.timescale as f64
    }

    /// Number of repeats for `entry` once a negative `@r` is resolved against
    /// the next entry's start or the end of the period.
    fn repeat_count(&self, entry: &TimelineEntry, next: Option<&TimelineEntry>, time: u64) -> u64 {
        if entry.repeat_count >= 0 {
            return entry.repeat_count as u64;
        }
        if entry.duration == 0 {
            return 0;
        }

        let end = match next.filter(|n| n.start_time != 0) {
            Some(next) => Some(next.start_time as f64),
            None => self
                .context
                .period_duration
                .map(|d| d * self.descriptor.timescale as f64),
        };
        match end {
            Some(end) => {
                let remaining = ((end - time as f64) / entry.duration as f64).ceil();
                (remaining.max(1.) as u64).saturating_sub(1)
            }
            None => {
                log::warn!(
                    "Representation {}: open-ended timeline entry without a period duration, emitting it once",
                    self.context.representation_id
                );
                0
            }
        }
    }

    /// Expands run-length repeats. `@t` resynchronizes the running time only
    /// when it is nonzero.
    fn expand_timeline(&self, timeline: &[TimelineEntry]) -> MpdResult<Vec<TimelineSegment>> {
        let mut segments = Vec::new();
        let mut time: u64 = 0;

        for (index, entry) in timeline.iter().enumerate() {
            if entry.start_time != 0 {
                time = entry.start_time;
            }
            let repeat = self.repeat_count(entry, timeline.get(index + 1), time);
            if repeat.saturating_add(1 + segments.len() as u64) > MAX_SEGMENTS {
                return Err(MpdError::invalid(
                    "S",
                    "r",
                    &entry.repeat_count.to_string(),
                ));
            }
            for _ in 0..=repeat {
                segments.push(TimelineSegment {
                    time,
                    duration: entry.duration,
                });
                time = time
                    .checked_add(entry.duration)
                    .ok_or_else(|| MpdError::invalid("S", "d", &entry.duration.to_string()))?;
            }
        }

        Ok(segments)
    }

    fn fragment(&self, reference: &str, duration: Option<f64>) -> MpdResult<Fragment> {
        Ok(Fragment {
            address: combine_url(self.context.base_url, reference)?,
            duration,
        })
    }

    pub fn enumerate(&mut self, addressing: &Addressing<'_>) -> MpdResult<Vec<Fragment>> {
        match addressing {
            Addressing::ExplicitListWithTimeline { urls, timeline } => {
                let segments = self.expand_timeline(timeline)?;
                if segments.len() != urls.len() {
                    return Err(MpdError::SegmentCountMismatch {
                        representation: self.context.representation_id.to_string(),
                        expected: segments.len() as u64,
                        actual: urls.len(),
                    });
                }
                segments
                    .iter()
                    .zip(urls.iter())
                    .map(|(segment, url)| self.fragment(url, Some(self.seconds(segment.duration))))
                    .collect()
            }
            Addressing::ExplicitList { urls } => {
                let duration = self.descriptor.segment_duration_secs();
                urls.iter().map(|url| self.fragment(url, duration)).collect()
            }
            Addressing::TemplateWithTimeline { template, timeline } => {
                let segments = self.expand_timeline(timeline)?;
                let mut args = self.bindings();
                let mut fragments = Vec::with_capacity(segments.len());

                for (index, segment) in segments.into_iter().enumerate() {
                    let number = self.number(index as u64)?;
                    args.insert(Template::TIME, segment.time.to_string())
                        .insert(Template::NUMBER, number.to_string());
                    let reference = self.expand(template, &args)?;
                    fragments.push(self.fragment(&reference, Some(self.seconds(segment.duration)))?);
                }
                Ok(fragments)
            }
            Addressing::TemplateWithCount {
                template,
                segment_duration,
            } => {
                let period_duration =
                    self.context
                        .period_duration
                        .ok_or(MpdError::MissingAttribute {
                            element: "Period",
                            attribute: "duration",
                        })?;
                let timescale = self.descriptor.timescale as f64;
                let total = ceil_count(period_duration * timescale / segment_duration);
                if total > MAX_SEGMENTS {
                    return Err(MpdError::invalid(
                        "SegmentTemplate",
                        "duration",
                        &segment_duration.to_string(),
                    ));
                }
                let duration = segment_duration / timescale;

                let mut args = self.bindings();
                let mut fragments = Vec::new();
                for index in 0..total {
                    let number = self.number(index)?;
                    let time = (index as f64 * segment_duration) as u64;
                    args.insert(Template::NUMBER, number.to_string())
                        .insert(Template::TIME, time.to_string());
                    let reference = self.expand(template, &args)?;
                    fragments.push(self.fragment(&reference, Some(duration))?);
                }
                Ok(fragments)
            }
            Addressing::Unsegmented => Ok(vec![self.fragment(
                "",
                self.context.presentation_duration,
            )?]),
        }
    }

    /// Resolves the initialization segment, if the descriptor names one.
    pub fn initialization(&mut self) -> MpdResult<Option<FragmentAddress>> {
        let Some(initialization) = self.descriptor.initialization.as_deref() else {
            return Ok(None);
        };

        let template = TemplateUrl::parse(
            initialization,
            Template::INITIALIZATION_IDENTIFIERS,
            self.context.representation_id,
        );
        let reference = self.expand(&template, &self.bindings())?;
        combine_url(self.context.base_url, &reference).map(Some)
    }
}

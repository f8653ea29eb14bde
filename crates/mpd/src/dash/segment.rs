use std::str::FromStr;

use crate::{
    error::{MpdError, MpdResult},
    xml::XmlElement,
};

/// One `<S>` element of a `SegmentTimeline`, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// `@t`, zero when absent.
    pub start_time: u64,
    /// `@d`
    pub duration: u64,
    /// `@r`. Negative values repeat until the end of the period.
    pub repeat_count: i64,
}

/// Segment addressing information of a Representation, merged from the
/// Period, AdaptationSet and Representation levels.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    pub start_number: u64,
    pub timescale: u64,
    /// `@duration`, in timescale units.
    pub segment_duration: Option<f64>,
    pub timeline: Option<Vec<TimelineEntry>>,
    pub explicit_segment_urls: Option<Vec<String>>,
    pub media_template: Option<String>,
    pub initialization: Option<String>,
}

impl Default for SegmentDescriptor {
    fn default() -> Self {
        Self {
            start_number: 1,
            timescale: 1,
            segment_duration: None,
            timeline: None,
            explicit_segment_urls: None,
            media_template: None,
            initialization: None,
        }
    }
}

impl SegmentDescriptor {
    /// `@duration` converted to seconds.
    pub fn segment_duration_secs(&self) -> Option<f64> {
        self.segment_duration
            .map(|duration| duration / self.timescale as f64)
    }
}

fn parse_attr<T: FromStr>(
    element: &XmlElement,
    element_name: &'static str,
    attribute: &'static str,
) -> MpdResult<Option<T>> {
    match element.attribute(attribute).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| MpdError::invalid(element_name, attribute, value)),
    }
}

fn parse_timeline(timeline: &XmlElement) -> MpdResult<Vec<TimelineEntry>> {
    timeline
        .children_named("S")
        .map(|s| {
            Ok(TimelineEntry {
                start_time: parse_attr(s, "S", "t")?.unwrap_or(0),
                duration: parse_attr(s, "S", "d")?.ok_or(MpdError::MissingAttribute {
                    element: "S",
                    attribute: "d",
                })?,
                repeat_count: parse_attr(s, "S", "r")?.unwrap_or(0),
            })
        })
        .collect()
}

/// Attributes shared by `SegmentList` and `SegmentTemplate`.
fn merge_common(
    descriptor: &mut SegmentDescriptor,
    segment: &XmlElement,
    element_name: &'static str,
) -> MpdResult<()> {
    if let Some(start_number) = parse_attr(segment, element_name, "startNumber")? {
        descriptor.start_number = start_number;
    }
    if let Some(timescale) = parse_attr::<u64>(segment, element_name, "timescale")? {
        if timescale == 0 {
            return Err(MpdError::invalid(element_name, "timescale", "0"));
        }
        descriptor.timescale = timescale;
    }
    if let Some(duration) = parse_attr(segment, element_name, "duration")? {
        descriptor.segment_duration = Some(duration);
    }
    if let Some(timeline) = segment.child("SegmentTimeline") {
        descriptor.timeline = Some(parse_timeline(timeline)?);
    }
    Ok(())
}

fn initialization_source(segment: &XmlElement) -> Option<String> {
    segment
        .descendant("Initialization")
        .and_then(|init| init.attribute("sourceURL"))
        .filter(|source| !source.is_empty())
        .map(str::to_string)
}

/// Applies the `SegmentList` or `SegmentTemplate` child of `node` on top of
/// `inherited`. Fields the node does not define keep their inherited value.
pub fn extract(node: &XmlElement, inherited: &SegmentDescriptor) -> MpdResult<SegmentDescriptor> {
    let mut descriptor = inherited.clone();

    if let Some(list) = node.child("SegmentList") {
        merge_common(&mut descriptor, list, "SegmentList")?;

        if let Some(initialization) = initialization_source(list) {
            descriptor.initialization = Some(initialization);
        }

        let urls: Vec<String> = list
            .children_named("SegmentURL")
            .map(|url| url.attr("media").to_string())
            .collect();
        if !urls.is_empty() {
            descriptor.explicit_segment_urls = Some(urls);
        }
    } else if let Some(template) = node.child("SegmentTemplate") {
        merge_common(&mut descriptor, template, "SegmentTemplate")?;

        if let Some(media) = template.attribute("media").filter(|m| !m.is_empty()) {
            descriptor.media_template = Some(media.to_string());
        }

        let initialization = template
            .attribute("initialization")
            .filter(|i| !i.is_empty())
            .map(str::to_string)
            .or_else(|| initialization_source(template));
        if let Some(initialization) = initialization {
            descriptor.initialization = Some(initialization);
        }
    }

    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, Representation};

    fn descriptor_of(representation: &Representation<'_>) -> SegmentDescriptor {
        let period = extract(representation.period().element, &SegmentDescriptor::default()).unwrap();
        let adaptation_set = extract(representation.adaptation_set.element, &period).unwrap();
        extract(representation.element, &adaptation_set).unwrap()
    }

    fn first_descriptor(xml: &str) -> SegmentDescriptor {
        let manifest = Manifest::parse(xml).unwrap();
        let period = manifest.periods().next().unwrap();
        let adaptation_set = period.adaptation_sets().next().unwrap();
        let representation = adaptation_set.representations().next().unwrap();
        descriptor_of(&representation)
    }

    #[test]
    fn test_seed() {
        let descriptor = SegmentDescriptor::default();
        assert_eq!(descriptor.start_number, 1);
        assert_eq!(descriptor.timescale, 1);
        assert!(descriptor.media_template.is_none());
    }

    #[test]
    fn test_representation_overrides_inherited() {
        let descriptor = first_descriptor(
            r#"<MPD><Period>
  <SegmentTemplate timescale="1000" startNumber="5" duration="4000" media="p_$Number$.m4s" initialization="p_init.mp4"/>
  <AdaptationSet>
    <SegmentTemplate timescale="90000" media="a_$Number$.m4s"/>
    <Representation id="v1">
      <SegmentTemplate startNumber="10" media="r_$Number$.m4s"/>
    </Representation>
  </AdaptationSet>
</Period></MPD>"#,
        );

        assert_eq!(descriptor.start_number, 10);
        assert_eq!(descriptor.timescale, 90000);
        assert_eq!(descriptor.segment_duration, Some(4000.0));
        assert_eq!(descriptor.media_template.as_deref(), Some("r_$Number$.m4s"));
        assert_eq!(descriptor.initialization.as_deref(), Some("p_init.mp4"));
        assert!(descriptor.timeline.is_none());
    }

    #[test]
    fn test_undefined_field_keeps_inherited() {
        let descriptor = first_descriptor(
            r#"<MPD><Period><AdaptationSet>
  <SegmentTemplate timescale="48000" media="$Time$.m4s" initialization="init.mp4">
    <SegmentTimeline><S t="0" d="96000" r="2"/><S d="48000"/></SegmentTimeline>
  </SegmentTemplate>
  <Representation id="a1"><SegmentTemplate startNumber="3"/></Representation>
</AdaptationSet></Period></MPD>"#,
        );

        assert_eq!(descriptor.start_number, 3);
        assert_eq!(descriptor.timescale, 48000);
        assert_eq!(descriptor.media_template.as_deref(), Some("$Time$.m4s"));
        assert_eq!(descriptor.initialization.as_deref(), Some("init.mp4"));
        assert_eq!(
            descriptor.timeline,
            Some(vec![
                TimelineEntry {
                    start_time: 0,
                    duration: 96000,
                    repeat_count: 2
                },
                TimelineEntry {
                    start_time: 0,
                    duration: 48000,
                    repeat_count: 0
                },
            ])
        );
    }

    #[test]
    fn test_segment_list() {
        let descriptor = first_descriptor(
            r#"<MPD><Period><AdaptationSet><Representation id="v1">
  <SegmentList timescale="10" duration="20">
    <Initialization sourceURL="init.mp4"/>
    <SegmentURL media="one.m4s"/>
    <SegmentURL media="two.m4s"/>
  </SegmentList>
</Representation></AdaptationSet></Period></MPD>"#,
        );

        assert_eq!(descriptor.initialization.as_deref(), Some("init.mp4"));
        assert_eq!(
            descriptor.explicit_segment_urls,
            Some(vec!["one.m4s".to_string(), "two.m4s".to_string()])
        );
        assert_eq!(descriptor.segment_duration_secs(), Some(2.0));
    }

    #[test]
    fn test_template_initialization_element() {
        let descriptor = first_descriptor(
            r#"<MPD><Period><AdaptationSet><Representation id="v1">
  <SegmentTemplate media="$Number$.m4s"><Initialization sourceURL="i.mp4"/></SegmentTemplate>
</Representation></AdaptationSet></Period></MPD>"#,
        );
        assert_eq!(descriptor.initialization.as_deref(), Some("i.mp4"));
    }

    #[test]
    fn test_invalid_attributes() {
        let manifest = Manifest::parse(
            r#"<MPD><Period><AdaptationSet>
  <Representation id="1"><SegmentTemplate timescale="0"/></Representation>
  <Representation id="2"><SegmentTemplate startNumber="one"/></Representation>
  <Representation id="3"><SegmentTemplate><SegmentTimeline><S t="0"/></SegmentTimeline></SegmentTemplate></Representation>
</AdaptationSet></Period></MPD>"#,
        )
        .unwrap();
        let period = manifest.periods().next().unwrap();
        let adaptation_set = period.adaptation_sets().next().unwrap();
        let errors: Vec<_> = adaptation_set
            .representations()
            .map(|r| extract(r.element, &SegmentDescriptor::default()).unwrap_err())
            .collect();

        assert!(matches!(
            errors[0],
            MpdError::InvalidAttribute {
                attribute: "timescale",
                ..
            }
        ));
        assert!(matches!(
            errors[1],
            MpdError::InvalidAttribute {
                attribute: "startNumber",
                ..
            }
        ));
        assert!(matches!(
            errors[2],
            MpdError::MissingAttribute {
                element: "S",
                attribute: "d"
            }
        ));
    }
}

//! Borrowed, typed views over the parsed manifest tree.
//!
//! The views keep a pointer to every ancestor, because both attribute
//! inheritance and BaseURL collection need to climb back up the hierarchy.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::{MpdError, MpdResult},
    xml::{self, XmlDocument, XmlElement},
};

static DURATION_COMPONENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)([A-Z])").unwrap());

pub struct Manifest {
    document: XmlDocument,
}

impl Manifest {
    pub fn parse(text: &str) -> MpdResult<Self> {
        let document = xml::parse(text)?;
        if document.root().name() != "MPD" {
            return Err(MpdError::MissingElement("MPD"));
        }
        Ok(Self { document })
    }

    pub fn root(&self) -> &XmlElement {
        self.document.root()
    }

    /// `MPD@type="dynamic"` marks a live presentation.
    pub fn is_dynamic(&self) -> bool {
        self.root().attr("type") == "dynamic"
    }

    /// `MPD@mediaPresentationDuration` in seconds.
    pub fn presentation_duration(&self) -> MpdResult<Option<f64>> {
        match self.root().attr("mediaPresentationDuration") {
            "" => Ok(None),
            value => parse_duration(value)
                .map(Some)
                .ok_or_else(|| MpdError::invalid("MPD", "mediaPresentationDuration", value)),
        }
    }

    pub fn periods(&self) -> impl Iterator<Item = Period<'_>> {
        self.root()
            .children_named("Period")
            .map(move |element| Period {
                manifest: self,
                element,
            })
    }
}

#[derive(Clone, Copy)]
pub struct Period<'a> {
    pub manifest: &'a Manifest,
    pub element: &'a XmlElement,
}

impl<'a> Period<'a> {
    /// Effective duration of this period in seconds: `Period@duration` or the
    /// whole presentation.
    pub fn duration(&self) -> MpdResult<Option<f64>> {
        match self.element.attr("duration") {
            "" => self.manifest.presentation_duration(),
            value => parse_duration(value)
                .map(Some)
                .ok_or_else(|| MpdError::invalid("Period", "duration", value)),
        }
    }

    pub fn adaptation_sets(&self) -> impl Iterator<Item = AdaptationSet<'a>> + 'a {
        let period = *self;
        self.element
            .children_named("AdaptationSet")
            .map(move |element| AdaptationSet { period, element })
    }
}

#[derive(Clone, Copy)]
pub struct AdaptationSet<'a> {
    pub period: Period<'a>,
    pub element: &'a XmlElement,
}

impl<'a> AdaptationSet<'a> {
    pub fn representations(&self) -> impl Iterator<Item = Representation<'a>> + 'a {
        let adaptation_set = *self;
        self.element
            .children_named("Representation")
            .map(move |element| Representation {
                adaptation_set,
                element,
            })
    }
}

#[derive(Clone, Copy)]
pub struct Representation<'a> {
    pub adaptation_set: AdaptationSet<'a>,
    pub element: &'a XmlElement,
}

impl<'a> Representation<'a> {
    pub fn period(&self) -> Period<'a> {
        self.adaptation_set.period
    }

    pub fn manifest(&self) -> &'a Manifest {
        self.adaptation_set.period.manifest
    }

    /// Elements from the most specific to the least specific level:
    /// Representation, AdaptationSet, Period, MPD.
    pub fn hierarchy(&self) -> [&'a XmlElement; 4] {
        [
            self.element,
            self.adaptation_set.element,
            self.period().element,
            self.manifest().root(),
        ]
    }
}

/// Parses an `xs:duration` value into seconds.
///
/// `iso8601_duration` validates the syntax, but it keeps every component as
/// `f32`, so the seconds are summed again from the text at `f64` precision.
/// Years and months have no fixed length and are rejected.
pub fn parse_duration(value: &str) -> Option<f64> {
    let value = value.trim();
    iso8601_duration::Duration::parse(value).ok()?;

    let body = value.strip_prefix('P')?;
    let (date, time) = body.split_once('T').unwrap_or((body, ""));

    let mut seconds = 0.;
    for (part, is_time) in [(date, false), (time, true)] {
        for caps in DURATION_COMPONENT_REGEX.captures_iter(part) {
            let amount: f64 = caps[1].replace(',', ".").parse().ok()?;
            let unit = match (&caps[2], is_time) {
                ("W", false) => 604800.,
                ("D", false) => 86400.,
                ("H", true) => 3600.,
                ("M", true) => 60.,
                ("S", true) => 1.,
                _ => return None,
            };
            seconds += amount * unit;
        }
    }
    Some(seconds)
}

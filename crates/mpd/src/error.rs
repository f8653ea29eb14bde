use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpdError {
    #[error("Invalid manifest xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid xml attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Missing <{0}> element")]
    MissingElement(&'static str),

    #[error("Missing required attribute {element}@{attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid value {value:?} for {element}@{attribute}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error(
        "Representation {representation:?} declares {expected} segments in its timeline but lists {actual} segment urls"
    )]
    SegmentCountMismatch {
        representation: String,
        expected: u64,
        actual: usize,
    },

    #[error("Template identifier ${identifier}$ of representation {representation:?} has no value")]
    UnresolvedTemplate {
        representation: String,
        identifier: String,
    },

    #[error("Invalid track selection: {0}")]
    InvalidSelection(String),

    #[error("No video or audio track could be selected")]
    NoSelectableTrack,

    #[error("Output path {0:?} can not be referenced by a file url")]
    InvalidOutputPath(std::path::PathBuf),

    #[error("Failed to fetch manifest from {0}")]
    ManifestFetch(url::Url),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
}

impl MpdError {
    pub(crate) fn invalid(element: &'static str, attribute: &'static str, value: &str) -> Self {
        Self::InvalidAttribute {
            element,
            attribute,
            value: value.to_string(),
        }
    }
}

pub type MpdResult<T> = Result<T, MpdError>;

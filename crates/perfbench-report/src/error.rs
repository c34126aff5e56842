//! Error types for report templates
//!
//! Every variant is fatal for the load it occurred in: a template or a
//! persisted report either validates into the typed tree or is rejected.

/// Errors raised while validating raw JSON into a [`crate::Report`]
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The text is not valid JSON
    #[error("invalid report json: {0}")]
    Json(#[from] serde_json::Error),

    /// The report root is not a JSON object
    #[error("report root must be a JSON object")]
    NotAnObject,

    /// `item_type` is not one of the known kinds
    #[error("unknown item_type '{value}' at {location}")]
    UnknownItemType { location: String, value: String },

    /// `state` is not one of the known states
    #[error("unknown state '{value}' at {location}")]
    UnknownState { location: String, value: String },

    /// More than one command marker on a single item
    #[error("item {location} declares more than one command source: {markers:?}")]
    AmbiguousSource {
        location: String,
        markers: Vec<&'static str>,
    },

    /// A field has the wrong JSON shape
    #[error("field '{field}' at {location} must be {expected}")]
    InvalidField {
        location: String,
        field: &'static str,
        expected: &'static str,
    },
}

impl TemplateError {
    /// Create a field shape error
    pub(crate) fn invalid_field(
        location: impl Into<String>,
        field: &'static str,
        expected: &'static str,
    ) -> Self {
        Self::InvalidField {
            location: location.into(),
            field,
            expected,
        }
    }
}

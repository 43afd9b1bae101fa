use serde::Serialize;
use std::borrow::Cow;
use tracing::{event, Level};

/// The JSON body every error response serializes to:
/// `{"error": {"kind": ..., "message": ..., "field": ...}}`.
///
/// Validation failures attach `field` so forms can render the message
/// inline next to the offending input.
#[derive(Debug, Serialize)]
pub struct ErrorResponseData {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    kind: Cow<'static, str>,
    message: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Cow<'static, str>>,
}

impl ErrorResponseData {
    pub fn new(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> ErrorResponseData {
        let ret = ErrorResponseData {
            error: ErrorDetails {
                kind: kind.into(),
                message: message.into(),
                field: None,
            },
        };

        event!(Level::ERROR, kind=%ret.error.kind, message=%ret.error.message);

        ret
    }

    /// Attach the form field a validation message belongs to.
    pub fn with_field(mut self, field: impl Into<Cow<'static, str>>) -> ErrorResponseData {
        self.error.field = Some(field.into());
        self
    }
}

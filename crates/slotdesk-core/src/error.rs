use thiserror::Error;

/// How a failure should be presented to
/// the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Duplicate value (HTTP 409).
    Conflict,
    /// Rejected input (HTTP 400 or a client-side check).
    BadInput,
    NotFound,
    Server,
    Transport,
    Decode,
}

/// Outcome of a backend round trip that did not succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid backend URL {0}")]
    BadUrl(String),
}

impl ApiError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: body.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Transport { .. } | ApiError::BadUrl(_) => ErrorClass::Transport,
            ApiError::Decode { .. } => ErrorClass::Decode,
            ApiError::Status { status, .. } => classify_status(*status),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        409 => ErrorClass::Conflict,
        400 | 422 => ErrorClass::BadInput,
        404 => ErrorClass::NotFound,
        _ => ErrorClass::Server,
    }
}

fn status_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP error! status: {status}")
    } else {
        format!("{status}: {body}")
    }
}

/// Client-side checks that run before any backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field \"{0}\" must be filled in")]
    Required(&'static str),

    #[error("field \"{field}\" cannot be longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("field \"{field}\" is not a valid {expected}: {value}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field) => field,
            ValidationError::TooLong { field, .. } => field,
            ValidationError::Malformed { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task not found: {0}")]
    UnknownTask(String),

    #[error("select tasks to run (set the \"in work\" flag)")]
    NothingSelected,
}

impl PanelError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PanelError::Api(err) => err.class(),
            PanelError::Validation(_) | PanelError::NothingSelected => ErrorClass::BadInput,
            PanelError::UnknownTask(_) => ErrorClass::NotFound,
        }
    }
}

pub type PanelResult<T> = Result<T, PanelError>;

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorClass, PanelError, ValidationError};

    #[test]
    fn conflict_and_bad_input_are_distinguished() {
        assert_eq!(
            ApiError::status(409, "exists").class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            ApiError::status(400, "bad").class(),
            ErrorClass::BadInput
        );
        assert_eq!(
            ApiError::status(500, "boom").class(),
            ErrorClass::Server
        );
    }

    #[test]
    fn status_error_surfaces_raw_body() {
        let err = ApiError::status(400, "{\"detail\":\"no tasks\"}");
        assert_eq!(err.to_string(), "400: {\"detail\":\"no tasks\"}");
        assert_eq!(
            ApiError::status(502, "").to_string(),
            "HTTP error! status: 502"
        );
    }

    #[test]
    fn validation_maps_to_bad_input() {
        let err = PanelError::from(ValidationError::Required("driver"));
        assert_eq!(err.class(), ErrorClass::BadInput);
        assert_eq!(PanelError::NothingSelected.class(), ErrorClass::BadInput);
    }
}

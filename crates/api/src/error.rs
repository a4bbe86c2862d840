use crate::BoxError;
use crate::validate::ValidationError;
use http::{Method, StatusCode};
use micro_format::FormatError;
use thiserror::Error;

/// A handler whose parameters or return values do not follow a supported calling convention.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("handler must take 1 to 3 parameters, found {0}")]
    ParamCount(usize),

    #[error("unsupported parameter layout ({0}), expected [context,] input [, headers]")]
    ParamLayout(String),

    #[error("handler must return 2 to 4 values, found {0}")]
    ReturnCount(usize),

    #[error("first return value must be the output record")]
    OutputNotFirst,

    #[error("second return value must be the status code")]
    StatusExpected,

    #[error("third return value must be the response headers")]
    HeadersExpected,

    #[error("last return value must be the error")]
    ErrorNotLast,

    #[error("input must be a concrete record type, found {0}")]
    UntypedInput(&'static str),

    #[error("output must be a concrete record type, found {0}")]
    UntypedOutput(&'static str),
}

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("invalid HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid handler shape for {method} {path}: {source}")]
    InvalidHandlerShape {
        path: String,
        method: Method,
        #[source]
        source: ShapeError,
    },

    #[error("route {method} {path} is already registered")]
    DuplicateRoute { path: String, method: Method },

    #[error("invalid route {path}: {reason}")]
    InvalidRoute { path: String, reason: String },
}

/// The stage of the request pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decoding,
    Validation,
    Handler,
    OutputValidation,
    Encoding,
}

/// A request-time failure, handed to the endpoint's error handler.
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("decoding failed: {source}")]
    DecodingFailed { source: FormatError },

    #[error("validation failed: {source}")]
    ValidationFailed { source: ValidationError },

    #[error("handler failed: {source}")]
    HandlerFailed { source: BoxError },

    #[error("output validation failed: {source}")]
    OutputValidationFailed { source: ValidationError },

    #[error("encoding failed: {source}")]
    EncodingFailed { source: FormatError },
}

impl EndpointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EndpointError::DecodingFailed { .. } => ErrorKind::Decoding,
            EndpointError::ValidationFailed { .. } => ErrorKind::Validation,
            EndpointError::HandlerFailed { .. } => ErrorKind::Handler,
            EndpointError::OutputValidationFailed { .. } => ErrorKind::OutputValidation,
            EndpointError::EncodingFailed { .. } => ErrorKind::Encoding,
        }
    }

    /// Returns true when the request itself was at fault: undecodable or invalid input, or an
    /// `Accept` header the server cannot satisfy.
    pub fn is_client_error(&self) -> bool {
        match self {
            EndpointError::DecodingFailed { .. } | EndpointError::ValidationFailed { .. } => true,
            EndpointError::EncodingFailed { source } => source.is_client_error(),
            EndpointError::HandlerFailed { .. } | EndpointError::OutputValidationFailed { .. } => false,
        }
    }

    pub fn suggested_status(&self) -> StatusCode {
        match self {
            EndpointError::DecodingFailed { source: FormatError::NoDecoderForType { .. } } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            EndpointError::EncodingFailed { source: FormatError::NoEncoderForTypes { .. } } => StatusCode::NOT_ACCEPTABLE,
            error if error.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field level causes of a failed input or output validation.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            EndpointError::ValidationFailed { source } | EndpointError::OutputValidationFailed { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Rule, Rules};
    use micro_format::MalformedHeader;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EndpointError::DecodingFailed { source: FormatError::no_decoder("application/cats") }, StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (EndpointError::DecodingFailed { source: FormatError::decode("JSON", "eof") }, StatusCode::BAD_REQUEST),
            (EndpointError::ValidationFailed { source: ValidationError::failed("boom") }, StatusCode::BAD_REQUEST),
            (EndpointError::HandlerFailed { source: "boom".into() }, StatusCode::INTERNAL_SERVER_ERROR),
            (
                EndpointError::OutputValidationFailed { source: ValidationError::failed("boom") },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EndpointError::EncodingFailed { source: FormatError::no_encoder(vec!["text/html".into()]) },
                StatusCode::NOT_ACCEPTABLE,
            ),
            (
                EndpointError::EncodingFailed { source: MalformedHeader::new("empty").into() },
                StatusCode::BAD_REQUEST,
            ),
            (EndpointError::EncodingFailed { source: FormatError::FormEncodingUnsupported }, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.suggested_status(), status, "{error}");
        }
    }

    #[test]
    fn test_kind_and_message() {
        let error = EndpointError::DecodingFailed { source: FormatError::no_decoder("application/cats") };
        assert_eq!(error.kind(), ErrorKind::Decoding);
        assert!(error.is_client_error());
        assert_eq!(error.to_string(), "decoding failed: no decoder found matching type: application/cats");
    }

    #[test]
    fn test_validation_causes() {
        let source = Rules::new().field("message", "", &[Rule::Required]).finish().unwrap_err();
        let error = EndpointError::ValidationFailed { source };

        let errors = error.validation_error().and_then(ValidationError::field_errors).unwrap();
        assert!(errors.has("message"));
        assert_eq!(error.to_string(), "validation failed: message: is required");
    }

    #[test]
    fn test_shape_error_message() {
        let error = RegisterError::InvalidHandlerShape { path: "/".into(), method: Method::GET, source: ShapeError::ParamCount(4) };
        assert_eq!(error.to_string(), "invalid handler shape for GET /: handler must take 1 to 3 parameters, found 4");
    }
}

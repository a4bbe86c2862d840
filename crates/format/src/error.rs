use thiserror::Error;

/// A header value that does not follow the expected grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed header: {reason}")]
pub struct MalformedHeader {
    reason: String,
}

impl MalformedHeader {
    pub fn new<S: ToString>(reason: S) -> Self {
        Self { reason: reason.to_string() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid accept header: {source}")]
    MalformedAcceptHeader {
        #[from]
        source: MalformedHeader,
    },

    #[error("no decoder found matching type: {media_type}")]
    NoDecoderForType { media_type: String },

    #[error("no encoder found matching types: {media_types:?}")]
    NoEncoderForTypes { media_types: Vec<String> },

    #[error("FORM encoding not supported")]
    FormEncodingUnsupported,

    #[error("{format} decoding error: {reason}")]
    Decode { format: &'static str, reason: String },

    #[error("{format} encoding error: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error("unable to read payload: {reason}")]
    Payload { reason: String },
}

impl FormatError {
    pub fn no_decoder<S: ToString>(media_type: S) -> Self {
        Self::NoDecoderForType { media_type: media_type.to_string() }
    }

    pub fn no_encoder(media_types: Vec<String>) -> Self {
        Self::NoEncoderForTypes { media_types }
    }

    pub fn decode<S: ToString>(format: &'static str, reason: S) -> Self {
        Self::Decode { format, reason: reason.to_string() }
    }

    pub fn encode<S: ToString>(format: &'static str, reason: S) -> Self {
        Self::Encode { format, reason: reason.to_string() }
    }

    pub fn payload<S: ToString>(reason: S) -> Self {
        Self::Payload { reason: reason.to_string() }
    }

    /// Returns true when the failure was caused by what the client sent rather than by
    /// the server's own configuration or data.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FormatError::MalformedAcceptHeader { .. }
                | FormatError::NoDecoderForType { .. }
                | FormatError::NoEncoderForTypes { .. }
                | FormatError::Decode { .. }
                | FormatError::Payload { .. }
        )
    }
}

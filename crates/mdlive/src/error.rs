use thiserror::Error;

/// A frame that could not be turned into a [`ServerMessage`](crate::protocol::ServerMessage).
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unexpected binary frame ({0} bytes)")]
    BinaryFrame(usize),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("Invalid file type. Please upload a .md or .markdown file.")]
    InvalidExtension,

    #[error("File too large ({size} bytes). Maximum size is {max} bytes.")]
    TooLarge { size: u64, max: u64 },

    #[error("Upload failed: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PresenterError {
    #[error("Please enter a number between 1 and {len}")]
    OutOfRange { requested: usize, len: usize },

    #[error("No slides to navigate")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("diagram syntax error: {0}")]
    Syntax(String),

    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = PresenterError::OutOfRange {
            requested: 9,
            len: 3,
        };
        assert_eq!(err.to_string(), "Please enter a number between 1 and 3");
    }

    #[test]
    fn test_protocol_error_wraps_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TransportError = ProtocolError::from(json_err).into();
        assert!(err.to_string().starts_with("malformed message"));
    }
}

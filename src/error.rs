pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("monster request: won't fetch {span} units from {url}")]
    RequestTooLarge { url: String, span: u64 },

    #[error("request for {url} failed with status: {status} {text}")]
    Status {
        url: String,
        status: u16,
        text: String,
    },

    #[error("request for {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("error from endpoint {url}: {body}")]
    Server { url: String, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short, stable name of the error class, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidRange(_) | Error::RequestTooLarge { .. } => "MalformedRequest",
            Error::Status { .. } | Error::Transport { .. } => "TransportFailure",
            Error::Server { .. } => "ServerError",
            Error::InvalidResponse(_) | Error::Json(_) => "InvalidResponse",
            Error::InvalidInput(_) => "InvalidInput",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = Error::Status {
            url: "http://localhost/features/chr1".to_string(),
            status: 404,
            text: "Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request for http://localhost/features/chr1 failed with status: 404 Not Found"
        );
        assert_eq!(err.kind(), "TransportFailure");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::InvalidRange("x".into()).kind(), "MalformedRequest");
        assert_eq!(
            Error::Server {
                url: "u".into(),
                body: "{}".into()
            }
            .kind(),
            "ServerError"
        );
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Feed fetch error ({feed}): {message}")]
    Fetch { feed: String, message: String },

    #[error("Feed parse error ({feed}): {message}")]
    Parse { feed: String, message: String },

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Spreadsheet access error: {0}")]
    Access(String),

    #[error("Failed to append row for \"{title}\": {message}")]
    Append { title: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Coarse classification of an [`Error`], stable enough for callers to
/// decide whether a run is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Auth,
    Access,
    Append,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fetch { .. } | Error::Parse { .. } => ErrorKind::Fetch,
            Error::Credentials(_) | Error::Auth(_) => ErrorKind::Auth,
            Error::Access(_) => ErrorKind::Access,
            Error::Append { .. } => ErrorKind::Append,
            Error::Config(_) => ErrorKind::Config,
            // Transport-level failures only surface through the spreadsheet
            // client; the fetcher wraps its own into `Fetch`.
            Error::Io(_) | Error::Serialization(_) | Error::Http(_) | Error::External(_) => {
                ErrorKind::Access
            }
        }
    }

    /// Network and remote-state failures may succeed on a later run; bad
    /// credentials and configuration will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Fetch | ErrorKind::Access | ErrorKind::Append
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let fetch = Error::Fetch {
            feed: "GB News".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(fetch.kind(), ErrorKind::Fetch);

        let parse = Error::Parse {
            feed: "GB News".to_string(),
            message: "not xml".to_string(),
        };
        assert_eq!(parse.kind(), ErrorKind::Fetch);

        assert_eq!(Error::Credentials("bad".into()).kind(), ErrorKind::Auth);
        assert_eq!(Error::Auth("denied".into()).kind(), ErrorKind::Auth);
        assert_eq!(Error::Access("not found".into()).kind(), ErrorKind::Access);
        assert_eq!(Error::Config("empty".into()).kind(), ErrorKind::Config);

        let append = Error::Append {
            title: "A".to_string(),
            message: "quota".to_string(),
        };
        assert_eq!(append.kind(), ErrorKind::Append);
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Access("503".into()).is_retryable());
        assert!(!Error::Auth("invalid_grant".into()).is_retryable());
        assert!(!Error::Config("no feeds".into()).is_retryable());
    }

    #[test]
    fn test_append_message_names_title() {
        let err = Error::Append {
            title: "Storm warning issued".to_string(),
            message: "HTTP 429".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to append row for \"Storm warning issued\": HTTP 429"
        );
    }
}

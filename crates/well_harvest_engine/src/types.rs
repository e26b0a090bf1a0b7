use std::fmt;

/// Progress reported while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// One harvest cycle finished.
    CycleCompleted {
        cycle: u32,
        accumulated: usize,
        stall_cycles: u32,
    },
    /// A detail page was fetched and normalized. `index` is the position in
    /// the filtered input.
    DetailFetched {
        index: usize,
        reference: String,
        fields: usize,
    },
    DetailFailed {
        index: usize,
        reference: String,
        cause: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub requested_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
    pub encoding: String,
}

/// A detail page as loaded, decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub html: String,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Undecodable,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Undecodable => write!(f, "undecodable body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

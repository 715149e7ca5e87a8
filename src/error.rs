use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

/// Errors surfaced by the fragmenting transport.
///
/// NB: Malformed, short, stale or otherwise invalid fragments are dropped inside the receiver,
///      so `MalformedHeader` is only ever seen by code calling the header codec directly.
pub enum SplitError {
    /// A packet size leaves no room for payload after the fixed header. Raised at construction
    ///  time, never at send / receive time.
    Configuration(String),
    /// The buffer is shorter than the fixed fragment header
    MalformedHeader { len: usize },
    /// The underlying packet transport failed. For sends, `bytes_written` is the number of
    ///  bytes that went out before the failure - there is no guarantee how many of those
    ///  fragments actually reached the peer.
    Transport { bytes_written: usize, source: anyhow::Error },
    /// A bounded read did not complete within its deadline, and no cancellation was requested
    ReadTimeout(Duration),
    /// The caller's cancellation token was observed between reads
    Cancelled,
    /// The message would need more fragments than the header can express
    MessageTooLarge { len: usize, payload_size: usize },
}

impl SplitError {
    pub fn transport(source: anyhow::Error) -> SplitError {
        SplitError::Transport { bytes_written: 0, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SplitError::Cancelled)
    }
}

impl Display for SplitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SplitError::MalformedHeader { len } => write!(f, "malformed fragment header: {} bytes is shorter than the header", len),
            SplitError::Transport { bytes_written, source } => write!(f, "transport error after {} bytes: {}", bytes_written, source),
            SplitError::ReadTimeout(timeout) => write!(f, "read timed out after {:?}", timeout),
            SplitError::Cancelled => write!(f, "cancelled"),
            SplitError::MessageTooLarge { len, payload_size } => write!(f, "message of {} bytes does not fit into u32::MAX fragments of {} bytes", len, payload_size),
        }
    }
}

impl Debug for SplitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for SplitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SplitError::Transport { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

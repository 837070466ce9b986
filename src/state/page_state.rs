/// Page state definitions for tracking crawl progress
///
/// This module defines all possible states a page target can be in while the
/// coordinator processes it.
use std::fmt;

/// Represents the current state of a page target in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page is queued in the frontier and waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and its links and images were extracted
    Extracted,

    /// Page fetch failed (network error, HTTP status, timeout)
    FetchFailed,

    /// Page is disallowed by robots.txt, either before the fetch or because
    /// it redirected into a disallowed path
    Disallowed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted)
    }

    /// Checks whether moving from this state to `next` is a legal transition
    ///
    /// `Queued -> Fetching -> {Extracted | FetchFailed | Disallowed}` and
    /// `Queued -> Disallowed` (robots.txt is consulted before the fetch starts
    /// and again when a redirect lands elsewhere).
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Queued, Self::Disallowed)
                | (Self::Fetching, Self::Extracted)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetching, Self::Disallowed)
        )
    }

    /// Performs a checked transition
    pub fn transition(self, next: PageState) -> Result<PageState, crate::CrawlerError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(crate::CrawlerError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Stable lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::FetchFailed => "fetch_failed",
            Self::Disallowed => "disallowed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::Extracted,
            Self::FetchFailed,
            Self::Disallowed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of crawling one server.
///
/// `Completed`, `Failed` and `Cancelled` are terminal; transitions out of
/// them are rejected, never applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlStatus {
    #[default]
    Waiting,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStatus::Waiting => "waiting",
            CrawlStatus::InProgress => "in_progress",
            CrawlStatus::Completed => "completed",
            CrawlStatus::Failed => "failed",
            CrawlStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CrawlStatus::Completed | CrawlStatus::Failed | CrawlStatus::Cancelled
        )
    }

    /// Whether `self -> next` is in the lifecycle table.
    pub fn can_transition_to(self, next: CrawlStatus) -> bool {
        use CrawlStatus::*;
        matches!(
            (self, next),
            (Waiting, InProgress)
                | (Waiting, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Cancelled)
        )
    }

    /// Applies `self -> next` if the lifecycle table allows it.
    ///
    /// A rejected attempt leaves the state untouched and reports the
    /// retained state back to the caller.
    pub fn transition_to(&mut self, next: CrawlStatus) -> Transition {
        if self.can_transition_to(next) {
            let from = *self;
            *self = next;
            Transition::Accepted { from, to: next }
        } else {
            Transition::Rejected {
                retained: *self,
                attempted: next,
            }
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an attempted status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Transition {
    Accepted {
        from: CrawlStatus,
        to: CrawlStatus,
    },
    /// Not in the lifecycle table; the entry keeps `retained`.
    Rejected {
        retained: CrawlStatus,
        attempted: CrawlStatus,
    },
}

impl Transition {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Transition::Accepted { .. })
    }
}

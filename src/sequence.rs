//! Which messages a single run fetches
//!
//! A run never fetches more than [`FETCH_LIMIT`] messages, always
//! starting at sequence number 1. There is no pagination.

use std::fmt;

/// Maximum number of messages fetched per run.
pub const FETCH_LIMIT: u32 = 100;

/// The sequence set sent with FETCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    /// Messages `1:n`.
    First(u32),
    /// Every message, `1:*`.
    All,
}

impl FetchRange {
    /// Range for a mailbox reporting `exists` messages, or `None` when
    /// the mailbox is empty and there is nothing to fetch.
    ///
    /// ```
    /// use mailbox_dump::FetchRange;
    ///
    /// assert_eq!(FetchRange::for_mailbox(250), Some(FetchRange::First(100)));
    /// assert_eq!(FetchRange::for_mailbox(7), Some(FetchRange::All));
    /// assert_eq!(FetchRange::for_mailbox(0), None);
    /// ```
    #[must_use]
    pub const fn for_mailbox(exists: u32) -> Option<Self> {
        if exists >= FETCH_LIMIT {
            Some(Self::First(FETCH_LIMIT))
        } else if exists > 0 {
            Some(Self::All)
        } else {
            None
        }
    }

    /// How many messages this range selects in a mailbox of `exists`.
    #[must_use]
    pub const fn len_for(self, exists: u32) -> u32 {
        match self {
            Self::First(n) if n < exists => n,
            Self::First(_) | Self::All => exists,
        }
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First(n) => write!(f, "1:{n}"),
            Self::All => f.write_str("1:*"),
        }
    }
}

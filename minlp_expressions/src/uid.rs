use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique node identity. Never reused, independent of graph position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(u64);

impl Uid {
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

/// Monotonic uid counter.
///
/// A model owns one generator (usually shared as `Arc<UidGenerator>`) and hands it to node
/// constructors explicitly, so two models built the same way in the same process assign the same
/// uids when each starts from a fresh generator.
#[derive(Debug, Default)]
pub struct UidGenerator {
    next: AtomicU64,
}

impl UidGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start issuing at `first` instead of zero.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    #[inline]
    pub fn next_uid(&self) -> Uid {
        let uid = self.next.fetch_add(1, Ordering::Relaxed);
        assert!(uid != u64::MAX, "uid space exhausted");
        Uid(uid)
    }

    /// The uid the next call to [`next_uid`](Self::next_uid) will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

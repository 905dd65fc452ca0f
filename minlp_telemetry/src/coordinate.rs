use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Path of branch choices from the search-tree root to a node. The root is the empty path, and
/// every proper prefix of a coordinate names one of its ancestors.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coordinate(Vec<u32>);

impl Coordinate {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(path: impl Into<Vec<u32>>) -> Self {
        Self(path.into())
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of branching steps below the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }

    /// `None` for the root.
    pub fn parent(&self) -> Option<Coordinate> {
        self.0.split_last().map(|(_, rest)| Self(rest.to_vec()))
    }

    #[must_use]
    pub fn child(&self, branch: u32) -> Coordinate {
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.extend_from_slice(&self.0);
        path.push(branch);
        Self(path)
    }

    /// Strict ancestry: a coordinate is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &Coordinate) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }
}

impl From<Vec<u32>> for Coordinate {
    fn from(path: Vec<u32>) -> Self {
        Self(path)
    }
}

impl From<&[u32]> for Coordinate {
    fn from(path: &[u32]) -> Self {
        Self(path.to_vec())
    }
}

/// Underscore-joined path, e.g. `0_1_0`. The root renders as the empty string.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split('_').map(str::parse).collect::<Result<Vec<u32>, _>>().map(Self)
    }
}

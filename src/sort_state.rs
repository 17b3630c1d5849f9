//! Table sort state persisted by the report in the `INDEX_SORT` and
//! `DATA_SORT` cookies.
//!
//! The cookie holds a nested list literal such as `[[0,0],[2,1]]`: pairs of
//! column index and direction, where direction 0 is ascending.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const INDEX_SORT_COOKIE: &str = "INDEX_SORT";
pub const DATA_SORT_COOKIE: &str = "DATA_SORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(SortDirection::Ascending),
            1 => Some(SortDirection::Descending),
            _ => None,
        }
    }

    fn code(&self) -> u8 {
        match self {
            SortDirection::Ascending => 0,
            SortDirection::Descending => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortList(pub Vec<SortKey>);

impl SortList {
    /// Sort by the first column, ascending.
    pub fn default_for_index() -> Self {
        SortList(vec![SortKey {
            column: 0,
            direction: SortDirection::Ascending,
        }])
    }

    /// Parse a cookie value. Whitespace is ignored; anything that is not a
    /// list of `[column,direction]` pairs yields `None`.
    pub fn parse_cookie(text: &str) -> Option<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let inner = compact.strip_prefix('[')?.strip_suffix(']')?;
        if inner.is_empty() {
            return Some(SortList::default());
        }

        let mut keys = Vec::new();
        let mut rest = inner;
        loop {
            let body = rest.strip_prefix('[')?;
            let close = body.find(']')?;
            let (column, direction) = body[..close].split_once(',')?;
            keys.push(SortKey {
                column: column.parse().ok()?,
                direction: SortDirection::from_code(direction.parse().ok()?)?,
            });

            rest = &body[close + 1..];
            if rest.is_empty() {
                break;
            }
            rest = rest.strip_prefix(',')?;
        }
        Some(SortList(keys))
    }

    /// Canonical cookie text.
    pub fn to_cookie(&self) -> String {
        self.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "[{},{}]", key.column, key.direction.code())?;
        }
        f.write_str("]")
    }
}

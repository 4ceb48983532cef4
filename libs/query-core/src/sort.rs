use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// `"desc"` sorts descending; every other value sorts ascending.
    pub fn from_param(raw: &str) -> Self {
        if raw == "desc" {
            SortDir::Desc
        } else {
            SortDir::Asc
        }
    }

    /// Numeric form used by document stores (`1` / `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "asc"),
            SortDir::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

/// Ordered field → direction mapping. Usually zero or one key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(pub Vec<SortKey>);

impl SortSpec {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn by(field: impl Into<String>, dir: SortDir) -> Self {
        Self(vec![SortKey {
            field: field.into(),
            dir,
        }])
    }

    pub fn then(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.0.push(SortKey {
            field: field.into(),
            dir,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|k| format!("{} {}", k.field, k.dir))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// The "fetch `limit + 1`, then trim" pattern: asking the store for one row
/// past the page detects a following page without a count query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneExtra {
    limit: u64,
}

impl OneExtra {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows to request from the store.
    pub fn fetch_limit(&self) -> u64 {
        self.limit.saturating_add(1)
    }

    /// Drop the over-fetched row, if any. Returns the page and whether more rows exist.
    pub fn trim<T>(&self, mut rows: Vec<T>) -> (Vec<T>, bool) {
        let has_more = rows.len() as u64 > self.limit;
        if has_more {
            rows.truncate(self.limit as usize);
        }
        (rows, has_more)
    }
}

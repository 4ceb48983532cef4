//! Document store seam the strategy runners fetch through.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use listing_query_core::{FilterExpression, Result, SortSpec};
use serde_json::Value as JsonValue;

use crate::pipeline::Stage;
use crate::record::Record;

/// A filtered, sorted window over a collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindQuery {
    pub filter: FilterExpression,
    pub sort: SortSpec,
    pub skip: u64,
    /// `None` returns every remaining row.
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: FilterExpression) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// Each call is one round trip to the backing store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Row: Record + Send;

    async fn find(&self, query: &FindQuery) -> Result<Vec<Self::Row>>;

    async fn count(&self, filter: &FilterExpression) -> Result<u64>;

    /// Page of rows plus the total matching `query.filter`. Stores that can
    /// combine both in one round trip override this; the default makes two.
    async fn find_with_count(&self, query: &FindQuery) -> Result<(Vec<Self::Row>, u64)> {
        let rows = self.find(query).await?;
        let total = self.count(&query.filter).await?;
        Ok((rows, total))
    }

    /// Run an aggregation pipeline, returning raw output documents.
    async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<JsonValue>>;
}

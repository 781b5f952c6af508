//! Storage engine seam: the query operations viewsets need, over JSON rows.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::entity::{EntityDescriptor, Row};
use crate::error::StoreError;
use crate::query::SelectQuery;
use async_trait::async_trait;

/// A table-oriented store. Implementations must be safe to share across request handlers.
///
/// Soft-deleted rows are invisible to every method.
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching the query's predicates; order and window are ignored.
    async fn count(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<u64, StoreError>;

    async fn find(&self, entity: &EntityDescriptor, query: &SelectQuery) -> Result<Vec<Row>, StoreError>;

    async fn find_by_id(&self, entity: &EntityDescriptor, id: i64) -> Result<Option<Row>, StoreError>;

    /// Store a new row and return it with generated fields and defaults filled in.
    async fn insert(&self, entity: &EntityDescriptor, row: Row) -> Result<Row, StoreError>;

    /// Set only the given columns. `None` when no live row has this id.
    async fn update(
        &self,
        entity: &EntityDescriptor,
        id: i64,
        changes: Row,
    ) -> Result<Option<Row>, StoreError>;

    /// Returns whether a live row was deleted.
    async fn delete(&self, entity: &EntityDescriptor, id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

//! Table metadata handed out by the catalog.

use crate::catalog::schema::Schema;
use crate::storage::page::PageId;
use serde::{Deserialize, Serialize};

/// Immutable description of one table: its name, the header page anchoring
/// its data page chain, and its schema. Built once at table creation and
/// shared as `Rc<TableInfo>` for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    name: String,
    header_page_id: PageId,
    schema: Schema,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, header_page_id: PageId, schema: Schema) -> Self {
        Self {
            name: name.into(),
            header_page_id,
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header_page_id(&self) -> PageId {
        self.header_page_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

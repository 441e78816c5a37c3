//! Facade tying the service objects together: page store, buffer pool,
//! table store and catalog, all explicitly owned — no globals.

use crate::access::codec::RecordCodec;
use crate::access::error::AccessResult;
use crate::access::record::{Record, RecordId};
use crate::access::table::TableStore;
use crate::access::value::Value;
use crate::catalog::{Catalog, Schema, TableInfo};
use crate::config::StorageConfig;
use crate::storage::buffer::BufferPool;
use crate::storage::disk::PageStore;
use std::rc::Rc;

const CATALOG_FILE: &str = "catalog.bin";

/// A single-node database instance rooted at one data directory.
///
/// This is the surface the command layer talks to: it hands in parsed,
/// type-checked values and gets records and identifiers back. Filtering
/// scanned records stays with the caller.
pub struct Database {
    store: TableStore,
    catalog: Catalog,
    config: StorageConfig,
}

impl Database {
    /// Open (or create) the database described by `config`.
    pub fn open(config: StorageConfig) -> AccessResult<Self> {
        let page_store = PageStore::open(config.base_dir.clone(), config.file_count)?;
        let pool = BufferPool::new(page_store, config.frame_count);
        let store = TableStore::with_codec(pool, RecordCodec::new(config.pad_char));
        let catalog = Catalog::open(config.base_dir.join(CATALOG_FILE))?;
        Ok(Self {
            store,
            catalog,
            config,
        })
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> AccessResult<Rc<TableInfo>> {
        self.store.create_table(&mut self.catalog, name, schema)
    }

    pub fn table(&self, name: &str) -> AccessResult<Rc<TableInfo>> {
        Ok(self.catalog.get_table_info(name)?)
    }

    /// Insert positional values (schema order) into the named table.
    pub fn insert(&mut self, table_name: &str, values: Vec<Value>) -> AccessResult<RecordId> {
        let table = self.catalog.get_table_info(table_name)?;
        let mut record = Record::from_values(table, values)?;
        self.store.insert(&mut record)
    }

    pub fn scan_all(&mut self, table_name: &str) -> AccessResult<Vec<Record>> {
        let table = self.catalog.get_table_info(table_name)?;
        self.store.scan_all(&table)
    }

    pub fn delete(&mut self, record: &Record) -> AccessResult<()> {
        self.store.delete(record)
    }

    /// Flush every buffered page and save the catalog. Call before dropping
    /// the instance; nothing happens implicitly on drop.
    pub fn close(&mut self) -> AccessResult<()> {
        self.store.flush()?;
        self.catalog.save()?;
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TableStore {
        &mut self.store
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::value::DataType;
    use crate::catalog::Field;
    use anyhow::Result;
    use tempfile::tempdir;

    fn people_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int),
            Field::new("name", DataType::Text(6)),
        ])
    }

    #[test]
    fn test_end_to_end_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let mut db = Database::open(StorageConfig::new(dir.path()))?;

        db.create_table("people", people_schema())?;
        db.insert("people", vec![Value::Int(1), Value::Text("Bob".into())])?;
        db.insert("people", vec![Value::Int(2), Value::Text("Ada".into())])?;

        let records = db.scan_all("people")?;
        assert_eq!(records.len(), 2);

        let bob = records
            .iter()
            .find(|r| r.get("id") == Some(&Value::Int(1)))
            .unwrap();
        assert_eq!(bob.get("name"), Some(&Value::Text("Bob".into())));

        db.delete(bob)?;
        assert_eq!(db.scan_all("people")?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_unknown_table() -> Result<()> {
        let dir = tempdir()?;
        let mut db = Database::open(StorageConfig::new(dir.path()))?;

        assert!(db.scan_all("nope").is_err());
        assert!(db
            .insert("nope", vec![Value::Int(1)])
            .is_err());

        Ok(())
    }

    #[test]
    fn test_close_and_reopen() -> Result<()> {
        let dir = tempdir()?;
        {
            let mut db = Database::open(StorageConfig::new(dir.path()))?;
            db.create_table("people", people_schema())?;
            db.insert("people", vec![Value::Int(7), Value::Text("Cleo".into())])?;
            db.close()?;
        }
        {
            let mut db = Database::open(StorageConfig::new(dir.path()))?;
            let records = db.scan_all("people")?;
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].get("id"), Some(&Value::Int(7)));
            assert_eq!(records[0].get("name"), Some(&Value::Text("Cleo".into())));
        }

        Ok(())
    }

    #[test]
    fn test_rejects_bad_values_before_touching_pages() -> Result<()> {
        let dir = tempdir()?;
        let mut db = Database::open(StorageConfig::new(dir.path()))?;
        db.create_table("people", people_schema())?;

        // Wrong arity and wrong type never reach the storage layer.
        assert!(db.insert("people", vec![Value::Int(1)]).is_err());
        assert!(db
            .insert("people", vec![Value::Int(1), Value::Int(2)])
            .is_err());
        assert_eq!(db.scan_all("people")?.len(), 0);

        Ok(())
    }
}

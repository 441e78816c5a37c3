//! Table registry: name -> [`TableInfo`], persisted as one serialized file
//! that is loaded at startup and saved at shutdown.

pub mod schema;
pub mod table_info;

pub use schema::{Field, Schema};
pub use table_info::TableInfo;

use log::debug;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("unknown table: `{0}`")]
    UnknownTable(String),

    #[error("table `{0}` already exists")]
    TableExists(String),

    #[error("catalog i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// In-memory table registry backed by a single save file.
pub struct Catalog {
    path: PathBuf,
    tables: HashMap<String, Rc<TableInfo>>,
}

impl Catalog {
    /// Open the catalog at `path`, loading the saved registry when the file
    /// exists.
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let mut tables = HashMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let saved: Vec<TableInfo> = bincode::deserialize_from(reader)?;
            debug!("loaded {} tables from {}", saved.len(), path.display());
            for info in saved {
                tables.insert(info.name().to_string(), Rc::new(info));
            }
        }
        Ok(Self { path, tables })
    }

    /// Serialize the registry back to the save file.
    pub fn save(&self) -> CatalogResult<()> {
        let mut saved: Vec<TableInfo> = self.tables.values().map(|t| (**t).clone()).collect();
        saved.sort_by(|a, b| a.name().cmp(b.name()));
        let writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(writer, &saved)?;
        debug!("saved {} tables to {}", saved.len(), self.path.display());
        Ok(())
    }

    /// Drop every registration and delete the save file.
    pub fn reset(&mut self) -> CatalogResult<()> {
        self.tables.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn register_table_info(&mut self, info: TableInfo) -> CatalogResult<Rc<TableInfo>> {
        if self.tables.contains_key(info.name()) {
            return Err(CatalogError::TableExists(info.name().to_string()));
        }
        let info = Rc::new(info);
        self.tables.insert(info.name().to_string(), Rc::clone(&info));
        Ok(info)
    }

    pub fn get_table_info(&self, name: &str) -> CatalogResult<Rc<TableInfo>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Registered table names, unordered.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|name| name.as_str())
    }
}

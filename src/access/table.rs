use crate::access::codec::RecordCodec;
use crate::access::error::{AccessError, AccessResult};
use crate::access::record::{Record, RecordId};
use crate::access::scan::RecordScan;
use crate::catalog::{Catalog, CatalogError, Schema, TableInfo};
use crate::storage::buffer::BufferPool;
use crate::storage::error::StorageError;
use crate::storage::page::{DataPage, HeaderPage, PageId};
use log::debug;
use std::rc::Rc;

/// What happened to one chain page while looking for room.
enum Placement {
    Stored(RecordId),
    Skip { next: Option<PageId>, dirty: bool },
}

/// Ties the buffer pool, the page layouts and the record codec together
/// into per-table insert / scan / delete.
///
/// Every data page of a table hangs off the free-list head in the table's
/// header page; new pages are linked at the tail of that chain.
pub struct TableStore {
    pool: BufferPool,
    codec: RecordCodec,
}

impl TableStore {
    pub fn new(pool: BufferPool) -> Self {
        Self::with_codec(pool, RecordCodec::default())
    }

    pub fn with_codec(pool: BufferPool, codec: RecordCodec) -> Self {
        Self { pool, codec }
    }

    /// Allocate and format a header page, then register the new table.
    pub fn create_table(
        &mut self,
        catalog: &mut Catalog,
        name: &str,
        schema: Schema,
    ) -> AccessResult<Rc<TableInfo>> {
        if catalog.contains_table(name) {
            return Err(CatalogError::TableExists(name.to_string()).into());
        }

        let (header_id, buf) = self.pool.new_page()?;
        {
            let mut bytes = buf.borrow_mut();
            HeaderPage::init(&mut bytes);
        }
        self.pool.release(header_id, true)?;

        debug!("created table `{}` with header page {}", name, header_id);
        let info = TableInfo::new(name, header_id, schema);
        Ok(catalog.register_table_info(info)?)
    }

    /// Place the record on the first chain page with room. The chain tail
    /// gets compacted before the chain is given up on; when nothing fits, a
    /// fresh data page is linked at the tail and the record goes there.
    pub fn insert(&mut self, record: &mut Record) -> AccessResult<RecordId> {
        let table = Rc::clone(record.table());
        let size = record.size();

        let mut current = self.free_list_head(&table)?;
        let mut tail = None;
        while let Some(page_id) = current {
            let buf = self.pool.fetch(page_id)?;
            let placement: AccessResult<Placement> = (|| {
                let mut bytes = buf.borrow_mut();
                let mut page = DataPage::load(&mut bytes);
                if page.has_space(size) {
                    return Ok(Placement::Stored(page.insert(record, &self.codec, page_id)?));
                }
                let next = page.next_page_id();
                if next.is_none() {
                    // Last chance on this chain: reclaim the holes.
                    let reclaimed = page.compact(&table, &self.codec)?;
                    debug!("compacted page {}: {} bytes free", page_id, reclaimed);
                    if page.has_space(size) {
                        return Ok(Placement::Stored(page.insert(
                            record,
                            &self.codec,
                            page_id,
                        )?));
                    }
                    return Ok(Placement::Skip { next: None, dirty: true });
                }
                Ok(Placement::Skip { next, dirty: false })
            })();

            match placement {
                Ok(Placement::Stored(record_id)) => {
                    self.pool.release(page_id, true)?;
                    record.set_record_id(record_id);
                    return Ok(record_id);
                }
                Ok(Placement::Skip { next, dirty }) => {
                    self.pool.release(page_id, dirty)?;
                    tail = Some(page_id);
                    current = next;
                }
                Err(e) => {
                    let _ = self.pool.release(page_id, false);
                    return Err(e);
                }
            }
        }

        self.insert_into_new_page(record, &table, tail)
    }

    /// Grow the chain by one page and insert there. Records that cannot fit
    /// even an empty page are rejected; there is no overflow chaining.
    fn insert_into_new_page(
        &mut self,
        record: &mut Record,
        table: &Rc<TableInfo>,
        tail: Option<PageId>,
    ) -> AccessResult<RecordId> {
        let size = record.size();
        let (new_id, buf) = self.pool.new_page()?;
        let available = {
            let mut bytes = buf.borrow_mut();
            let page = DataPage::init(&mut bytes);
            page.free_space()
        };
        if available < size {
            self.pool.release(new_id, false)?;
            self.pool.free_page(new_id)?;
            return Err(StorageError::OutOfSpace {
                required: size,
                available,
            }
            .into());
        }

        // Link the page at the chain tail before filling it.
        match tail {
            Some(last_id) => {
                let last_buf = self.pool.fetch(last_id)?;
                {
                    let mut bytes = last_buf.borrow_mut();
                    DataPage::load(&mut bytes).set_next_page_id(Some(new_id));
                }
                self.pool.release(last_id, true)?;
            }
            None => {
                let header_buf = self.pool.fetch(table.header_page_id())?;
                {
                    let mut bytes = header_buf.borrow_mut();
                    HeaderPage::load(&mut bytes).set_free_head(Some(new_id));
                }
                self.pool.release(table.header_page_id(), true)?;
            }
        }
        debug!("linked new data page {} for table `{}`", new_id, table.name());

        let stored: AccessResult<RecordId> = {
            let mut bytes = buf.borrow_mut();
            let mut page = DataPage::load(&mut bytes);
            page.insert(record, &self.codec, new_id)
        };
        match stored {
            Ok(record_id) => {
                self.pool.release(new_id, true)?;
                record.set_record_id(record_id);
                Ok(record_id)
            }
            Err(e) => {
                let _ = self.pool.release(new_id, true);
                Err(e)
            }
        }
    }

    /// Lazy scan over every live record of the table, page at a time.
    pub fn scan(&mut self, table: &Rc<TableInfo>) -> AccessResult<RecordScan<'_>> {
        RecordScan::new(&mut self.pool, &self.codec, Rc::clone(table))
    }

    /// Eager variant of [`scan`](Self::scan).
    pub fn scan_all(&mut self, table: &Rc<TableInfo>) -> AccessResult<Vec<Record>> {
        self.scan(table)?.collect()
    }

    /// Clear the record's slot on its data page. The record must have been
    /// persisted (or scanned) so it carries its address.
    pub fn delete(&mut self, record: &Record) -> AccessResult<()> {
        let record_id = record.record_id().ok_or(AccessError::RecordNotPersisted)?;
        let buf = self.pool.fetch(record_id.page_id)?;
        let removed = {
            let mut bytes = buf.borrow_mut();
            DataPage::load(&mut bytes).remove(record_id.slot)
        };
        match removed {
            Ok(()) => {
                self.pool.release(record_id.page_id, true)?;
                Ok(())
            }
            Err(e) => {
                let _ = self.pool.release(record_id.page_id, false);
                Err(e.into())
            }
        }
    }

    /// Flush every frame through to disk; used on shutdown.
    pub fn flush(&mut self) -> AccessResult<()> {
        self.pool.flush_all()?;
        Ok(())
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    fn free_list_head(&mut self, table: &Rc<TableInfo>) -> AccessResult<Option<PageId>> {
        let header_id = table.header_page_id();
        let buf = self.pool.fetch(header_id)?;
        let head = {
            let mut bytes = buf.borrow_mut();
            HeaderPage::load(&mut bytes).free_head()
        };
        self.pool.release(header_id, false)?;
        Ok(head)
    }
}

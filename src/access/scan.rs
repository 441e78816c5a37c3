//! Lazy table scans over the free-list page chain.

use crate::access::codec::RecordCodec;
use crate::access::error::AccessResult;
use crate::access::record::{Record, RecordId};
use crate::catalog::table_info::TableInfo;
use crate::storage::buffer::BufferPool;
use crate::storage::page::{DataPage, HeaderPage, PageId};
use std::collections::VecDeque;
use std::rc::Rc;

/// Iterator over every live record of one table.
///
/// Pages are visited one at a time: a page is pinned, its live slots are
/// decoded into a small buffer, and the pin is released before any record is
/// handed out. The chain must not be mutated while a scan is running.
pub struct RecordScan<'a> {
    pool: &'a mut BufferPool,
    codec: &'a RecordCodec,
    table: Rc<TableInfo>,
    next_page: Option<PageId>,
    buffered: VecDeque<Record>,
}

impl<'a> RecordScan<'a> {
    pub(crate) fn new(
        pool: &'a mut BufferPool,
        codec: &'a RecordCodec,
        table: Rc<TableInfo>,
    ) -> AccessResult<Self> {
        let header_id = table.header_page_id();
        let buf = pool.fetch(header_id)?;
        let head = {
            let mut bytes = buf.borrow_mut();
            HeaderPage::load(&mut bytes).free_head()
        };
        pool.release(header_id, false)?;

        Ok(Self {
            pool,
            codec,
            table,
            next_page: head,
            buffered: VecDeque::new(),
        })
    }

    /// Decode the next chain page into the buffer. Returns false once the
    /// chain is exhausted.
    fn advance_page(&mut self) -> AccessResult<bool> {
        let Some(page_id) = self.next_page else {
            return Ok(false);
        };

        let buf = self.pool.fetch(page_id)?;
        let decoded: AccessResult<()> = (|| {
            let mut bytes = buf.borrow_mut();
            let page = DataPage::load(&mut bytes);
            self.next_page = page.next_page_id();
            for item in page.records(&self.table, self.codec) {
                let (slot, mut record) = item?;
                record.set_record_id(RecordId::new(page_id, slot));
                self.buffered.push_back(record);
            }
            Ok(())
        })();
        let released = self.pool.release(page_id, false);
        decoded?;
        released?;
        Ok(true)
    }
}

impl Iterator for RecordScan<'_> {
    type Item = AccessResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffered.pop_front() {
                return Some(Ok(record));
            }
            match self.advance_page() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => {
                    self.next_page = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

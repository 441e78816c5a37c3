use crate::storage::disk::PAGE_SIZE;
use crate::storage::page::{read_page_id, write_page_id, PageId};

const FREE_HEAD_OFFSET: usize = 0;
const FULL_HEAD_OFFSET: usize = 8;

/// Per-table header page: bytes 0-7 hold the free-list head, bytes 8-15 the
/// full-list head. Both are chain heads of intrusive lists threaded through
/// the data pages' next pointers; this engine keeps every data page on the
/// free list and leaves the full-list head at the sentinel.
pub struct HeaderPage<'a> {
    data: &'a mut [u8; PAGE_SIZE],
}

impl<'a> HeaderPage<'a> {
    /// Initialize a fresh header page with both heads at the sentinel.
    pub fn init(data: &'a mut [u8; PAGE_SIZE]) -> Self {
        let mut page = Self { data };
        page.set_free_head(None);
        page.set_full_head(None);
        page
    }

    /// View an already-initialized header page.
    pub fn load(data: &'a mut [u8; PAGE_SIZE]) -> Self {
        Self { data }
    }

    pub fn free_head(&self) -> Option<PageId> {
        read_page_id(self.data, FREE_HEAD_OFFSET).valid_or_none()
    }

    pub fn set_free_head(&mut self, id: Option<PageId>) {
        write_page_id(self.data, FREE_HEAD_OFFSET, id.unwrap_or(PageId::INVALID));
    }

    pub fn full_head(&self) -> Option<PageId> {
        read_page_id(self.data, FULL_HEAD_OFFSET).valid_or_none()
    }

    pub fn set_full_head(&mut self, id: Option<PageId>) {
        write_page_id(self.data, FULL_HEAD_OFFSET, id.unwrap_or(PageId::INVALID));
    }
}

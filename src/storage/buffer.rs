pub mod lru;
pub mod replacer;

use crate::storage::disk::{PageStore, PAGE_SIZE};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;
use log::debug;
use lru::LruReplacer;
use replacer::{FrameId, Replacer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame's page bytes. The pool hands out clones on
/// `fetch` and the caller gives the pin back with `release`; the buffer must
/// not be touched after its release.
pub type PageBuf = Rc<RefCell<[u8; PAGE_SIZE]>>;

/// One buffer pool slot: a page-sized buffer plus the bookkeeping that keeps
/// it safe to reuse.
struct Frame {
    data: PageBuf,
    page_id: PageId,
    pin_count: u32,
    dirty: bool,
}

impl Frame {
    fn new() -> Self {
        Self {
            data: Rc::new(RefCell::new([0u8; PAGE_SIZE])),
            page_id: PageId::INVALID,
            pin_count: 0,
            dirty: false,
        }
    }

    fn reset(&mut self) {
        self.data.borrow_mut().fill(0);
        self.page_id = PageId::INVALID;
        self.pin_count = 0;
        self.dirty = false;
    }
}

/// Caches a bounded number of pages as pinned frames over a [`PageStore`].
///
/// Frames are created lazily up to `capacity` and reused afterwards through
/// the eviction policy. Every `fetch` must be paired with exactly one
/// `release`; a release that marks the page dirty writes it through to disk
/// immediately.
pub struct BufferPool {
    store: PageStore,
    frames: Vec<Frame>,
    page_table: HashMap<PageId, FrameId>,
    replacer: Box<dyn Replacer>,
    capacity: usize,
}

impl BufferPool {
    pub fn new(store: PageStore, capacity: usize) -> Self {
        Self::with_replacer(store, Box::new(LruReplacer::new()), capacity)
    }

    pub fn with_replacer(store: PageStore, replacer: Box<dyn Replacer>, capacity: usize) -> Self {
        assert!(capacity > 0, "buffer pool needs at least one frame");
        Self {
            store,
            frames: Vec::with_capacity(capacity),
            page_table: HashMap::with_capacity(capacity),
            replacer,
            capacity,
        }
    }

    /// Pin the page and return its buffer, loading it from disk on a miss.
    ///
    /// Fails with `IllegalPinState` when every frame is pinned and nothing
    /// can be evicted; the pool never blocks waiting for a frame.
    pub fn fetch(&mut self, id: PageId) -> StorageResult<PageBuf> {
        if !id.is_valid() {
            return Err(StorageError::InvalidPageId(id));
        }

        if let Some(&frame_id) = self.page_table.get(&id) {
            let frame = &mut self.frames[frame_id];
            frame.pin_count += 1;
            self.replacer.pin(frame_id);
            return Ok(Rc::clone(&frame.data));
        }

        let frame_id = self.acquire_frame()?;
        {
            let frame = &mut self.frames[frame_id];
            if let Err(e) = self.store.read(id, &mut *frame.data.borrow_mut()) {
                // Hand the frame back to the replacer so it is not lost.
                self.replacer.unpin(frame_id);
                return Err(e);
            }
            frame.page_id = id;
            frame.pin_count = 1;
            frame.dirty = false;
        }
        self.page_table.insert(id, frame_id);
        self.replacer.pin(frame_id);
        Ok(Rc::clone(&self.frames[frame_id].data))
    }

    /// Give back one pin on the page. With `dirty` set, the frame is marked
    /// dirty and written through to the store immediately; the flag clears
    /// only once the write succeeds, so a failed write can be retried by a
    /// later flush.
    pub fn release(&mut self, id: PageId, dirty: bool) -> StorageResult<()> {
        let frame_id = *self.page_table.get(&id).ok_or_else(|| {
            StorageError::IllegalPinState(format!("release of page {} that is not buffered", id))
        })?;

        {
            let frame = &mut self.frames[frame_id];
            if frame.pin_count == 0 {
                return Err(StorageError::IllegalPinState(format!(
                    "release of page {} that is not pinned",
                    id
                )));
            }
            frame.pin_count -= 1;
            if dirty {
                frame.dirty = true;
            }
            if frame.pin_count == 0 {
                self.replacer.unpin(frame_id);
            }
        }

        if dirty {
            let data = Rc::clone(&self.frames[frame_id].data);
            self.store.write(id, &data.borrow())?;
            self.frames[frame_id].dirty = false;
        }
        Ok(())
    }

    /// Allocate a fresh page and pin it with a zeroed buffer. No disk read
    /// happens; the frame starts dirty so the page reaches disk even if the
    /// caller never writes a byte.
    pub fn new_page(&mut self) -> StorageResult<(PageId, PageBuf)> {
        let frame_id = self.acquire_frame()?;
        let id = match self.store.allocate() {
            Ok(id) => id,
            Err(e) => {
                self.replacer.unpin(frame_id);
                return Err(e);
            }
        };

        let frame = &mut self.frames[frame_id];
        frame.page_id = id;
        frame.pin_count = 1;
        frame.dirty = true;
        self.page_table.insert(id, frame_id);
        Ok((id, Rc::clone(&self.frames[frame_id].data)))
    }

    /// Drop a resident, unpinned page without writing it back and return its
    /// id to the store's reuse queue.
    pub fn free_page(&mut self, id: PageId) -> StorageResult<()> {
        if let Some(&frame_id) = self.page_table.get(&id) {
            if self.frames[frame_id].pin_count > 0 {
                return Err(StorageError::IllegalPinState(format!(
                    "free of page {} that is still pinned",
                    id
                )));
            }
            self.frames[frame_id].reset();
            self.page_table.remove(&id);
        }
        self.store.deallocate(id)
    }

    /// Write every dirty frame through, then clear the whole pool. All pins
    /// must have been released; a failed write aborts before any state is
    /// cleared so the dirty flags survive for a retry.
    pub fn flush_all(&mut self) -> StorageResult<()> {
        if let Some(frame) = self.frames.iter().find(|f| f.pin_count > 0) {
            return Err(StorageError::IllegalPinState(format!(
                "flush with page {} still pinned",
                frame.page_id
            )));
        }

        let mut flushed = 0;
        for frame_id in 0..self.frames.len() {
            let (id, dirty) = {
                let frame = &self.frames[frame_id];
                (frame.page_id, frame.dirty)
            };
            if id.is_valid() && dirty {
                let data = Rc::clone(&self.frames[frame_id].data);
                self.store.write(id, &data.borrow())?;
                self.frames[frame_id].dirty = false;
                flushed += 1;
            }
        }
        debug!("flushed {} dirty frames", flushed);

        for frame in &mut self.frames {
            frame.reset();
        }
        self.frames.clear();
        self.page_table.clear();
        self.replacer.reset();
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct pages currently held in frames.
    pub fn resident_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn pin_count(&self, id: PageId) -> Option<u32> {
        self.page_table
            .get(&id)
            .map(|&frame_id| self.frames[frame_id].pin_count)
    }

    pub fn is_dirty(&self, id: PageId) -> Option<bool> {
        self.page_table
            .get(&id)
            .map(|&frame_id| self.frames[frame_id].dirty)
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PageStore {
        &mut self.store
    }

    /// Find a frame for a new resident page: grow the pool while under
    /// capacity, otherwise evict the coldest unpinned frame (writing it back
    /// first when dirty).
    fn acquire_frame(&mut self) -> StorageResult<FrameId> {
        if self.frames.len() < self.capacity {
            self.frames.push(Frame::new());
            return Ok(self.frames.len() - 1);
        }

        let frame_id = self.replacer.evict().ok_or_else(|| {
            StorageError::IllegalPinState("no evictable frame in buffer pool".to_string())
        })?;

        let (old_id, dirty) = {
            let frame = &self.frames[frame_id];
            (frame.page_id, frame.dirty)
        };
        if old_id.is_valid() {
            if dirty {
                debug!("evicting dirty page {} from frame {}", old_id, frame_id);
                let data = Rc::clone(&self.frames[frame_id].data);
                let data_ref = data.borrow();
                if let Err(e) = self.store.write(old_id, &data_ref) {
                    self.replacer.unpin(frame_id);
                    return Err(e);
                }
            }
            self.page_table.remove(&old_id);
        }
        self.frames[frame_id].reset();
        Ok(frame_id)
    }
}

use crate::access::codec::RecordCodec;
use crate::access::error::AccessResult;
use crate::access::record::{Record, RecordId};
use crate::catalog::table_info::TableInfo;
use crate::storage::disk::PAGE_SIZE;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{read_page_id, write_page_id, PageId, SlotDirectory};
use std::rc::Rc;

/// Bytes 0-7 of a data page hold its next-in-chain pointer.
pub const DATA_PAGE_HEADER_SIZE: usize = 8;

/// Slotted record page: records grow forward from byte 8, the slot
/// directory grows backward from the page end, and the two regions must
/// never meet.
pub struct DataPage<'a> {
    data: &'a mut [u8; PAGE_SIZE],
    dir: SlotDirectory,
}

impl<'a> DataPage<'a> {
    /// Format a blank page: sentinel next pointer, empty directory.
    pub fn init(data: &'a mut [u8; PAGE_SIZE]) -> Self {
        data.fill(0);
        let mut page = Self {
            data,
            dir: SlotDirectory::new(),
        };
        page.set_next_page_id(None);
        page.dir.save(page.data);
        page
    }

    /// View a page that was formatted before, parsing its directory.
    pub fn load(data: &'a mut [u8; PAGE_SIZE]) -> Self {
        let dir = SlotDirectory::load(data);
        Self { data, dir }
    }

    pub fn next_page_id(&self) -> Option<PageId> {
        read_page_id(self.data, 0).valid_or_none()
    }

    pub fn set_next_page_id(&mut self, id: Option<PageId>) {
        write_page_id(self.data, 0, id.unwrap_or(PageId::INVALID));
    }

    /// Bytes still usable for one more record, already accounting for the
    /// directory entry that record would add.
    pub fn free_space(&self) -> usize {
        let used = self.dir.free_space_offset() as usize + self.dir.directory_size() + 8;
        PAGE_SIZE.saturating_sub(used)
    }

    pub fn has_space(&self, size: usize) -> bool {
        self.free_space() >= size
    }

    /// Encode the record at the free-space offset and register its slot.
    pub fn insert(
        &mut self,
        record: &Record,
        codec: &RecordCodec,
        own_page_id: PageId,
    ) -> AccessResult<RecordId> {
        if !self.has_space(record.size()) {
            return Err(StorageError::OutOfSpace {
                required: record.size(),
                available: self.free_space(),
            }
            .into());
        }

        let start = self.dir.free_space_offset() as usize;
        let end = codec.encode(record, self.data, start)?;
        let slot = self.dir.slot_count() as u16;
        self.dir.set_free_space_offset(end as u32);
        self.dir.push_slot(start as u32, (end - start) as u32);
        self.dir.save(self.data);
        Ok(RecordId::new(own_page_id, slot))
    }

    /// Zero the record's bytes and turn its slot into a hole. The slot is
    /// reclaimed only by [`compact`](Self::compact).
    pub fn remove(&mut self, slot: u16) -> StorageResult<()> {
        let (start, length) = self.dir.slot(slot as usize).ok_or(StorageError::InvalidSlot {
            slot,
            slots: self.dir.slot_count() as u16,
        })?;
        self.data[start as usize..(start + length) as usize].fill(0);
        self.dir.clear_slot(slot as usize);
        self.dir.save(self.data);
        Ok(())
    }

    /// Rewrite every live record contiguously after the page header,
    /// dropping the holes left behind by removals. Records are re-encoded
    /// because their offset tables hold absolute page positions. Returns the
    /// free space afterwards.
    pub fn compact(&mut self, table: &Rc<TableInfo>, codec: &RecordCodec) -> AccessResult<usize> {
        let live: Vec<Record> = self
            .records(table, codec)
            .map(|item| item.map(|(_, record)| record))
            .collect::<AccessResult<_>>()?;

        let next = self.next_page_id();
        let mut fresh = [0u8; PAGE_SIZE];
        let mut pos = DATA_PAGE_HEADER_SIZE;
        let mut slots = Vec::with_capacity(live.len());
        for record in &live {
            let end = codec.encode(record, &mut fresh, pos)?;
            slots.push((pos as u32, (end - pos) as u32));
            pos = end;
        }

        self.data.copy_from_slice(&fresh);
        self.set_next_page_id(next);
        self.dir = SlotDirectory::new();
        self.dir.set_free_space_offset(pos as u32);
        self.dir.replace_slots(slots);
        self.dir.save(self.data);
        Ok(self.free_space())
    }

    /// Forward iteration over the live records, each paired with its slot
    /// index. Holes are skipped; restarting means rebuilding the view.
    pub fn records<'p>(
        &'p self,
        table: &Rc<TableInfo>,
        codec: &'p RecordCodec,
    ) -> RecordIter<'p, 'a> {
        RecordIter {
            page: self,
            table: Rc::clone(table),
            codec,
            next_slot: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.dir.slot_count()
    }

    pub fn live_record_count(&self) -> usize {
        (0..self.dir.slot_count())
            .filter(|&i| !self.dir.is_hole(i))
            .count()
    }

    pub fn directory(&self) -> &SlotDirectory {
        &self.dir
    }
}

pub struct RecordIter<'p, 'a> {
    page: &'p DataPage<'a>,
    table: Rc<TableInfo>,
    codec: &'p RecordCodec,
    next_slot: usize,
}

impl Iterator for RecordIter<'_, '_> {
    type Item = AccessResult<(u16, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_slot < self.page.dir.slot_count() {
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.page.dir.is_hole(slot) {
                continue;
            }
            let (start, _) = self.page.dir.slot(slot)?;
            let decoded = self
                .codec
                .decode(&self.table, self.page.data, start as usize)
                .map(|record| (slot as u16, record));
            return Some(decoded);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::value::{DataType, Value};
    use crate::catalog::schema::{Field, Schema};
    use anyhow::Result;

    fn test_table() -> Rc<TableInfo> {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int),
            Field::new("name", DataType::Text(6)),
        ]);
        Rc::new(TableInfo::new("people", PageId::new(0, 0), schema))
    }

    fn record(table: &Rc<TableInfo>, id: i32, name: &str) -> Record {
        Record::from_values(
            Rc::clone(table),
            vec![Value::Int(id), Value::Text(name.to_string())],
        )
        .unwrap()
    }

    #[test]
    fn test_init_layout() {
        let mut data = [0xAAu8; PAGE_SIZE];
        let page = DataPage::init(&mut data);
        assert_eq!(page.next_page_id(), None);
        assert_eq!(page.slot_count(), 0);
        // Fresh page: header + empty directory + room for one new entry.
        assert_eq!(page.free_space(), PAGE_SIZE - 8 - 8 - 8);
    }

    #[test]
    fn test_insert_and_iterate() -> Result<()> {
        let table = test_table();
        let codec = RecordCodec::default();
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        let own = PageId::new(1, 0);
        let rid1 = page.insert(&record(&table, 1, "Ada"), &codec, own)?;
        let rid2 = page.insert(&record(&table, 2, "Grace"), &codec, own)?;
        assert_eq!(rid1, RecordId::new(own, 0));
        assert_eq!(rid2, RecordId::new(own, 1));

        let decoded: Vec<(u16, Record)> = page
            .records(&table, &codec)
            .collect::<AccessResult<_>>()?;
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, 0);
        assert_eq!(decoded[0].1.get("id"), Some(&Value::Int(1)));
        assert_eq!(decoded[0].1.get("name"), Some(&Value::Text("Ada".into())));
        assert_eq!(decoded[1].1.get("name"), Some(&Value::Text("Grace".into())));

        Ok(())
    }

    #[test]
    fn test_space_accounting_is_exact() -> Result<()> {
        let table = test_table();
        let codec = RecordCodec::default();
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        let rec = record(&table, 7, "Bob");
        // 3 offset-table ints + 4-byte int + 12-byte fixed text.
        assert_eq!(rec.size(), 28);

        let mut inserted = 0;
        while page.has_space(rec.size()) {
            let free_before = page.free_space();
            page.insert(&rec, &codec, PageId::new(0, 1))?;
            // Each insert consumes the record bytes plus one 8-byte slot.
            assert_eq!(page.free_space(), free_before - rec.size() - 8);
            inserted += 1;
        }

        // has_space said no: the next insert must fail, exactly then.
        assert!(page.free_space() < rec.size());
        assert!(matches!(
            page.insert(&rec, &codec, PageId::new(0, 1)),
            Err(crate::access::error::AccessError::Storage(
                StorageError::OutOfSpace { .. }
            ))
        ));
        assert_eq!(inserted, page.slot_count());

        Ok(())
    }

    #[test]
    fn test_remove_leaves_hole() -> Result<()> {
        let table = test_table();
        let codec = RecordCodec::default();
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        let own = PageId::new(0, 1);
        page.insert(&record(&table, 1, "Ada"), &codec, own)?;
        let rid = page.insert(&record(&table, 2, "Grace"), &codec, own)?;
        page.insert(&record(&table, 3, "Edsger"), &codec, own)?;

        let (start, length) = page.directory().slot(rid.slot as usize).unwrap();
        page.remove(rid.slot)?;

        // Slot count and entry count are unchanged; the bytes are zeroed.
        assert_eq!(page.slot_count(), 3);
        assert_eq!(page.live_record_count(), 2);
        assert_eq!(page.directory().entry_count(), 6);
        assert!(data[start as usize..(start + length) as usize]
            .iter()
            .all(|&b| b == 0));

        Ok(())
    }

    #[test]
    fn test_iteration_skips_holes() -> Result<()> {
        let table = test_table();
        let codec = RecordCodec::default();
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        let own = PageId::new(0, 1);
        page.insert(&record(&table, 1, "Ada"), &codec, own)?;
        page.insert(&record(&table, 2, "Grace"), &codec, own)?;
        page.insert(&record(&table, 3, "Edsger"), &codec, own)?;
        page.remove(1)?;

        let ids: Vec<i32> = page
            .records(&table, &codec)
            .map(|item| {
                let (_, record) = item?;
                match record.get("id") {
                    Some(Value::Int(v)) => Ok(*v),
                    other => panic!("unexpected id value: {:?}", other),
                }
            })
            .collect::<AccessResult<_>>()?;
        assert_eq!(ids, vec![1, 3]);

        Ok(())
    }

    #[test]
    fn test_remove_out_of_range_slot() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        assert!(matches!(
            page.remove(0),
            Err(StorageError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn test_compact_reclaims_holes() -> Result<()> {
        let table = test_table();
        let codec = RecordCodec::default();
        let mut data = [0u8; PAGE_SIZE];
        let mut page = DataPage::init(&mut data);

        let own = PageId::new(0, 1);
        let size = record(&table, 0, "x").size();
        page.insert(&record(&table, 1, "Ada"), &codec, own)?;
        page.insert(&record(&table, 2, "Grace"), &codec, own)?;
        page.insert(&record(&table, 3, "Edsger"), &codec, own)?;
        page.set_next_page_id(Some(PageId::new(2, 2)));
        page.remove(0)?;
        page.remove(2)?;

        let free = page.compact(&table, &codec)?;

        // One live record left: occupied bytes are exactly header + record
        // + directory + the reserved next-entry gap.
        assert_eq!(page.slot_count(), 1);
        assert_eq!(page.live_record_count(), 1);
        assert_eq!(free, PAGE_SIZE - 8 - size - (8 + 8) - 8);
        assert_eq!(
            page.directory().slot(0),
            Some((8, size as u32)),
            "surviving record moved to the front"
        );
        // The next pointer survives compaction.
        assert_eq!(page.next_page_id(), Some(PageId::new(2, 2)));

        let decoded: Vec<(u16, Record)> = page
            .records(&table, &codec)
            .collect::<AccessResult<_>>()?;
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].1.get("id"), Some(&Value::Int(2)));

        Ok(())
    }
}

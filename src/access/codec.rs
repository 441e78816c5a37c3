use crate::access::error::{AccessError, AccessResult};
use crate::access::record::Record;
use crate::access::value::{DataType, Value};
use crate::catalog::schema::Schema;
use crate::catalog::table_info::TableInfo;
use crate::storage::error::StorageError;
use bytes::{Buf, BufMut};
use std::collections::HashMap;
use std::rc::Rc;

pub const DEFAULT_PAD_CHAR: char = ' ';

/// Translates typed records to and from page bytes.
///
/// A record with `k` fields is laid out as `k + 1` little-endian u32s —
/// the absolute page offset of each field's start plus the end of the last
/// field — followed by the field payloads in schema order. Because the
/// offset table is absolute, a record cannot be moved without re-encoding.
///
/// Fixed-width text is filled up to its declared width with the pad
/// character, which is stripped again on decode.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    pad: char,
}

impl RecordCodec {
    pub fn new(pad: char) -> Self {
        Self { pad }
    }

    pub fn pad_char(&self) -> char {
        self.pad
    }

    /// Write `record` into `page` starting at `pos`; returns the position
    /// one past the last byte written.
    pub fn encode(&self, record: &Record, page: &mut [u8], pos: usize) -> AccessResult<usize> {
        let schema = record.table().schema();
        let field_count = schema.len();

        let mut offsets = Vec::with_capacity(field_count + 1);
        let mut fields = Vec::with_capacity(field_count);
        let mut cursor = pos + (field_count + 1) * 4;
        for field in schema.fields() {
            let value = record.get(field.name()).ok_or_else(|| {
                AccessError::SchemaViolation(format!(
                    "record misses value for field `{}`",
                    field.name()
                ))
            })?;
            offsets.push(cursor as u32);
            cursor += field.data_type().byte_len(value);
            fields.push((field.data_type(), value));
        }
        offsets.push(cursor as u32);

        let end = cursor;
        if end > page.len() {
            return Err(StorageError::OutOfSpace {
                required: end - pos,
                available: page.len().saturating_sub(pos),
            }
            .into());
        }

        let mut out = &mut page[pos..end];
        for offset in &offsets {
            out.put_u32_le(*offset);
        }
        for (data_type, value) in fields {
            match (data_type, value) {
                (DataType::Int, Value::Int(v)) => out.put_i32_le(*v),
                (DataType::Float, Value::Float(v)) => out.put_f32_le(*v),
                (DataType::Text(width), Value::Text(text)) => {
                    let width = width as usize;
                    let mut written = 0;
                    for unit in text.encode_utf16().take(width) {
                        out.put_u16_le(unit);
                        written += 1;
                    }
                    while written < width {
                        out.put_u16_le(self.pad as u16);
                        written += 1;
                    }
                }
                (DataType::VarText(width), Value::Text(text)) => {
                    for unit in text.encode_utf16().take(width as usize) {
                        out.put_u16_le(unit);
                    }
                }
                (data_type, value) => {
                    return Err(AccessError::SchemaViolation(format!(
                        "value `{}` does not match column type {}",
                        value, data_type
                    )));
                }
            }
        }
        Ok(end)
    }

    /// Rebuild a record from `page` starting at `pos`. The record id is left
    /// unset; the caller knows where the bytes came from.
    pub fn decode(&self, table: &Rc<TableInfo>, page: &[u8], pos: usize) -> AccessResult<Record> {
        let schema = table.schema();
        let field_count = schema.len();
        let table_end = pos + (field_count + 1) * 4;
        if table_end > page.len() {
            return Err(corrupt("record offset table runs past the page end"));
        }

        let mut cur = &page[pos..table_end];
        let mut offsets = Vec::with_capacity(field_count + 1);
        for _ in 0..=field_count {
            offsets.push(cur.get_u32_le());
        }

        let mut values = HashMap::with_capacity(field_count);
        for (i, field) in schema.fields().iter().enumerate() {
            let start = offsets[i] as usize;
            let value = match field.data_type() {
                DataType::Int => {
                    let mut bytes = field_bytes(page, start, start + 4)?;
                    Value::Int(bytes.get_i32_le())
                }
                DataType::Float => {
                    let mut bytes = field_bytes(page, start, start + 4)?;
                    Value::Float(bytes.get_f32_le())
                }
                DataType::Text(_) | DataType::VarText(_) => {
                    let end = offsets[i + 1] as usize;
                    let bytes = field_bytes(page, start, end)?;
                    if bytes.len() % 2 != 0 {
                        return Err(corrupt("text payload has an odd byte length"));
                    }
                    let units: Vec<u16> = bytes
                        .chunks_exact(2)
                        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                        .collect();
                    let text = String::from_utf16(&units)
                        .map_err(|_| corrupt("text payload is not valid UTF-16"))?;
                    match field.data_type() {
                        DataType::Text(_) => {
                            Value::Text(text.trim_end_matches(self.pad).to_string())
                        }
                        _ => Value::Text(text),
                    }
                }
            };
            values.insert(field.name().to_string(), value);
        }
        Record::new(Rc::clone(table), values)
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PAD_CHAR)
    }
}

/// Encoded byte size of a value set under `schema`: the offset table plus
/// every field payload.
pub fn encoded_size(schema: &Schema, values: &HashMap<String, Value>) -> usize {
    let mut size = (schema.len() + 1) * 4;
    for field in schema.fields() {
        if let Some(value) = values.get(field.name()) {
            size += field.data_type().byte_len(value);
        }
    }
    size
}

fn corrupt(message: &str) -> AccessError {
    AccessError::SchemaViolation(message.to_string())
}

fn field_bytes(page: &[u8], start: usize, end: usize) -> AccessResult<&[u8]> {
    if start > end || end > page.len() {
        return Err(corrupt("record field runs past the page end"));
    }
    Ok(&page[start..end])
}

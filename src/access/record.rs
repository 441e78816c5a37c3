use crate::access::codec;
use crate::access::error::{AccessError, AccessResult};
use crate::access::value::Value;
use crate::catalog::table_info::TableInfo;
use crate::storage::page::PageId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Address of a stored record: the data page holding it plus its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.page_id.file_index, self.page_id.page_index, self.slot).cmp(&(
            other.page_id.file_index,
            other.page_id.page_index,
            other.slot,
        ))
    }
}

/// One typed row of a table: a value per schema field, the table handle it
/// belongs to, its cached encoded size, and — once persisted — its address.
///
/// Construction validates every field against the schema and rejects
/// mismatches outright; nothing is coerced or truncated on the way in.
#[derive(Debug, Clone)]
pub struct Record {
    table: Rc<TableInfo>,
    values: HashMap<String, Value>,
    size: usize,
    record_id: Option<RecordId>,
}

impl Record {
    pub fn new(table: Rc<TableInfo>, values: HashMap<String, Value>) -> AccessResult<Self> {
        let schema = table.schema();
        if values.len() != schema.len() {
            return Err(AccessError::SchemaViolation(format!(
                "table `{}` expects {} fields, got {}",
                table.name(),
                schema.len(),
                values.len()
            )));
        }
        for field in schema.fields() {
            let value = values.get(field.name()).ok_or_else(|| {
                AccessError::SchemaViolation(format!(
                    "missing value for field `{}` of table `{}`",
                    field.name(),
                    table.name()
                ))
            })?;
            if !field.data_type().check(value) {
                return Err(AccessError::SchemaViolation(format!(
                    "value `{}` does not fit field `{}` of type {}",
                    value,
                    field.name(),
                    field.data_type()
                )));
            }
        }

        let size = codec::encoded_size(schema, &values);
        Ok(Self {
            table,
            values,
            size,
            record_id: None,
        })
    }

    /// Build a record from positional values in schema order.
    pub fn from_values(table: Rc<TableInfo>, values: Vec<Value>) -> AccessResult<Self> {
        if values.len() != table.schema().len() {
            return Err(AccessError::SchemaViolation(format!(
                "table `{}` expects {} fields, got {}",
                table.name(),
                table.schema().len(),
                values.len()
            )));
        }
        let named = table
            .schema()
            .fields()
            .iter()
            .zip(values)
            .map(|(field, value)| (field.name().to_string(), value))
            .collect();
        Self::new(table, named)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Encoded byte size, computed once at construction.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn table(&self) -> &Rc<TableInfo> {
        &self.table
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, record_id: RecordId) {
        self.record_id = Some(record_id);
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.table.name() == other.table.name() && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in self.table.schema().fields() {
            if !first {
                write!(f, " ; ")?;
            }
            first = false;
            match self.values.get(field.name()) {
                Some(value) => write!(f, "{}={}", field.name(), value)?,
                None => write!(f, "{}=?", field.name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::value::DataType;
    use crate::catalog::schema::{Field, Schema};

    fn test_table() -> Rc<TableInfo> {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int),
            Field::new("name", DataType::Text(6)),
            Field::new("score", DataType::Float),
        ]);
        Rc::new(TableInfo::new("players", PageId::new(0, 0), schema))
    }

    #[test]
    fn test_record_id_ordering() {
        let a = RecordId::new(PageId::new(0, 1), 5);
        let b = RecordId::new(PageId::new(0, 1), 9);
        let c = RecordId::new(PageId::new(1, 0), 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_valid_record() {
        let table = test_table();
        let record = Record::from_values(
            Rc::clone(&table),
            vec![
                Value::Int(1),
                Value::Text("Bob".into()),
                Value::Float(9.5),
            ],
        )
        .unwrap();

        assert_eq!(record.get("id"), Some(&Value::Int(1)));
        assert_eq!(record.get("name"), Some(&Value::Text("Bob".into())));
        assert_eq!(record.record_id(), None);
        // (3+1)*4 offset ints + 4 + 12 + 4 payload bytes.
        assert_eq!(record.size(), 36);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let table = test_table();
        let err = Record::from_values(
            Rc::clone(&table),
            vec![
                Value::Text("one".into()),
                Value::Text("Bob".into()),
                Value::Float(9.5),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AccessError::SchemaViolation(_)));
    }

    #[test]
    fn test_oversized_text_rejected() {
        let table = test_table();
        let err = Record::from_values(
            Rc::clone(&table),
            vec![
                Value::Int(1),
                Value::Text("Maximilian".into()),
                Value::Float(9.5),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AccessError::SchemaViolation(_)));
    }

    #[test]
    fn test_field_count_mismatch_rejected() {
        let table = test_table();
        let err =
            Record::from_values(Rc::clone(&table), vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, AccessError::SchemaViolation(_)));
    }

    #[test]
    fn test_missing_field_name_rejected() {
        let table = test_table();
        let mut values = HashMap::new();
        values.insert("id".to_string(), Value::Int(1));
        values.insert("nickname".to_string(), Value::Text("Bob".into()));
        values.insert("score".to_string(), Value::Float(1.0));
        let err = Record::new(Rc::clone(&table), values).unwrap_err();
        assert!(matches!(err, AccessError::SchemaViolation(_)));
    }

    #[test]
    fn test_display_follows_schema_order() {
        let table = test_table();
        let record = Record::from_values(
            Rc::clone(&table),
            vec![
                Value::Int(1),
                Value::Text("Bob".into()),
                Value::Float(9.5),
            ],
        )
        .unwrap();
        assert_eq!(record.to_string(), "id=1 ; name=Bob ; score=9.5");
    }
}

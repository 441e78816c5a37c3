//! Typed record access on top of the storage layer: field values and their
//! declared types, the record codec, and the per-table insert/scan/delete
//! orchestration.

pub mod codec;
pub mod error;
pub mod record;
pub mod scan;
pub mod table;
pub mod value;

pub use codec::RecordCodec;
pub use error::{AccessError, AccessResult};
pub use record::{Record, RecordId};
pub use scan::RecordScan;
pub use table::TableStore;
pub use value::{DataType, Value};

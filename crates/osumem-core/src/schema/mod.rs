//! Explicit field tables
//!
//! An [`AddressSchema`] names the addresses a process exposes, found either
//! by signature scan or derived from other addresses. A [`RecordSchema`]
//! lists the fields of a record type, each with the expression locating it
//! and the shape to decode. Both are validated when built, so a typo in an
//! expression fails at startup instead of on the first read.

mod address;
mod record;

pub use address::{AddressEntry, AddressKind, AddressSchema, AddressSchemaBuilder, AddressTable};
pub use record::{Record, RecordField, RecordSchema, RecordSchemaBuilder};

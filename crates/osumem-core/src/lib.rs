//! # osumem-core
//!
//! Core library for reading live state out of the osu! stable client.
//!
//! This crate provides:
//! - Byte-signature scanning over a process's readable memory
//! - Address expressions for walking pointer chains (`[[Base - 0x33]] + 0xC`)
//! - Bounds-checked decoding of scalars, .NET arrays and .NET strings
//! - Declarative record schemas read field by field with per-field errors
//! - The osu! address table and record layouts
//! - An on-disk cache of resolved addresses
//!
//! Process access goes through the [`Process`] trait; the Windows
//! implementation is only built on Windows.

pub mod cache;
pub mod config;
pub mod error;
pub mod expr;
pub mod memory;
pub mod osu;
pub mod schema;
pub mod session;
pub mod signature;

pub use cache::AddressCache;
pub use config::{Config, ConfigBuilder};
pub use error::{AggregateError, Error, FieldError, LengthKind, Result};
pub use expr::{AddressExpr, Binding, VariableResolver};
pub use memory::{
    MemoryReader, Process, Region, ScalarType, ScalarValue, Shape, Value, attach, attach_pid,
};
pub use osu::{GameStatus, GameplayData, MenuData, Schemas, StatusData};
pub use schema::{AddressSchema, AddressTable, Record, RecordSchema};
pub use session::Session;
pub use signature::{Pattern, Scanner};

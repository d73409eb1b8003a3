//! # Dossier Core
//!
//! Domain types, traits, and error definitions for the Dossier record
//! query engine. This crate has **zero framework dependencies** — it
//! defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Records are generic key-value maps validated against a per-collection
//! [`Schema`]; the three business domains differ only in configuration.
//! Data access ([`RecordStore`]), time ([`Clock`]) and the tool-calling
//! surface ([`Tool`]) are traits here, with implementations in their
//! respective crates.

pub mod clock;
pub mod error;
pub mod record;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, QueryError, Result, SchemaError, StoreError, ToolError};
pub use record::{FieldKind, FieldSpec, FieldValue, Record, Schema, categorical_eq};
pub use store::{RecordStore, Snapshot};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};

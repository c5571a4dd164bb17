//! # berth codec
//!
//! Field-tagged record encoding/decoding for berth.
//!
//! Records are tuples of `(tag, value)` fields. Tags are stable numeric
//! identifiers that are never repurposed, which is what makes stored data
//! readable across schema versions:
//!
//! - a tag the schema declares but the bytes lack is backfilled from the
//!   field's declared default (old data, new schema);
//! - a tag the bytes carry but the schema does not declare is skipped
//!   (new data, old schema).
//!
//! The [`SchemaRegistry`] maps stable type identifiers to schemas and
//! rejects duplicate or retired identifiers at registration time.
//!
//! ## Usage
//!
//! ```
//! use berth_codec::{FieldSpec, Schema, TypeId, Value, ValueKind};
//!
//! let schema = Schema::new(
//!     TypeId::new(1),
//!     "counter",
//!     vec![FieldSpec::new(0, "count", ValueKind::Integer, Value::Integer(0))],
//! )
//! .unwrap();
//!
//! // Old data without the field decodes to the default.
//! let empty = berth_codec::encode_fields(&[]);
//! let record = schema.decode(&empty).unwrap();
//! assert_eq!(record.integer_at(0), Some(0));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod registry;
mod schema;
mod value;
mod wire;

pub use error::{CodecError, CodecResult};
pub use registry::SchemaRegistry;
pub use schema::{FieldRecord, FieldSpec, Schema, TypeId};
pub use value::{Value, ValueKind};
pub use wire::{decode_fields, encode_fields};

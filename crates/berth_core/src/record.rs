//! The typed record seam between boxes and the codec.

use berth_codec::{CodecResult, FieldRecord, Schema, TypeId};

/// A record type that can live in a box.
///
/// Implementors declare a stable [`TypeId`], a schema with stable field
/// tags, and conversions to and from the codec's [`FieldRecord`].
///
/// `from_fields` is infallible by contract: [`Schema::decode`] guarantees
/// that every declared tag is present (backfilled from its default if
/// absent) and that each value satisfies its declared kind or is null,
/// so implementations extract with `unwrap_or`-style fallbacks that can
/// only trigger on hand-built records.
pub trait BoxRecord: Sized {
    /// Stable type identifier for this record type. Never reuse a
    /// retired identifier (see [`crate::RESERVED_TYPE_IDS`]).
    const TYPE_ID: TypeId;

    /// The declared schema for this record type.
    ///
    /// # Errors
    ///
    /// Fails only on an invalid declaration (duplicate tags, default
    /// kind mismatch), which is a build defect surfaced at store open.
    fn schema() -> CodecResult<Schema>;

    /// Projects this record into tagged field values.
    fn to_fields(&self) -> FieldRecord;

    /// Reconstructs a record from decoded field values.
    fn from_fields(record: &FieldRecord) -> Self;
}

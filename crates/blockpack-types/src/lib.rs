//! Identifier types for blockpack.
//!
//! Every other blockpack crate depends on `blockpack-types`. The two
//! identifiers here are leaf values: they carry no behavior beyond parsing,
//! formatting and ordering.
//!
//! # Key Types
//!
//! - [`ContentId`] — Content-addressed block identifier (BLAKE3 hash)
//! - [`PhysicalBlockId`] — Name of the physical storage blob a pack lives in

pub mod content;
pub mod error;
pub mod physical;

pub use content::ContentId;
pub use error::TypeError;
pub use physical::PhysicalBlockId;

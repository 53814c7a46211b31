//! # Tickframe Serde
//! Byte-oriented wire primitives shared by the snapshot sender and receiver.
//!
//! Everything on the wire is little-endian and byte-aligned: fixed-width
//! integers and floats through the [`Serde`] trait, plus the variable-length
//! [`PackedInt`] encoding used for tick stamps.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod integer;
mod reader;
mod serde;
mod writer;

pub use error::SerdeErr;
pub use integer::PackedInt;
pub use reader::ByteReader;
pub use serde::Serde;
pub use writer::ByteWriter;

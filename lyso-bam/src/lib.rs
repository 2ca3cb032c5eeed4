//! Streaming codec for the BAM binary alignment format.
//!
//! The pipeline runs gzip/BGZF decompression ([`inflate`]) into a raw
//! byte-framing parser ([`raw`]) into an expander/downgrader
//! ([`expand`], [`downgrade`]) that bridges raw records and the typed
//! SAM item model ([`model`]). [`reader`] wires the whole pipeline
//! together over a plain [`std::io::Read`] source.

pub mod aux;
pub mod bin;
pub mod cigar;
pub mod downgrade;
pub mod error;
pub mod expand;
pub mod header;
pub mod inflate;
pub mod model;
pub mod raw;
pub mod reader;
pub mod samtext;
pub mod seq;

/// The four magic bytes every BAM stream's header block begins with.
pub const BAM_MAGIC: [u8; 4] = *b"BAM\x01";

pub use error::BamError;
pub use model::{AlignmentRecord, Flags, ReferenceRecord, ReferenceSequence, SamItem, SequenceField};
pub use raw::{RawAlignment, RawItem};
pub use reader::{BamReader, BamWriter};

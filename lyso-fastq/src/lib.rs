//! Streaming codec for plain FASTQ text (C8).
//!
//! [`line_split`] turns a byte stream into text lines; [`parser`] groups
//! every four lines into a [`model::FastqItem`]. [`illumina`] decodes the
//! Casava ≥1.8 read-name convention carried in a record's `name` field.
//! [`reader`] wires the line-splitting and grouping transforms together
//! over a plain [`std::io::Read`]/[`std::io::Write`] source.

pub mod error;
pub mod illumina;
pub mod line_split;
pub mod model;
pub mod parser;
pub mod reader;

pub use error::{FastqError, IlluminaNameError};
pub use illumina::{format_illumina_name, parse_illumina_name, tile_of_string, tile_to_string, IlluminaName, Surface, Tile};
pub use model::FastqItem;
pub use parser::{emit_item, qualities_of_line, split_name, FastqParser};
pub use reader::{FastqReader, FastqWriter};

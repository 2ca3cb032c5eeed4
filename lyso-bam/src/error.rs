use std::fmt;
use thiserror::Error;

/// Errors raised while carving header/reference-dictionary/alignment
/// structure out of an inflated byte stream (C3).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("missing BAM magic string (got {0:02x?})")]
    WrongMagicNumber([u8; 4]),
    #[error("malformed little-endian 32-bit integer: {0:02x?}")]
    WrongInt32(Vec<u8>),
    #[error("reference dictionary exceeded {buf} buffered bytes while needing {len} more")]
    ReferenceInformationOverflow { len: usize, buf: usize },
    #[error("reference name is not null-terminated")]
    ReferenceInformationNameNotNullTerminated,
    #[error("read name is not null-terminated")]
    ReadNameNotNullTerminated,
    #[error("alignment block declared {declared} bytes but its fixed-layout fields need {needed}")]
    TruncatedAlignmentBlock { declared: usize, needed: usize },
}

/// Errors from the typed auxiliary-field codec (C4).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuxError {
    #[error("auxiliary field ran past the end of its block")]
    OutOfBounds,
    #[error("unknown auxiliary field type code {0:?}")]
    UnknownType(u8),
    #[error("'Z' string auxiliary field is not null-terminated")]
    NullTerminatedString,
    #[error("'H' hex-array auxiliary field is not null-terminated")]
    NullTerminatedHexArray,
    #[error("'B' array auxiliary field declared {0} elements, exceeding the safety cap")]
    ArraySize(u32),
    #[error("malformed little-endian 32-bit integer in auxiliary field: {0:02x?}")]
    WrongInt32(Vec<u8>),
}

/// Errors from the CIGAR codec (C5).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CigarError {
    #[error("CIGAR blob length {0} is not a multiple of 4")]
    WrongCigarLength(usize),
    #[error("CIGAR operation word has an out-of-range opcode: {0:02x?}")]
    WrongCigar(Vec<u8>),
}

/// Errors from the SAM header text codec (C6).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header line {0} appears before an @HD line, or no @HD line is present")]
    HeaderLineNotFirst(usize),
}

/// Errors raised while raising a raw alignment into the SAM item model
/// (C7, expand direction).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("query template name is empty or longer than 255 characters")]
    WrongQname,
    #[error("flag {0} does not fit in 16 bits")]
    WrongFlag(u32),
    #[error("position {0} is out of the representable 0-based range")]
    WrongPos(i64),
    #[error("mapping quality {0} is out of range")]
    WrongMapq(u32),
    #[error("next-segment position {0} is out of the representable 0-based range")]
    WrongPnext(i64),
    #[error("template length {0} is out of the representable range")]
    WrongTlen(i64),
    #[error("reference id {0} has no entry in the reference dictionary")]
    ReferenceSequenceNotFound(i32),
    #[error(transparent)]
    Aux(#[from] AuxError),
    #[error(transparent)]
    Cigar(#[from] CigarError),
    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Errors raised while lowering a SAM item back into a raw alignment
/// (C7, downgrade direction).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DowngradeError {
    #[error("reference name {0:?} is not present in the reference dictionary")]
    ReferenceNameNotFound(String),
    #[error("alignment declares sequence = reference-equal but no reference sequence is available to emit")]
    CannotGetSequence,
    #[error(transparent)]
    Aux(#[from] AuxError),
    #[error(transparent)]
    Cigar(#[from] CigarError),
}

/// Error from the gzip/BGZF inflater (C2). Wraps the underlying I/O
/// error surfaced by the streaming inflater.
#[derive(Error)]
pub enum GzipError {
    #[error("gzip decompression error: {0}")]
    Unzip(#[source] std::io::Error),
}

impl Clone for GzipError {
    fn clone(&self) -> Self {
        match self {
            GzipError::Unzip(e) => {
                GzipError::Unzip(std::io::Error::new(e.kind(), e.to_string()))
            }
        }
    }
}

impl PartialEq for GzipError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GzipError::Unzip(a), GzipError::Unzip(b)) => {
                a.kind() == b.kind() && a.to_string() == b.to_string()
            }
        }
    }
}

/// The union of every error this crate can produce, used by the
/// end-to-end reader/writer convenience wrappers that compose C2, C3,
/// and C7 into a single pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BamError {
    #[error(transparent)]
    Gzip(#[from] GzipError),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error(transparent)]
    Aux(#[from] AuxError),
    #[error(transparent)]
    Cigar(#[from] CigarError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Downgrade(#[from] DowngradeError),
}

impl fmt::Debug for GzipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GzipError::Unzip(e) => f.debug_tuple("Unzip").field(e).finish(),
        }
    }
}

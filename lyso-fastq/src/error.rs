use thiserror::Error;

/// Errors raised while grouping four tagged lines into a [`crate::model::FastqItem`] (C8).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FastqError {
    #[error("record's first line does not start with '@'")]
    MissingAt,
    #[error("record's third line does not start with '+'")]
    MissingPlus,
    #[error("quality string length {qual_len} does not match sequence length {seq_len}")]
    SeqQualMismatch { seq_len: usize, qual_len: usize },
    #[error("i/o error reading fastq stream: {0}")]
    Io(String),
}

/// Errors raised while parsing an Illumina Casava ≥1.8 read name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IlluminaNameError {
    #[error("expected 11 colon/space-separated fields, got {0}")]
    WrongFieldCount(usize),
    #[error("tile string {0:?} is not a 4-digit number")]
    WrongTileFormat(String),
    #[error("tile surface digit {0} is neither 1 (top) nor 2 (bottom)")]
    WrongSurface(u8),
    #[error("is_filtered field {0:?} is neither 'Y' nor 'N'")]
    WrongIsFiltered(String),
    #[error("field {0:?} is not a valid integer")]
    InvalidInteger(String),
}

use std::collections::VecDeque;

use lyso_common::{Polled, Transform};

use crate::error::FastqError;
use crate::model::FastqItem;

/// Verifies a quality string has the same length as its sequence.
/// Called unconditionally here since both strings always come from the
/// same four-line record; a caller checking against some other,
/// externally-supplied sequence may call this directly instead.
pub fn qualities_of_line(sequence: &str, qualities: &str) -> Result<(), FastqError> {
    if sequence.len() != qualities.len() {
        return Err(FastqError::SeqQualMismatch {
            seq_len: sequence.len(),
            qual_len: qualities.len(),
        });
    }
    Ok(())
}

/// Splits a FASTQ name field at the first run of whitespace, the way
/// Illumina read names separate the read id from trailing metadata
/// (`SRR1/1 extra` -> `("SRR1/1", Some("extra"))`).
pub fn split_name(s: &str) -> (String, Option<String>) {
    match s.split_once(char::is_whitespace) {
        Some((id, rest)) => (id.to_string(), Some(rest.trim_start().to_string())),
        None => (s.to_string(), None),
    }
}

/// Groups a stream of already-split text lines into four-line FASTQ
/// records (C8). Line-splitting itself is a collaborator (§4.8); this
/// transform consumes whole lines with no trailing newline.
#[derive(Default)]
pub struct FastqParser {
    lines: VecDeque<String>,
    errored: bool,
}

impl FastqParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_one(&mut self) -> Option<Result<FastqItem, FastqError>> {
        if self.lines.len() < 4 {
            return None;
        }
        let name_line = self.lines.pop_front().unwrap();
        let seq_line = self.lines.pop_front().unwrap();
        let plus_line = self.lines.pop_front().unwrap();
        let qual_line = self.lines.pop_front().unwrap();

        if !name_line.starts_with('@') {
            return Some(Err(FastqError::MissingAt));
        }
        if !plus_line.starts_with('+') {
            return Some(Err(FastqError::MissingPlus));
        }
        if let Err(e) = qualities_of_line(&seq_line, &qual_line) {
            return Some(Err(e));
        }

        Some(Ok(FastqItem {
            name: name_line[1..].to_string(),
            sequence: seq_line,
            comment: plus_line[1..].to_string(),
            qualities: qual_line,
        }))
    }
}

impl Transform for FastqParser {
    type Input = String;
    type Output = FastqItem;
    type Error = FastqError;

    fn feed(&mut self, chunk: String) {
        self.lines.push_back(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<FastqItem, FastqError> {
        if self.errored {
            return Polled::EndOfStream;
        }
        match self.parse_one() {
            Some(Ok(item)) => Polled::Output(item),
            Some(Err(e)) => {
                self.errored = true;
                Polled::Error(e)
            }
            None if stopped => Polled::EndOfStream,
            None => Polled::NotReady,
        }
    }
}

/// Renders one item back to its four-line wire form, the inverse of
/// [`FastqParser`] (including the trailing newline on every line).
pub fn emit_item(item: &FastqItem) -> String {
    format!("@{}\n{}\n+{}\n{}\n", item.name, item.sequence, item.comment, item.qualities)
}

use std::collections::VecDeque;

use lyso_common::{Polled, Transform};

use crate::aux::encode_aux_fields;
use crate::bin::reg_to_bin;
use crate::cigar::encode_cigar;
use crate::error::DowngradeError;
use crate::header::{emit_header_text, HeaderLine};
use crate::model::{AlignmentRecord, ReferenceRecord, ReferenceSequence, SamItem, SequenceField};
use crate::raw::{RawAlignment, RawItem};
use crate::seq::seq_to_nibbles;

fn resolve_ref(r: &ReferenceSequence, dict: &[ReferenceRecord]) -> Result<i32, DowngradeError> {
    match r {
        ReferenceSequence::None => Ok(-1),
        ReferenceSequence::ByName(name) => dict
            .iter()
            .position(|e| &e.name == name)
            .map(|i| i as i32)
            .ok_or_else(|| DowngradeError::ReferenceNameNotFound(name.clone())),
        ReferenceSequence::Resolved(rr) => dict
            .iter()
            .position(|e| e.name == rr.name)
            .map(|i| i as i32)
            .ok_or_else(|| DowngradeError::ReferenceNameNotFound(rr.name.clone())),
    }
}

fn downgrade_alignment(rec: &AlignmentRecord, dict: &[ReferenceRecord]) -> Result<RawAlignment, DowngradeError> {
    let ref_id = resolve_ref(&rec.reference_sequence, dict)?;
    let next_ref_id = resolve_ref(&rec.next_reference_sequence, dict)?;

    let pos = rec.position.map(|v| v as i32 - 1).unwrap_or(-1);
    let next_pos = rec.next_position.map(|v| v as i32 - 1).unwrap_or(-1);
    let mapq = rec.mapping_quality.unwrap_or(255);

    let mut read_name = rec.query_template_name.as_bytes().to_vec();
    read_name.push(0);

    let cigar = encode_cigar(&rec.cigar_operations);
    let optional = encode_aux_fields(&rec.optional_content);

    let seq = match &rec.sequence {
        SequenceField::Str(s) => seq_to_nibbles(s),
        SequenceField::None => Vec::new(),
        SequenceField::ReferenceEqual => return Err(DowngradeError::CannotGetSequence),
    };
    let qual = if rec.quality.is_empty() {
        vec![255u8; seq.len()]
    } else {
        rec.quality.iter().map(|p| p.to_int() as u8).collect()
    };

    let bin = reg_to_bin(pos.max(0), seq.len() as u32);

    Ok(RawAlignment {
        ref_id,
        pos,
        mapq,
        bin,
        flag: rec.flags.bits(),
        next_ref_id,
        next_pos,
        tlen: rec.template_length,
        read_name,
        cigar,
        seq,
        qual,
        optional,
    })
}

/// Lowers a stream of SAM items back into raw BAM items (C7, downgrade
/// direction); the inverse of [`crate::expand::Expander`].
#[derive(Default)]
pub struct Downgrader {
    in_queue: VecDeque<SamItem>,
    out_queue: VecDeque<RawItem>,
    header_buf: Vec<HeaderLine>,
    dict: Vec<ReferenceRecord>,
    ref_info_emitted: bool,
    errored: bool,
}

impl Downgrader {
    pub fn new() -> Self {
        Self::default()
    }

    fn process(&mut self, item: SamItem) -> Result<(), DowngradeError> {
        match item {
            SamItem::Header(line) => {
                self.header_buf.push(line);
            }
            SamItem::ReferenceSequenceDictionary(dict) => {
                let text = emit_header_text(&self.header_buf);
                self.out_queue.push_back(RawItem::Header(text));
                self.dict = dict;
            }
            SamItem::Alignment(rec) => {
                if !self.ref_info_emitted {
                    let entries = self.dict.iter().map(|r| (r.name.clone(), r.length)).collect();
                    self.out_queue.push_back(RawItem::ReferenceInformation(entries));
                    self.ref_info_emitted = true;
                }
                let raw = downgrade_alignment(&rec, &self.dict)?;
                self.out_queue.push_back(RawItem::Alignment(raw));
            }
        }
        Ok(())
    }
}

impl Transform for Downgrader {
    type Input = SamItem;
    type Output = RawItem;
    type Error = DowngradeError;

    fn feed(&mut self, chunk: SamItem) {
        self.in_queue.push_back(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<RawItem, DowngradeError> {
        loop {
            if self.errored {
                return Polled::EndOfStream;
            }
            if let Some(item) = self.out_queue.pop_front() {
                return Polled::Output(item);
            }
            match self.in_queue.pop_front() {
                Some(item) => {
                    if let Err(e) = self.process(item) {
                        self.errored = true;
                        return Polled::Error(e);
                    }
                }
                None => {
                    return if stopped {
                        Polled::EndOfStream
                    } else {
                        Polled::NotReady
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::SortOrder;
    use crate::model::Flags;
    use lyso_common::Phred;

    fn minimal_record(name: &str) -> AlignmentRecord {
        AlignmentRecord {
            query_template_name: name.to_string(),
            flags: Flags::new(4),
            reference_sequence: ReferenceSequence::None,
            position: None,
            mapping_quality: None,
            cigar_operations: vec![],
            next_reference_sequence: ReferenceSequence::None,
            next_position: None,
            template_length: 0,
            sequence: SequenceField::Str("ACGT".to_string()),
            quality: vec![Phred::of_raw(30); 4],
            optional_content: vec![],
        }
    }

    #[test]
    fn flushes_header_then_ref_info_before_first_alignment() {
        let mut d = Downgrader::new();
        d.feed(SamItem::Header(HeaderLine::Hd {
            version: "1.6".to_string(),
            sort_order: SortOrder::Unknown,
            extra: vec![],
        }));
        d.feed(SamItem::ReferenceSequenceDictionary(vec![ReferenceRecord {
            name: "chr1".to_string(),
            length: 100,
        }]));
        d.feed(SamItem::Alignment(minimal_record("r1")));

        match d.next(false) {
            Polled::Output(RawItem::Header(text)) => assert!(text.contains("@HD")),
            other => panic!("expected header, got {other:?}"),
        }
        assert_eq!(
            d.next(false),
            Polled::Output(RawItem::ReferenceInformation(vec![("chr1".to_string(), 100)]))
        );
        match d.next(false) {
            Polled::Output(RawItem::Alignment(a)) => {
                assert_eq!(a.read_name, b"r1\0");
                assert_eq!(a.seq, vec![1, 2, 4, 8]); // A C G T
            }
            other => panic!("expected alignment, got {other:?}"),
        }
    }

    #[test]
    fn unknown_reference_name_errors() {
        let mut d = Downgrader::new();
        d.feed(SamItem::ReferenceSequenceDictionary(vec![]));
        let mut rec = minimal_record("r1");
        rec.reference_sequence = ReferenceSequence::ByName("chrX".to_string());
        d.feed(SamItem::Alignment(rec));
        assert!(matches!(d.next(false), Polled::Output(RawItem::Header(_))));
        assert!(matches!(d.next(false), Polled::Output(RawItem::ReferenceInformation(_))));
        assert_eq!(
            d.next(false),
            Polled::Error(DowngradeError::ReferenceNameNotFound("chrX".to_string()))
        );
    }

    #[test]
    fn reference_equal_sequence_cannot_be_emitted() {
        let mut d = Downgrader::new();
        d.feed(SamItem::ReferenceSequenceDictionary(vec![]));
        let mut rec = minimal_record("r1");
        rec.sequence = SequenceField::ReferenceEqual;
        d.feed(SamItem::Alignment(rec));
        assert!(matches!(d.next(false), Polled::Output(RawItem::Header(_))));
        assert!(matches!(d.next(false), Polled::Output(RawItem::ReferenceInformation(_))));
        assert_eq!(d.next(false), Polled::Error(DowngradeError::CannotGetSequence));
    }
}

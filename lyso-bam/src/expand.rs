use std::collections::VecDeque;

use lyso_common::{Phred, Polled, Transform};

use crate::aux::decode_aux_blob;
use crate::cigar::decode_cigar;
use crate::error::ExpandError;
use crate::header::parse_header_text;
use crate::model::{AlignmentRecord, Flags, ReferenceRecord, ReferenceSequence, SamItem, SequenceField};
use crate::raw::{RawAlignment, RawItem};
use crate::seq::nibbles_to_seq;

const MAX_POS: i32 = 536_870_910;
const MAX_TLEN: i64 = 536_870_911;

fn expand_alignment(a: &RawAlignment, dict: &[ReferenceRecord]) -> Result<AlignmentRecord, ExpandError> {
    if a.read_name.len() < 2 || a.read_name.len() > 256 {
        return Err(ExpandError::WrongQname);
    }
    let qname = String::from_utf8_lossy(&a.read_name[..a.read_name.len() - 1]).into_owned();
    if qname.is_empty() || qname.len() > 255 {
        return Err(ExpandError::WrongQname);
    }

    if !(-1..=MAX_POS).contains(&a.pos) {
        return Err(ExpandError::WrongPos(a.pos as i64));
    }
    if !(-1..=MAX_POS).contains(&a.next_pos) {
        return Err(ExpandError::WrongPnext(a.next_pos as i64));
    }
    if (a.tlen as i64).unsigned_abs() > MAX_TLEN as u64 {
        return Err(ExpandError::WrongTlen(a.tlen as i64));
    }

    let resolve = |ref_id: i32| -> Result<ReferenceSequence, ExpandError> {
        if ref_id == -1 {
            return Ok(ReferenceSequence::None);
        }
        dict.get(ref_id as usize)
            .cloned()
            .map(ReferenceSequence::Resolved)
            .ok_or(ExpandError::ReferenceSequenceNotFound(ref_id))
    };

    let reference_sequence = resolve(a.ref_id)?;
    let next_reference_sequence = resolve(a.next_ref_id)?;

    let position = if a.pos == -1 { None } else { Some((a.pos + 1) as u32) };
    let next_position = if a.next_pos == -1 {
        None
    } else {
        Some((a.next_pos + 1) as u32)
    };
    let mapping_quality = if a.mapq == 255 { None } else { Some(a.mapq) };

    let cigar_operations = decode_cigar(&a.cigar)?;
    let optional_content = decode_aux_blob(&a.optional)?;

    let sequence = if a.seq.is_empty() {
        SequenceField::None
    } else {
        SequenceField::Str(nibbles_to_seq(&a.seq))
    };
    let quality = a.qual.iter().map(|&b| Phred::of_raw(b)).collect();

    Ok(AlignmentRecord {
        query_template_name: qname,
        flags: Flags::new(a.flag),
        reference_sequence,
        position,
        mapping_quality,
        cigar_operations,
        next_reference_sequence,
        next_position,
        template_length: a.tlen,
        sequence,
        quality,
        optional_content,
    })
}

/// Raises a stream of raw BAM items into the SAM item model (C7,
/// expand direction).
///
/// The reference dictionary is buffered on arrival but not emitted
/// immediately; it surfaces as a single [`SamItem::ReferenceSequenceDictionary`]
/// item right before the first alignment, per §4.7's re-queueing rule.
#[derive(Default)]
pub struct Expander {
    raw_queue: VecDeque<RawItem>,
    out_queue: VecDeque<SamItem>,
    dict: Vec<ReferenceRecord>,
    dict_emitted: bool,
    errored: bool,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    fn process(&mut self, raw: RawItem) -> Result<(), ExpandError> {
        match raw {
            RawItem::Header(text) => {
                for line in parse_header_text(&text)? {
                    self.out_queue.push_back(SamItem::Header(line));
                }
            }
            RawItem::ReferenceInformation(entries) => {
                self.dict = entries
                    .into_iter()
                    .map(|(name, length)| ReferenceRecord { name, length })
                    .collect();
            }
            RawItem::Alignment(a) => {
                if !self.dict_emitted {
                    self.out_queue
                        .push_back(SamItem::ReferenceSequenceDictionary(self.dict.clone()));
                    self.dict_emitted = true;
                }
                let record = expand_alignment(&a, &self.dict)?;
                self.out_queue.push_back(SamItem::Alignment(record));
            }
        }
        Ok(())
    }
}

impl Transform for Expander {
    type Input = RawItem;
    type Output = SamItem;
    type Error = ExpandError;

    fn feed(&mut self, chunk: RawItem) {
        self.raw_queue.push_back(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<SamItem, ExpandError> {
        loop {
            if self.errored {
                return Polled::EndOfStream;
            }
            if let Some(item) = self.out_queue.pop_front() {
                return Polled::Output(item);
            }
            match self.raw_queue.pop_front() {
                Some(raw) => {
                    if let Err(e) = self.process(raw) {
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

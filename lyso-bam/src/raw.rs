use lyso_common::{Polled, Transform};

use crate::error::FramingError;

const MAX_REF_INFO_BUFFER: usize = 50_000;

/// One alignment record at the raw binary layer: fixed-width fields
/// already decoded, but CIGAR, sequence, and auxiliary data left as
/// opaque blobs for C4/C5/C7 to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAlignment {
    pub ref_id: i32,
    pub pos: i32,
    pub mapq: u8,
    pub bin: u16,
    pub flag: u16,
    pub next_ref_id: i32,
    pub next_pos: i32,
    pub tlen: i32,
    pub read_name: Vec<u8>,
    pub cigar: Vec<u8>,
    /// One nibble code (0..=15) per base, already unpacked from the
    /// 4-bit-per-base wire representation.
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
    pub optional: Vec<u8>,
}

/// One item produced by the raw BAM parser (C3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawItem {
    Header(String),
    ReferenceInformation(Vec<(String, u32)>),
    Alignment(RawAlignment),
}

enum State {
    Header,
    RefInfo,
    Alignments,
}

/// Carves header text, the reference dictionary, and individual
/// alignment records out of an inflated BAM byte stream (C3).
///
/// Bytes are accumulated in a growable buffer; each call to `next`
/// attempts to parse as much structure as the buffer currently allows,
/// reporting [`Polled::NotReady`] when more input is needed and
/// preserving partial progress (e.g. reference dictionary entries
/// already parsed) across calls.
pub struct RawBamParser {
    buf: Vec<u8>,
    offset: usize,
    state: State,
    n_ref: u32,
    ref_collected: Vec<(String, u32)>,
}

impl Default for RawBamParser {
    fn default() -> Self {
        RawBamParser {
            buf: Vec::new(),
            offset: 0,
            state: State::Header,
            n_ref: 0,
            ref_collected: Vec::new(),
        }
    }
}

impl RawBamParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn available(&self) -> &[u8] {
        &self.buf[self.offset..]
    }

    fn compact(&mut self) {
        if self.offset > 0 {
            self.buf.drain(0..self.offset);
            self.offset = 0;
        }
    }

    fn parse_header(&mut self) -> Option<Result<RawItem, FramingError>> {
        let available = self.available();
        if available.len() < 8 {
            return None;
        }
        if &available[0..4] != b"BAM\x01" {
            return Some(Err(FramingError::WrongMagicNumber(
                available[0..4].try_into().unwrap(),
            )));
        }
        let l_text = u32::from_le_bytes(available[4..8].try_into().unwrap()) as usize;
        let total_needed = 8 + l_text + 4;
        if available.len() < total_needed {
            return None;
        }
        let text = String::from_utf8_lossy(&available[8..8 + l_text]).into_owned();
        let n_ref = u32::from_le_bytes(
            available[8 + l_text..8 + l_text + 4].try_into().unwrap(),
        );
        self.offset += total_needed;
        self.n_ref = n_ref;
        self.ref_collected = Vec::new();
        self.state = State::RefInfo;
        Some(Ok(RawItem::Header(text)))
    }

    fn parse_ref_info(&mut self) -> Option<Result<RawItem, FramingError>> {
        loop {
            if self.ref_collected.len() as u32 >= self.n_ref {
                let collected = std::mem::take(&mut self.ref_collected);
                self.state = State::Alignments;
                return Some(Ok(RawItem::ReferenceInformation(collected)));
            }
            let available = self.available();
            if available.len() < 4 {
                return self.ref_info_stall(4);
            }
            let l_name = u32::from_le_bytes(available[0..4].try_into().unwrap()) as usize;
            let needed = 4 + l_name + 4;
            if available.len() < needed {
                return self.ref_info_stall(needed);
            }
            let name_bytes = &available[4..4 + l_name];
            if name_bytes.last() != Some(&0) {
                return Some(Err(FramingError::ReferenceInformationNameNotNullTerminated));
            }
            let name = String::from_utf8_lossy(&name_bytes[..name_bytes.len() - 1]).into_owned();
            let l_ref = u32::from_le_bytes(available[4 + l_name..needed].try_into().unwrap());
            self.offset += needed;
            self.ref_collected.push((name, l_ref));
        }
    }

    fn ref_info_stall(&self, needed: usize) -> Option<Result<RawItem, FramingError>> {
        let buffered = self.available().len();
        if buffered > MAX_REF_INFO_BUFFER {
            return Some(Err(FramingError::ReferenceInformationOverflow {
                len: needed,
                buf: buffered,
            }));
        }
        None
    }

    fn parse_alignment(&mut self) -> Option<Result<RawItem, FramingError>> {
        let available = self.available();
        if available.len() < 4 {
            return None;
        }
        let block_size = u32::from_le_bytes(available[0..4].try_into().unwrap()) as usize;
        let total = 4 + block_size;
        if available.len() < total {
            return None;
        }
        let block = &available[4..total];
        if block.len() < 32 {
            return Some(Err(FramingError::TruncatedAlignmentBlock {
                declared: block.len(),
                needed: 32,
            }));
        }
        let ref_id = i32::from_le_bytes(block[0..4].try_into().unwrap());
        let pos = i32::from_le_bytes(block[4..8].try_into().unwrap());
        let l_read_name = block[8] as usize;
        let mapq = block[9];
        let bin = u16::from_le_bytes(block[10..12].try_into().unwrap());
        let n_cigar_op = u16::from_le_bytes(block[12..14].try_into().unwrap()) as usize;
        let flag = u16::from_le_bytes(block[14..16].try_into().unwrap());
        let l_seq = u32::from_le_bytes(block[16..20].try_into().unwrap()) as usize;
        let next_ref_id = i32::from_le_bytes(block[20..24].try_into().unwrap());
        let next_pos = i32::from_le_bytes(block[24..28].try_into().unwrap());
        let tlen = i32::from_le_bytes(block[28..32].try_into().unwrap());

        let mut cursor = 32usize;
        let cigar_len = 4 * n_cigar_op;
        let seq_byte_len = (l_seq + 1) / 2;
        let needed = cursor + l_read_name + cigar_len + seq_byte_len + l_seq;
        if block.len() < needed {
            return Some(Err(FramingError::TruncatedAlignmentBlock {
                declared: block.len(),
                needed,
            }));
        }

        let read_name_bytes = &block[cursor..cursor + l_read_name];
        if read_name_bytes.last() != Some(&0) {
            return Some(Err(FramingError::ReadNameNotNullTerminated));
        }
        let read_name = read_name_bytes.to_vec();
        cursor += l_read_name;

        let cigar = block[cursor..cursor + cigar_len].to_vec();
        cursor += cigar_len;

        let seq_bytes = &block[cursor..cursor + seq_byte_len];
        let mut seq = Vec::with_capacity(l_seq);
        for &b in seq_bytes {
            seq.push(b >> 4);
            seq.push(b & 0x0F);
        }
        seq.truncate(l_seq);
        cursor += seq_byte_len;

        let qual = block[cursor..cursor + l_seq].to_vec();
        cursor += l_seq;

        let optional = block[cursor..].to_vec();

        self.offset += total;
        Some(Ok(RawItem::Alignment(RawAlignment {
            ref_id,
            pos,
            mapq,
            bin,
            flag,
            next_ref_id,
            next_pos,
            tlen,
            read_name,
            cigar,
            seq,
            qual,
            optional,
        })))
    }
}

/// Encodes one raw item back to wire bytes, the inverse of what
/// [`RawBamParser`] consumes.
///
/// A `Header` item's bytes deliberately omit the trailing `n_ref`
/// field, and a `ReferenceInformation` item's bytes begin with it
/// (recomputed from the entry count): the parser reads them as one
/// contiguous section, so encoding them as two adjacent chunks
/// reproduces the same wire layout as long as callers never interleave
/// another item between the two.
pub fn encode_raw_item(item: &RawItem) -> Vec<u8> {
    match item {
        RawItem::Header(text) => {
            let mut out = Vec::new();
            out.extend(b"BAM\x01");
            out.extend((text.len() as u32).to_le_bytes());
            out.extend(text.as_bytes());
            out
        }
        RawItem::ReferenceInformation(entries) => {
            let mut out = Vec::new();
            out.extend((entries.len() as u32).to_le_bytes());
            for (name, len) in entries {
                let mut name_bytes = name.as_bytes().to_vec();
                name_bytes.push(0);
                out.extend((name_bytes.len() as u32).to_le_bytes());
                out.extend(name_bytes);
                out.extend(len.to_le_bytes());
            }
            out
        }
        RawItem::Alignment(a) => {
            let mut block = Vec::new();
            block.extend(a.ref_id.to_le_bytes());
            block.extend(a.pos.to_le_bytes());
            block.push(a.read_name.len() as u8);
            block.push(a.mapq);
            block.extend(a.bin.to_le_bytes());
            block.extend(((a.cigar.len() / 4) as u16).to_le_bytes());
            block.extend(a.flag.to_le_bytes());
            block.extend((a.seq.len() as u32).to_le_bytes());
            block.extend(a.next_ref_id.to_le_bytes());
            block.extend(a.next_pos.to_le_bytes());
            block.extend(a.tlen.to_le_bytes());
            block.extend(&a.read_name);
            block.extend(&a.cigar);
            for pair in a.seq.chunks(2) {
                let hi = pair[0] & 0x0F;
                let lo = pair.get(1).copied().unwrap_or(0) & 0x0F;
                block.push((hi << 4) | lo);
            }
            block.extend(&a.qual);
            block.extend(&a.optional);

            let mut out = Vec::with_capacity(4 + block.len());
            out.extend((block.len() as u32).to_le_bytes());
            out.extend(block);
            out
        }
    }
}

impl Transform for RawBamParser {
    type Input = Vec<u8>;
    type Output = RawItem;
    type Error = FramingError;

    fn feed(&mut self, chunk: Vec<u8>) {
        self.buf.extend(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<RawItem, FramingError> {
        let outcome = match self.state {
            State::Header => self.parse_header(),
            State::RefInfo => self.parse_ref_info(),
            State::Alignments => self.parse_alignment(),
        };

        self.compact();

        match outcome {
            Some(Ok(item)) => Polled::Output(item),
            Some(Err(e)) => Polled::Error(e),
            None if stopped => Polled::EndOfStream,
            None => Polled::NotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(text: &str, n_ref: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(b"BAM\x01");
        out.extend((text.len() as u32).to_le_bytes());
        out.extend(text.as_bytes());
        out.extend(n_ref.to_le_bytes());
        out
    }

    fn ref_entry(name: &str, len: u32) -> Vec<u8> {
        let mut out = Vec::new();
        let mut name_bytes = name.as_bytes().to_vec();
        name_bytes.push(0);
        out.extend((name_bytes.len() as u32).to_le_bytes());
        out.extend(name_bytes);
        out.extend(len.to_le_bytes());
        out
    }

    #[test]
    fn parses_header_then_empty_ref_info() {
        let mut p = RawBamParser::new();
        p.feed(header_bytes("@HD\tVN:1.6\n", 0));
        assert_eq!(
            p.next(false),
            Polled::Output(RawItem::Header("@HD\tVN:1.6\n".to_string()))
        );
        assert_eq!(
            p.next(false),
            Polled::Output(RawItem::ReferenceInformation(vec![]))
        );
        assert_eq!(p.next(false), Polled::NotReady);
    }

    #[test]
    fn stalls_on_incomplete_header() {
        let mut p = RawBamParser::new();
        p.feed(b"BAM\x01".to_vec());
        assert_eq!(p.next(false), Polled::NotReady);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut p = RawBamParser::new();
        p.feed(b"XXXX\x00\x00\x00\x00".to_vec());
        assert_eq!(
            p.next(false),
            Polled::Error(FramingError::WrongMagicNumber(*b"XXXX"))
        );
    }

    #[test]
    fn parses_reference_dictionary_entries() {
        let mut p = RawBamParser::new();
        p.feed(header_bytes("", 2));
        assert!(matches!(p.next(false), Polled::Output(RawItem::Header(_))));
        p.feed(ref_entry("chr1", 1000));
        p.feed(ref_entry("chr2", 2000));
        assert_eq!(
            p.next(false),
            Polled::Output(RawItem::ReferenceInformation(vec![
                ("chr1".to_string(), 1000),
                ("chr2".to_string(), 2000),
            ]))
        );
    }

    #[test]
    fn parses_one_alignment_record() {
        let mut p = RawBamParser::new();
        p.feed(header_bytes("", 0));
        assert!(matches!(p.next(false), Polled::Output(RawItem::Header(_))));
        assert_eq!(
            p.next(false),
            Polled::Output(RawItem::ReferenceInformation(vec![]))
        );

        // build one minimal alignment block: qname "r1\0" (3 bytes), no
        // cigar, no seq, no qual, no optional fields.
        let mut block = Vec::new();
        block.extend(0i32.to_le_bytes()); // ref_id
        block.extend(0i32.to_le_bytes()); // pos
        block.push(3); // l_read_name
        block.push(0); // mapq
        block.extend(0u16.to_le_bytes()); // bin
        block.extend(0u16.to_le_bytes()); // n_cigar_op
        block.extend(4u16.to_le_bytes()); // flag
        block.extend(0u32.to_le_bytes()); // l_seq
        block.extend((-1i32).to_le_bytes()); // next_ref_id
        block.extend((-1i32).to_le_bytes()); // next_pos
        block.extend(0i32.to_le_bytes()); // tlen
        block.extend(b"r1\0");

        let mut record = Vec::new();
        record.extend((block.len() as u32).to_le_bytes());
        record.extend(block);
        p.feed(record);

        match p.next(false) {
            Polled::Output(RawItem::Alignment(a)) => {
                assert_eq!(a.read_name, b"r1\0");
                assert_eq!(a.flag, 4);
                assert_eq!(a.seq, Vec::<u8>::new());
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(p.next(false), Polled::NotReady);
        assert_eq!(p.next(true), Polled::EndOfStream);
    }

    #[test]
    fn rejects_non_null_terminated_read_name() {
        let mut p = RawBamParser::new();
        p.feed(header_bytes("", 0));
        assert!(matches!(p.next(false), Polled::Output(RawItem::Header(_))));
        assert_eq!(
            p.next(false),
            Polled::Output(RawItem::ReferenceInformation(vec![]))
        );

        let mut block = Vec::new();
        block.extend(0i32.to_le_bytes());
        block.extend(0i32.to_le_bytes());
        block.push(2);
        block.push(0);
        block.extend(0u16.to_le_bytes());
        block.extend(0u16.to_le_bytes());
        block.extend(0u16.to_le_bytes());
        block.extend(0u32.to_le_bytes());
        block.extend((-1i32).to_le_bytes());
        block.extend((-1i32).to_le_bytes());
        block.extend(0i32.to_le_bytes());
        block.extend(b"rx"); // no null terminator

        let mut record = Vec::new();
        record.extend((block.len() as u32).to_le_bytes());
        record.extend(block);
        p.feed(record);

        assert_eq!(
            p.next(false),
            Polled::Error(FramingError::ReadNameNotNullTerminated)
        );
    }
}

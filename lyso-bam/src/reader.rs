use std::io::{self, Read, Write};

use lyso_common::{drain_to_end, Compose, Either, Polled, Transform};

use crate::downgrade::Downgrader;
use crate::error::BamError;
use crate::expand::Expander;
use crate::inflate::{GzipDeflater, GzipInflater};
use crate::model::SamItem;
use crate::raw::RawBamParser;

const READ_CHUNK: usize = 64 * 1024;

type Pipeline = Compose<GzipInflater, Compose<RawBamParser, Expander>>;

fn pipeline_error(e: Either<crate::error::GzipError, Either<crate::error::FramingError, crate::error::ExpandError>>) -> BamError {
    match e {
        Either::Left(g) => BamError::Gzip(g),
        Either::Right(Either::Left(f)) => BamError::Framing(f),
        Either::Right(Either::Right(x)) => BamError::Expand(x),
    }
}

/// Drives a gzip-compressed BAM byte source through the full decode
/// pipeline (C2 → C3 → C7), producing [`SamItem`]s.
///
/// This is a convenience wrapper, not part of the transform contract
/// itself: callers who want to interleave their own I/O scheduling can
/// compose [`GzipInflater`], [`RawBamParser`], and [`Expander`]
/// directly.
pub struct BamReader<R> {
    inner: R,
    pipeline: Pipeline,
    source_done: bool,
}

impl<R: Read> BamReader<R> {
    pub fn new(inner: R) -> Self {
        BamReader {
            inner,
            pipeline: Compose::new(GzipInflater::new(), Compose::new(RawBamParser::new(), Expander::new())),
            source_done: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut buf = vec![0u8; READ_CHUNK];
        let n = self.inner.read(&mut buf)?;
        if n == 0 {
            self.source_done = true;
        } else {
            buf.truncate(n);
            self.pipeline.feed(buf);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for BamReader<R> {
    type Item = Result<SamItem, BamError>;

    fn next(&mut self) -> Option<Result<SamItem, BamError>> {
        loop {
            match self.pipeline.next(self.source_done) {
                Polled::Output(item) => return Some(Ok(item)),
                Polled::Error(e) => return Some(Err(pipeline_error(e))),
                Polled::EndOfStream => return None,
                Polled::NotReady => {
                    if let Err(e) = self.fill() {
                        return Some(Err(BamError::Gzip(crate::error::GzipError::Unzip(e))));
                    }
                }
            }
        }
    }
}

/// Drives a sequence of [`SamItem`]s through the full encode pipeline
/// (C7 → C3 encode → C2 compress), writing gzip-compressed BAM bytes to
/// the wrapped sink.
pub struct BamWriter<W> {
    inner: W,
    downgrader: Downgrader,
    deflater: GzipDeflater,
}

impl<W: Write> BamWriter<W> {
    pub fn new(inner: W) -> Self {
        BamWriter {
            inner,
            downgrader: Downgrader::new(),
            deflater: GzipDeflater::new(),
        }
    }

    /// Queues one SAM item for encoding. Call [`Self::finish`] once all
    /// items have been fed to flush the compressed trailer.
    pub fn write_item(&mut self, item: SamItem) -> Result<(), BamError> {
        self.downgrader.feed(item);
        self.pump(false)
    }

    fn pump(&mut self, stopped: bool) -> Result<(), BamError> {
        loop {
            match self.downgrader.next(stopped) {
                Polled::Output(raw) => {
                    self.deflater.feed(crate::raw::encode_raw_item(&raw));
                }
                Polled::Error(e) => return Err(BamError::Downgrade(e)),
                Polled::NotReady => break,
                Polled::EndOfStream => break,
            }
        }
        for result in drain_to_end(&mut self.deflater, stopped) {
            let chunk = result.map_err(BamError::Gzip)?;
            self.inner.write_all(&chunk).map_err(|e| BamError::Gzip(crate::error::GzipError::Unzip(e)))?;
        }
        Ok(())
    }

    /// Flushes any buffered items and the gzip trailer, consuming the
    /// writer and returning the wrapped sink.
    pub fn finish(mut self) -> Result<W, BamError> {
        self.pump(true)?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderLine, SortOrder};
    use crate::model::{AlignmentRecord, Flags, ReferenceRecord, ReferenceSequence, SequenceField};
    use lyso_common::Phred;

    #[test]
    fn writes_then_reads_back_a_minimal_stream() {
        let mut writer = BamWriter::new(Vec::new());
        writer
            .write_item(SamItem::Header(HeaderLine::Hd {
                version: "1.6".to_string(),
                sort_order: SortOrder::Unknown,
                extra: vec![],
            }))
            .unwrap();
        writer
            .write_item(SamItem::ReferenceSequenceDictionary(vec![ReferenceRecord {
                name: "chr1".to_string(),
                length: 100,
            }]))
            .unwrap();
        writer
            .write_item(SamItem::Alignment(AlignmentRecord {
                query_template_name: "r1".to_string(),
                flags: Flags::new(0),
                reference_sequence: ReferenceSequence::ByName("chr1".to_string()),
                position: Some(1),
                mapping_quality: Some(40),
                cigar_operations: vec![],
                next_reference_sequence: ReferenceSequence::None,
                next_position: None,
                template_length: 0,
                sequence: SequenceField::Str("ACGT".to_string()),
                quality: vec![Phred::of_raw(30); 4],
                optional_content: vec![],
            }))
            .unwrap();
        let bytes = writer.finish().unwrap();

        let reader = BamReader::new(bytes.as_slice());
        let items: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert!(items
            .iter()
            .any(|i| matches!(i, SamItem::ReferenceSequenceDictionary(_))));
        assert!(items.iter().any(|i| matches!(i, SamItem::Alignment(rec) if rec.query_template_name == "r1")));
    }
}

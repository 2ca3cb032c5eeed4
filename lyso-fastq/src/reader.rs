use std::io::{self, Read, Write};

use lyso_common::{Compose, Either, Polled, Transform};

use crate::error::FastqError;
use crate::line_split::LineSplitter;
use crate::model::FastqItem;
use crate::parser::{emit_item, FastqParser};

const READ_CHUNK: usize = 64 * 1024;

type Pipeline = Compose<LineSplitter, FastqParser>;

fn pipeline_error(e: Either<std::convert::Infallible, FastqError>) -> FastqError {
    match e {
        Either::Left(never) => match never {},
        Either::Right(err) => err,
    }
}

/// Drives a byte source through the line-splitting and record-grouping
/// transforms (§4.8/§4.9), producing [`FastqItem`]s.
///
/// A convenience wrapper, not part of the transform contract itself:
/// callers who want to interleave their own I/O scheduling can compose
/// [`LineSplitter`] and [`FastqParser`] directly.
pub struct FastqReader<R> {
    inner: R,
    pipeline: Pipeline,
    source_done: bool,
}

impl<R: Read> FastqReader<R> {
    pub fn new(inner: R) -> Self {
        FastqReader {
            inner,
            pipeline: Compose::new(LineSplitter::new(), FastqParser::new()),
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

impl<R: Read> Iterator for FastqReader<R> {
    type Item = Result<FastqItem, FastqError>;

    fn next(&mut self) -> Option<Result<FastqItem, FastqError>> {
        loop {
            match self.pipeline.next(self.source_done) {
                Polled::Output(item) => return Some(Ok(item)),
                Polled::Error(e) => return Some(Err(pipeline_error(e))),
                Polled::EndOfStream => return None,
                Polled::NotReady => {
                    if let Err(e) = self.fill() {
                        return Some(Err(FastqError::Io(e.to_string())));
                    }
                }
            }
        }
    }
}

/// Writes [`FastqItem`]s back to their four-line wire form.
pub struct FastqWriter<W> {
    inner: W,
}

impl<W: Write> FastqWriter<W> {
    pub fn new(inner: W) -> Self {
        FastqWriter { inner }
    }

    pub fn write_item(&mut self, item: &FastqItem) -> io::Result<()> {
        self.inner.write_all(emit_item(item).as_bytes())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_then_reads_back_a_stream() {
        let mut writer = FastqWriter::new(Vec::new());
        let item = FastqItem::new("SRR1.1", "ACGT", "", "FFFF");
        writer.write_item(&item).unwrap();
        let bytes = writer.into_inner();

        let reader = FastqReader::new(bytes.as_slice());
        let items: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(items, vec![item]);
    }

    #[test]
    fn reads_several_records_across_chunk_boundaries() {
        let data = b"@r1\nAC\n+\nFF\n@r2\nGT\n+\nHH\n";
        let reader = FastqReader::new(&data[..]);
        let items: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "r1");
        assert_eq!(items[1].name, "r2");
    }

    #[test]
    fn surfaces_a_malformed_record_as_an_error() {
        let data = b"not_at_sign\nAC\n+\nFF\n";
        let reader = FastqReader::new(&data[..]);
        let results: Vec<_> = reader.collect();
        assert!(matches!(results[0], Err(FastqError::MissingAt)));
    }
}

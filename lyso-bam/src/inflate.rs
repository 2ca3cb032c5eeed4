use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use lyso_common::{Polled, Transform};

use crate::error::GzipError;

const READ_CHUNK: usize = 64 * 1024;

/// Byte buffer shared between a [`GzipInflater`] and the `Read` adapter
/// it hands to `flate2`. Fed bytes accumulate here; once the
/// buffer is empty and the upstream source hasn't stopped, reads report
/// [`io::ErrorKind::WouldBlock`] rather than blocking, since the
/// inflater is driven cooperatively (`feed`/`next`) rather than by
/// owning a blocking `Read` itself.
struct SharedBuf {
    data: Vec<u8>,
    offset: usize,
    stopped: bool,
}

#[derive(Clone)]
struct SharedBufHandle(Rc<RefCell<SharedBuf>>);

impl SharedBufHandle {
    fn new() -> Self {
        SharedBufHandle(Rc::new(RefCell::new(SharedBuf {
            data: Vec::new(),
            offset: 0,
            stopped: false,
        })))
    }

    fn push(&self, chunk: &[u8]) {
        let mut inner = self.0.borrow_mut();
        inner.data.extend_from_slice(chunk);
    }

    fn mark_stopped(&self) {
        self.0.borrow_mut().stopped = true;
    }
}

impl Read for SharedBufHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.offset >= inner.data.len() {
            if inner.stopped {
                return Ok(0);
            }
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "no input buffered"));
        }
        let avail = &inner.data[inner.offset..];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        inner.offset += n;
        if inner.offset == inner.data.len() {
            inner.data.clear();
            inner.offset = 0;
        } else if inner.offset > READ_CHUNK * 4 {
            inner.data.drain(0..inner.offset);
            inner.offset = 0;
        }
        Ok(n)
    }
}

/// Decodes a BGZF stream as a sequence of concatenated gzip members
/// (C2). BGZF is, at the byte level, exactly that: independently
/// flushed gzip members back to back, each carrying a `BSIZE` extra
/// field that this crate never needs to read since decompression
/// doesn't require block boundaries to be known in advance.
pub struct GzipInflater {
    handle: SharedBufHandle,
    decoder: MultiGzDecoder<SharedBufHandle>,
    errored: bool,
}

impl Default for GzipInflater {
    fn default() -> Self {
        let handle = SharedBufHandle::new();
        let decoder = MultiGzDecoder::new(handle.clone());
        GzipInflater {
            handle,
            decoder,
            errored: false,
        }
    }
}

impl GzipInflater {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transform for GzipInflater {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = GzipError;

    fn feed(&mut self, chunk: Vec<u8>) {
        self.handle.push(&chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<Vec<u8>, GzipError> {
        if self.errored {
            return Polled::EndOfStream;
        }
        if stopped {
            self.handle.mark_stopped();
        }
        let mut buf = vec![0u8; READ_CHUNK];
        match self.decoder.read(&mut buf) {
            Ok(0) => Polled::EndOfStream,
            Ok(n) => {
                buf.truncate(n);
                Polled::Output(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Polled::NotReady,
            Err(e) => {
                self.errored = true;
                Polled::Error(GzipError::Unzip(e))
            }
        }
    }
}

/// A plain `Vec<u8>` sink shared between a [`GzipDeflater`] and the
/// `Write` handle it hands to `flate2`'s encoder; compressed bytes
/// accumulate here as they're flushed out and are drained by `next`.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compresses a byte stream into a single gzip member (C2, encode
/// direction). Each alignment-framed byte stream produced by
/// downgrading becomes one gzip member; concatenating members, as the
/// downgrader's caller may choose to do per-block, is exactly what the
/// inflater reads back.
pub struct GzipDeflater {
    sink: SharedSink,
    encoder: Option<GzEncoder<SharedSink>>,
}

impl Default for GzipDeflater {
    fn default() -> Self {
        let sink = SharedSink::default();
        let encoder = Some(GzEncoder::new(sink.clone(), Compression::default()));
        GzipDeflater { sink, encoder }
    }
}

impl GzipDeflater {
    pub fn new() -> Self {
        Self::default()
    }

    fn drain_sink(&mut self) -> Option<Vec<u8>> {
        let mut buf = self.sink.0.borrow_mut();
        if buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut buf))
        }
    }
}

impl Transform for GzipDeflater {
    type Input = Vec<u8>;
    type Output = Vec<u8>;
    type Error = GzipError;

    fn feed(&mut self, chunk: Vec<u8>) {
        if let Some(encoder) = self.encoder.as_mut() {
            // A Vec<u8>-backed Write never returns an error from write_all.
            let _ = encoder.write_all(&chunk);
        }
    }

    fn next(&mut self, stopped: bool) -> Polled<Vec<u8>, GzipError> {
        if let Some(chunk) = self.drain_sink() {
            return Polled::Output(chunk);
        }
        if stopped {
            if let Some(encoder) = self.encoder.take() {
                match encoder.finish() {
                    Ok(_) => {}
                    Err(e) => return Polled::Error(GzipError::Unzip(e)),
                }
            }
            if let Some(chunk) = self.drain_sink() {
                return Polled::Output(chunk);
            }
            return Polled::EndOfStream;
        }
        Polled::NotReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn inflates_a_single_member() {
        let plain = b"hello bam world".to_vec();
        let gz = gzip_bytes(&plain);
        let mut inflater = GzipInflater::new();
        inflater.feed(gz);
        let mut out = Vec::new();
        loop {
            match inflater.next(true) {
                Polled::Output(chunk) => out.extend(chunk),
                Polled::EndOfStream => break,
                Polled::NotReady => continue,
                Polled::Error(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(out, plain);
    }

    #[test]
    fn inflates_concatenated_members() {
        let a = b"first block ".to_vec();
        let b = b"second block".to_vec();
        let mut gz = gzip_bytes(&a);
        gz.extend(gzip_bytes(&b));
        let mut inflater = GzipInflater::new();
        inflater.feed(gz);
        let mut out = Vec::new();
        loop {
            match inflater.next(true) {
                Polled::Output(chunk) => out.extend(chunk),
                Polled::EndOfStream => break,
                Polled::NotReady => continue,
                Polled::Error(e) => panic!("unexpected error: {e}"),
            }
        }
        let mut expected = a;
        expected.extend(b);
        assert_eq!(out, expected);
    }

    #[test]
    fn reports_not_ready_before_any_input_is_fed() {
        let mut inflater = GzipInflater::new();
        assert_eq!(inflater.next(false), Polled::NotReady);
    }

    #[test]
    fn deflate_then_inflate_round_trips() {
        let plain = b"a streaming round trip through gzip".to_vec();
        let mut deflater = GzipDeflater::new();
        deflater.feed(plain.clone());
        let mut compressed = Vec::new();
        loop {
            match deflater.next(true) {
                Polled::Output(chunk) => compressed.extend(chunk),
                Polled::EndOfStream => break,
                Polled::NotReady => continue,
                Polled::Error(e) => panic!("unexpected error: {e}"),
            }
        }

        let mut inflater = GzipInflater::new();
        inflater.feed(compressed);
        let mut out = Vec::new();
        loop {
            match inflater.next(true) {
                Polled::Output(chunk) => out.extend(chunk),
                Polled::EndOfStream => break,
                Polled::NotReady => continue,
                Polled::Error(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(out, plain);
    }

    #[test]
    fn reports_error_on_garbage_input() {
        let mut inflater = GzipInflater::new();
        inflater.feed(vec![0xff; 32]);
        let result = loop {
            match inflater.next(true) {
                Polled::Error(e) => break Some(e),
                Polled::EndOfStream => break None,
                Polled::NotReady => continue,
                Polled::Output(_) => continue,
            }
        };
        assert!(result.is_some());
    }
}

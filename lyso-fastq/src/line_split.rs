use lyso_common::{Polled, Transform};

/// Splits a byte stream into text lines (§4.9 — a plumbing collaborator,
/// not part of C8 itself, grounded in the buffer/offset pattern used by
/// the BAM-side raw parser). Splits on `\n`, stripping a trailing `\r`;
/// never buffers more than the current physical line.
#[derive(Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
    offset: usize,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_line(&mut self) -> Option<String> {
        let available = &self.buf[self.offset..];
        let nl = available.iter().position(|&b| b == b'\n')?;
        let mut line = available[..nl].to_vec();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        self.offset += nl + 1;
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn compact(&mut self) {
        if self.offset > 0 {
            self.buf.drain(0..self.offset);
            self.offset = 0;
        }
    }
}

impl Transform for LineSplitter {
    type Input = Vec<u8>;
    type Output = String;
    type Error = std::convert::Infallible;

    fn feed(&mut self, chunk: Vec<u8>) {
        self.buf.extend(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<String, std::convert::Infallible> {
        if let Some(line) = self.take_line() {
            self.compact();
            return Polled::Output(line);
        }
        self.compact();
        if stopped {
            let remainder = &self.buf[self.offset..];
            if remainder.is_empty() {
                return Polled::EndOfStream;
            }
            let line = String::from_utf8_lossy(remainder).into_owned();
            self.buf.clear();
            self.offset = 0;
            return Polled::Output(line);
        }
        Polled::NotReady
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_newline_terminated_lines() {
        let mut s = LineSplitter::new();
        s.feed(b"one\ntwo\nthree\n".to_vec());
        assert_eq!(s.next(false), Polled::Output("one".to_string()));
        assert_eq!(s.next(false), Polled::Output("two".to_string()));
        assert_eq!(s.next(false), Polled::Output("three".to_string()));
        assert_eq!(s.next(false), Polled::NotReady);
        assert_eq!(s.next(true), Polled::EndOfStream);
    }

    #[test]
    fn strips_trailing_carriage_return() {
        let mut s = LineSplitter::new();
        s.feed(b"crlf\r\n".to_vec());
        assert_eq!(s.next(false), Polled::Output("crlf".to_string()));
    }

    #[test]
    fn flushes_unterminated_trailing_line_on_stop() {
        let mut s = LineSplitter::new();
        s.feed(b"partial".to_vec());
        assert_eq!(s.next(false), Polled::NotReady);
        assert_eq!(s.next(true), Polled::Output("partial".to_string()));
        assert_eq!(s.next(true), Polled::EndOfStream);
    }

    #[test]
    fn handles_a_line_arriving_across_two_chunks() {
        let mut s = LineSplitter::new();
        s.feed(b"partial_li".to_vec());
        assert_eq!(s.next(false), Polled::NotReady);
        s.feed(b"ne\n".to_vec());
        assert_eq!(s.next(false), Polled::Output("partial_line".to_string()));
    }
}

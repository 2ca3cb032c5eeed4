use std::fmt::{self, Display};

/// Result of polling a [`Transform`] once.
///
/// A transform never blocks: every call to [`Transform::next`] returns
/// immediately with one of these four outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T, E> {
    /// A fully decoded item.
    Output(T),
    /// A decode error. Per the kernel's error policy (see [`Transform`]),
    /// a transform emits an error at most once and yields `EndOfStream`
    /// on every subsequent call.
    Error(E),
    /// Not enough input has been fed yet to produce another item or an
    /// error. The caller should `feed` more input (or mark the source
    /// stopped) and poll again.
    NotReady,
    /// The transform is exhausted: either the source was marked stopped
    /// and every buffered item has been drained, or a prior call already
    /// returned an `Error`.
    EndOfStream,
}

/// A stoppable, cooperative streaming transform.
///
/// `feed` appends a chunk of input; `next` attempts to produce one
/// output item (or report an error, or report that more input is
/// needed). `stopped` is passed on every poll and becomes `true` once
/// the upstream producer has signalled its own end of stream — a
/// transform uses it to decide whether a short buffer means "wait for
/// more" (`NotReady`) or "nothing more is coming, stop here"
/// (`EndOfStream`, discarding any trailing partial record).
///
/// Transforms are not thread-safe and do not perform I/O themselves;
/// a [`Driver`] (or an equivalent polling loop) owns the actual
/// `Read`/byte source and feeds chunks in.
pub trait Transform {
    type Input;
    type Output;
    type Error;

    fn feed(&mut self, chunk: Self::Input);
    fn next(&mut self, stopped: bool) -> Polled<Self::Output, Self::Error>;
}

/// Tags which side of a composed pipeline produced an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

impl<A: Display, B: Display> Display for Either<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Either::Left(e) => write!(f, "{e}"),
            Either::Right(e) => write!(f, "{e}"),
        }
    }
}

impl<A: std::error::Error + 'static, B: std::error::Error + 'static> std::error::Error
    for Either<A, B>
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Either::Left(e) => Some(e),
            Either::Right(e) => Some(e),
        }
    }
}

/// Composes two transforms left-to-right: `Right`'s input stream is
/// `Left`'s output stream. A single byte chunk fed into the pair may
/// flow through zero, one, or many items out of `Left` before `Right`
/// has anything to say, so `next` drains `Left` internally whenever
/// `Right` reports `NotReady`.
pub struct Compose<L, R> {
    left: L,
    right: R,
    /// `true` once `left` has reported its own `EndOfStream`; once set,
    /// `right` is polled with `stopped = true` regardless of what the
    /// caller passes in, since nothing more will ever arrive from `left`.
    left_done: bool,
}

impl<L, R> Compose<L, R>
where
    L: Transform,
    R: Transform<Input = L::Output>,
{
    pub fn new(left: L, right: R) -> Self {
        Compose {
            left,
            right,
            left_done: false,
        }
    }

    pub fn into_inner(self) -> (L, R) {
        (self.left, self.right)
    }
}

impl<L, R> Transform for Compose<L, R>
where
    L: Transform,
    R: Transform<Input = L::Output>,
{
    type Input = L::Input;
    type Output = R::Output;
    type Error = Either<L::Error, R::Error>;

    fn feed(&mut self, chunk: Self::Input) {
        self.left.feed(chunk);
    }

    fn next(&mut self, stopped: bool) -> Polled<Self::Output, Self::Error> {
        loop {
            match self.right.next(stopped || self.left_done) {
                Polled::Output(v) => return Polled::Output(v),
                Polled::Error(e) => return Polled::Error(Either::Right(e)),
                Polled::EndOfStream => return Polled::EndOfStream,
                Polled::NotReady => {
                    if self.left_done {
                        // left has nothing left to give and right still
                        // isn't ready: right's own buffering decides this
                        // is as done as it gets.
                        return Polled::NotReady;
                    }
                    match self.left.next(stopped) {
                        Polled::Output(v) => {
                            self.right.feed(v);
                            continue;
                        }
                        Polled::Error(e) => return Polled::Error(Either::Left(e)),
                        Polled::NotReady => return Polled::NotReady,
                        Polled::EndOfStream => {
                            self.left_done = true;
                            continue;
                        }
                    }
                }
            }
        }
    }
}

/// Drives a byte source through a transform to completion, collecting
/// every output or the first error. `read_chunk` should return `Ok(0)`
/// (or an empty slice) on a genuine end of input; the driver then marks
/// the transform stopped and drains it to `EndOfStream`.
///
/// This is a convenience for callers (the CLI, tests) that don't want
/// to hand-write the feed/poll loop; it is not part of the transform
/// contract itself.
pub fn drain_to_end<T>(transform: &mut T, stopped: bool) -> Vec<Result<T::Output, T::Error>>
where
    T: Transform,
{
    let mut out = Vec::new();
    loop {
        match transform.next(stopped) {
            Polled::Output(v) => out.push(Ok(v)),
            Polled::Error(e) => {
                out.push(Err(e));
                break;
            }
            Polled::NotReady => break,
            Polled::EndOfStream => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits a byte stream into fixed-size chunks, used only to
    /// exercise `Compose`'s draining loop in tests.
    struct Chunker {
        buf: Vec<u8>,
        size: usize,
    }

    impl Transform for Chunker {
        type Input = Vec<u8>;
        type Output = Vec<u8>;
        type Error = ();

        fn feed(&mut self, chunk: Vec<u8>) {
            self.buf.extend(chunk);
        }

        fn next(&mut self, stopped: bool) -> Polled<Vec<u8>, ()> {
            if self.buf.len() >= self.size {
                let rest = self.buf.split_off(self.size);
                let out = std::mem::replace(&mut self.buf, rest);
                return Polled::Output(out);
            }
            if stopped {
                if self.buf.is_empty() {
                    return Polled::EndOfStream;
                }
                let out = std::mem::take(&mut self.buf);
                return Polled::Output(out);
            }
            Polled::NotReady
        }
    }

    /// Counts bytes that pass through it, used only to exercise
    /// `Compose`.
    struct Counter {
        total: usize,
        chunks: Vec<Vec<u8>>,
        idx: usize,
    }

    impl Transform for Counter {
        type Input = Vec<u8>;
        type Output = usize;
        type Error = ();

        fn feed(&mut self, chunk: Vec<u8>) {
            self.total += chunk.len();
            self.chunks.push(chunk);
        }

        fn next(&mut self, stopped: bool) -> Polled<usize, ()> {
            if self.idx < self.chunks.len() {
                let n = self.chunks[self.idx].len();
                self.idx += 1;
                return Polled::Output(n);
            }
            if stopped {
                return Polled::EndOfStream;
            }
            Polled::NotReady
        }
    }

    #[test]
    fn compose_drains_left_before_reporting_not_ready() {
        let left = Chunker {
            buf: Vec::new(),
            size: 3,
        };
        let right = Counter {
            total: 0,
            chunks: Vec::new(),
            idx: 0,
        };
        let mut pipeline = Compose::new(left, right);
        pipeline.feed(b"abcdef".to_vec());
        let out = drain_to_end(&mut pipeline, true);
        let lens: Vec<usize> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(lens, vec![3, 3]);
    }

    #[test]
    fn compose_propagates_not_ready_when_starved() {
        let left = Chunker {
            buf: Vec::new(),
            size: 100,
        };
        let right = Counter {
            total: 0,
            chunks: Vec::new(),
            idx: 0,
        };
        let mut pipeline = Compose::new(left, right);
        pipeline.feed(b"abc".to_vec());
        assert_eq!(pipeline.next(false), Polled::NotReady);
    }
}

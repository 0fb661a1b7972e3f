//! Lazy line source over any `BufRead`.
//!
//! Lines are yielded as raw bytes so one invalid UTF-8 line becomes a
//! per-record error instead of ending the stream.

use std::io::{self, BufRead};

/// One input line, without its terminator. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub bytes: Vec<u8>,
}

/// Iterator over the lines of a reader. Only real I/O failures are errors.
pub struct LineReader<R> {
    inner: R,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: 0 }
    }

    /// Lines yielded so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = Vec::new();
        match self.inner.read_until(b'\n', &mut bytes) {
            Ok(0) => None,
            Ok(_) => {
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                    if bytes.last() == Some(&b'\r') {
                        bytes.pop();
                    }
                }
                self.line += 1;
                Some(Ok(RawLine {
                    number: self.line,
                    bytes,
                }))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

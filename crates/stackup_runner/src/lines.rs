//! Line-by-line reading of child process streams.

use std::io::{self, BufRead, BufReader, Read};
use std::iter::FusedIterator;

/// Lazy sequence of text lines read from a stream.
///
/// The sequence ends when the stream is closed (a zero-byte read) or after
/// the first read error, and cannot be restarted. Line terminators (`\n` and
/// `\r\n`) are stripped; bytes that are not valid UTF-8 are replaced.
pub struct StreamLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> StreamLines<R> {
    pub fn new(stream: R) -> Self {
        Self {
            reader: BufReader::new(stream),
            buf: Vec::new(),
            finished: false,
        }
    }
}

impl<R: Read> Iterator for StreamLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for StreamLines<R> {}

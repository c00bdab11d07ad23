//! Byte progress reporting for the raw input stream.

use std::io::Read;

/// Minimum number of newly read bytes between two callback invocations.
const REPORT_GRANULARITY: u64 = 64 * 1024;

/// Reader wrapper reporting the number of compressed/raw input bytes
/// consumed so far.
///
/// It sits below any decompressor, so the reported position can be compared
/// against the file size on disk.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
    last_reported: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
            last_reported: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        // Always report end of input
        if n == 0 || self.bytes_read - self.last_reported >= REPORT_GRANULARITY {
            self.last_reported = self.bytes_read;
            (self.callback)(self.bytes_read);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_reports_final_position() {
        let data = vec![b'x'; 200 * 1024];
        let seen = Rc::new(Cell::new(0u64));
        let sink = Rc::clone(&seen);
        let mut reader = ProgressReader::new(&data[..], move |n| sink.set(n));

        std::io::copy(&mut reader, &mut std::io::sink()).unwrap();

        assert_eq!(reader.bytes_read(), data.len() as u64);
        assert_eq!(seen.get(), data.len() as u64);
    }
}

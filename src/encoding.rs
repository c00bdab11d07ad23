//! Input text encoding resolution.
//!
//! Dumps arrive in whatever encoding the exporting tool happened to use. The
//! resolver tries a forced label first, then a single-byte default that can
//! decode any byte sequence, and finally falls back to sniffing byte patterns.
//! [`DecodingReader`] turns the raw byte stream into UTF-8 for the statement
//! reader.

use crate::error::ExtractError;
use encoding_rs::{DecoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info};

/// Default decoding: the WHATWG mapping of `iso-8859-1`.
pub static DEFAULT_ENCODING: &Encoding = &encoding_rs::WINDOWS_1252_INIT;

/// Bytes inspected by the sniffer.
pub const SNIFF_SAMPLE_SIZE: usize = 1024 * 1024;

const DECODE_INPUT_SIZE: usize = 64 * 1024;
const DECODE_OUTPUT_SIZE: usize = 3 * DECODE_INPUT_SIZE + 16;

/// Look up an encoding by any WHATWG label (`latin1`, `utf-8`, `cp1251`, ...).
pub fn lookup_encoding(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Determine the encoding used for the remainder of a file's processing.
///
/// `open` must return a fresh reader positioned at the start of the
/// (decompressed) input each time it is called.
pub fn resolve_encoding<F>(
    path: &Path,
    forced: Option<&str>,
    default: &'static Encoding,
    open: F,
) -> Result<&'static Encoding, ExtractError>
where
    F: Fn() -> io::Result<Box<dyn Read>>,
{
    if let Some(label) = forced {
        let encoding = lookup_encoding(label).ok_or_else(|| ExtractError::EncodingUndetermined {
            path: path.to_path_buf(),
            detail: format!("unknown encoding '{}'", label),
        })?;
        // Rejected before any output is opened
        return match validate(open()?, encoding) {
            Ok(()) => {
                info!(file = %path.display(), encoding = encoding.name(), "using forced encoding");
                Ok(encoding)
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(ExtractError::EncodingUndetermined {
                    path: path.to_path_buf(),
                    detail: format!("input is not valid {}", encoding.name()),
                })
            }
            Err(e) => Err(e.into()),
        };
    }

    match validate(open()?, default) {
        Ok(()) => {
            info!(file = %path.display(), encoding = default.name(), "using default encoding");
            return Ok(default);
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            debug!(file = %path.display(), error = %e, "default encoding rejected, sniffing");
        }
        Err(e) => return Err(e.into()),
    }

    let sample = read_sample(open()?, SNIFF_SAMPLE_SIZE)?;
    let sniffed = sniff_encoding(&sample);
    if sniffed == default {
        return Err(ExtractError::EncodingUndetermined {
            path: path.to_path_buf(),
            detail: format!("input is not valid {}", default.name()),
        });
    }

    match validate(open()?, sniffed) {
        Ok(()) => {
            info!(file = %path.display(), encoding = sniffed.name(), "using detected encoding");
            Ok(sniffed)
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            Err(ExtractError::EncodingUndetermined {
                path: path.to_path_buf(),
                detail: format!(
                    "input is neither valid {} nor valid {}",
                    default.name(),
                    sniffed.name()
                ),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Guess an encoding from byte patterns: BOM, UTF-16 NUL layout, UTF-8
/// validity, else single-byte.
pub fn sniff_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    if let Some(encoding) = sniff_utf16(sample) {
        return encoding;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => UTF_8,
        // Sample cut in the middle of a multi-byte sequence
        Err(e) if e.error_len().is_none() => UTF_8,
        Err(_) => WINDOWS_1252,
    }
}

fn sniff_utf16(sample: &[u8]) -> Option<&'static Encoding> {
    let pairs = sample.len() / 2;
    if pairs < 2 {
        return None;
    }

    let mut even_zeros = 0usize;
    let mut odd_zeros = 0usize;
    for pair in sample.chunks_exact(2) {
        if pair[0] == 0 {
            even_zeros += 1;
        }
        if pair[1] == 0 {
            odd_zeros += 1;
        }
    }

    // Mostly-ASCII UTF-16 text has a NUL in every other byte
    let threshold = pairs * 3 / 10;
    if odd_zeros > threshold && even_zeros == 0 {
        Some(UTF_16LE)
    } else if even_zeros > threshold && odd_zeros == 0 {
        Some(UTF_16BE)
    } else {
        None
    }
}

fn validate(reader: Box<dyn Read>, encoding: &'static Encoding) -> io::Result<()> {
    let mut decoder = DecodingReader::new(reader, encoding);
    io::copy(&mut decoder, &mut io::sink())?;
    Ok(())
}

fn read_sample(reader: Box<dyn Read>, limit: usize) -> io::Result<Vec<u8>> {
    let mut sample = Vec::with_capacity(limit.min(DECODE_INPUT_SIZE));
    reader.take(limit as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

/// A reader that transcodes its input from `encoding` to UTF-8.
///
/// Malformed input surfaces as an `InvalidData` I/O error; no replacement
/// characters are ever produced.
pub struct DecodingReader<R: Read> {
    inner: R,
    encoding: &'static Encoding,
    decoder: encoding_rs::Decoder,
    input: Vec<u8>,
    input_pos: usize,
    input_len: usize,
    output: Vec<u8>,
    output_pos: usize,
    output_len: usize,
    input_done: bool,
    finished: bool,
    decoded_bytes: u64,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            decoder: encoding.new_decoder_with_bom_removal(),
            input: vec![0; DECODE_INPUT_SIZE],
            input_pos: 0,
            input_len: 0,
            output: vec![0; DECODE_OUTPUT_SIZE],
            output_pos: 0,
            output_len: 0,
            input_done: false,
            finished: false,
            decoded_bytes: 0,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        if self.input_pos == self.input_len && !self.input_done {
            self.input_len = self.inner.read(&mut self.input)?;
            self.input_pos = 0;
            if self.input_len == 0 {
                self.input_done = true;
            }
        }

        let src = &self.input[self.input_pos..self.input_len];
        let (result, read, written) =
            self.decoder
                .decode_to_utf8_without_replacement(src, &mut self.output, self.input_done);
        self.input_pos += read;
        self.output_pos = 0;
        self.output_len = written;

        match result {
            DecoderResult::Malformed(_, _) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "malformed {} sequence near byte {}",
                    self.encoding.name(),
                    self.decoded_bytes + self.input_pos as u64
                ),
            )),
            DecoderResult::InputEmpty => {
                if self.input_done {
                    self.finished = true;
                }
                self.decoded_bytes += self.input_len as u64;
                Ok(())
            }
            DecoderResult::OutputFull => Ok(()),
        }
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.output_pos < self.output_len {
                let n = (self.output_len - self.output_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.output[self.output_pos..self.output_pos + n]);
                self.output_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.fill_output()?;
        }
    }
}

//! Compression contexts for the permessage-deflate extension ([RFC 7692](https://datatracker.ietf.org/doc/html/rfc7692)).
//!
//! Each direction of a connection owns one context: the [`FrameEncoder`](crate::encoder::FrameEncoder)
//! owns a [`Compressor`] and the [`FrameDecoder`](crate::decoder::FrameDecoder) owns a
//! [`Decompressor`]. Unless no context takeover was negotiated, the LZ77 window survives from
//! one message to the next, so message *N+1* may reference bytes of message *N*.
use std::{fmt, io, str::FromStr};

use flate2::{CompressError, DecompressError, FlushCompress, FlushDecompress, Status};
use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space0},
    combinator::opt,
    sequence::{pair, preceded},
    IResult, Parser,
};

use crate::{
    options::{CompressionLevel, DeflateOptions},
    payload::{PayloadEncoder, Produced},
    Result, WebSocketError,
};

static PERMESSAGE_DEFLATE: &str = "permessage-deflate";

/// Empty stored block terminating every flushed message, removed on the wire.
pub(crate) const TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// Size of the uncompressed staging buffer of a [`Compressor`].
const INPUT_CHUNK: usize = 4096;
/// Size of the decompressed staging buffer of a [`Decompressor`].
const OUTPUT_CHUNK: usize = 8192;

pub(crate) const MIN_WINDOW_BITS: u8 = 8;
pub(crate) const MAX_WINDOW_BITS: u8 = 15;

/// Checks a negotiated window size.
pub(crate) fn check_window_bits(bits: u8) -> Result<u8> {
    if (MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        Ok(bits)
    } else {
        Err(WebSocketError::InvalidWindowBits(bits))
    }
}

/// Growth step of the flush buffer of a [`Compressor`].
const FLUSH_CHUNK: usize = 512;

/// Where the compressor is within the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Compressing bytes pulled from the payload.
    Input,
    /// The message was flushed; copying out the tail.
    Drain,
}

/// Streaming compressor for outgoing messages.
///
/// The compressor sits between a message's [`PayloadEncoder`] and the output buffer: it pulls
/// uncompressed bytes from the payload and deflates them straight into the space the frame
/// encoder reserved after the header. Once the payload is exhausted the stream is
/// sync-flushed into an internal tail, which loses its `00 00 ff ff` trailer before being
/// copied out.
pub struct Compressor {
    compress: flate2::Compress,
    context_takeover: bool,
    stage: Stage,
    input: Vec<u8>,
    input_pos: usize,
    input_done: bool,
    tail: Vec<u8>,
    tail_pos: usize,
}

impl Compressor {
    /// Creates a compressor that keeps its window across messages.
    pub fn new(level: CompressionLevel) -> Self {
        Self::with_compress(flate2::Compress::new(level, false), true)
    }

    /// Creates a compressor that resets its window after every message.
    pub fn no_context_takeover(level: CompressionLevel) -> Self {
        Self::with_compress(flate2::Compress::new(level, false), false)
    }

    /// Creates a compressor with a specific LZ77 window size.
    ///
    /// zlib cannot produce raw deflate streams with an 8 bit window; 9 bits are used instead.
    #[cfg(feature = "zlib")]
    pub fn new_with_window_bits(
        level: CompressionLevel,
        window_bits: u8,
        context_takeover: bool,
    ) -> Result<Self> {
        let window_bits = check_window_bits(window_bits)?.max(9);
        Ok(Self::with_compress(
            flate2::Compress::new_with_window_bits(level, false, window_bits),
            context_takeover,
        ))
    }

    fn with_compress(compress: flate2::Compress, context_takeover: bool) -> Self {
        Self {
            compress,
            context_takeover,
            stage: Stage::Input,
            input: Vec::with_capacity(INPUT_CHUNK),
            input_pos: 0,
            input_done: false,
            tail: Vec::new(),
            tail_pos: 0,
        }
    }

    /// Compresses the next part of the message produced by `source` into `dst`.
    ///
    /// Returns [`Produced::Done`] once the whole message, minus the trailer, has been written.
    pub fn fill<E>(&mut self, source: &mut E, dst: &mut [u8]) -> Result<Produced>
    where
        E: PayloadEncoder + ?Sized,
    {
        let mut n = 0;

        loop {
            match self.stage {
                Stage::Input => {
                    if n == dst.len() {
                        break;
                    }

                    if self.input_pos == self.input.len() {
                        if self.input_done {
                            self.flush()?;
                            self.stage = Stage::Drain;
                            continue;
                        }

                        self.input.resize(INPUT_CHUNK, 0);
                        let produced = source.encode(&mut self.input)?;
                        self.input.truncate(produced.written());
                        self.input_pos = 0;
                        self.input_done = produced.is_done();

                        if produced == Produced::Partial(0) {
                            break;
                        }
                        continue;
                    }

                    let (consumed, written) = compress(
                        &mut self.compress,
                        &self.input[self.input_pos..],
                        &mut dst[n..],
                        FlushCompress::None,
                    )?;
                    self.input_pos += consumed;
                    n += written;

                    if consumed == 0 && written == 0 {
                        break;
                    }
                }
                Stage::Drain => {
                    let len = (self.tail.len() - self.tail_pos).min(dst.len() - n);
                    dst[n..n + len].copy_from_slice(&self.tail[self.tail_pos..self.tail_pos + len]);
                    self.tail_pos += len;
                    n += len;

                    if self.tail_pos == self.tail.len() {
                        self.end_message();
                        return Ok(Produced::Done(n));
                    }
                    break;
                }
            }
        }

        Ok(Produced::Partial(n))
    }

    /// Sync-flushes the stream into the tail and drops the trailer.
    ///
    /// The flush goes to a buffer of its own so the stream does not depend on how the caller
    /// sizes its output.
    fn flush(&mut self) -> Result<()> {
        self.tail.clear();
        self.tail_pos = 0;

        loop {
            self.tail.reserve(FLUSH_CHUNK);
            let space = self.tail.capacity() - self.tail.len();
            let before = self.compress.total_out();

            self.compress
                .compress_vec(&[], &mut self.tail, FlushCompress::Sync)
                .map_err(deflate_error)?;

            if ((self.compress.total_out() - before) as usize) < space {
                break;
            }
        }

        if self.tail.ends_with(&TRAILER) {
            self.tail.truncate(self.tail.len() - TRAILER.len());
        }

        Ok(())
    }

    fn end_message(&mut self) {
        self.stage = Stage::Input;
        self.input.clear();
        self.input_pos = 0;
        self.input_done = false;
        self.tail.clear();
        self.tail_pos = 0;

        if !self.context_takeover {
            #[cfg(feature = "logging")]
            log::trace!("resetting compression context");

            self.compress.reset();
        }
    }
}

/// Runs the compressor once, returning the bytes consumed and written.
fn compress(
    compress: &mut flate2::Compress,
    input: &[u8],
    output: &mut [u8],
    flush: FlushCompress,
) -> Result<(usize, usize)> {
    let before_in = compress.total_in();
    let before_out = compress.total_out();

    compress
        .compress(input, output, flush)
        .map_err(deflate_error)?;

    let consumed = (compress.total_in() - before_in) as usize;
    let written = (compress.total_out() - before_out) as usize;

    Ok((consumed, written))
}

/// Streaming decompressor for incoming messages.
///
/// Payload bytes are inflated as they arrive and the output is handed to a sink in chunks;
/// nothing of the compressed message is buffered beyond what `flate2` keeps in its window.
pub struct Decompressor {
    decompress: flate2::Decompress,
    context_takeover: bool,
    output: Box<[u8]>,
    /// The peer closed the deflate stream with a final block.
    ended: bool,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::with_decompress(flate2::Decompress::new(false), true)
    }
}

impl Decompressor {
    /// Creates a decompressor that keeps its window across messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decompressor that resets its window after every message.
    pub fn no_context_takeover() -> Self {
        Self::with_decompress(flate2::Decompress::new(false), false)
    }

    /// Creates a decompressor with a specific LZ77 window size.
    #[cfg(feature = "zlib")]
    pub fn new_with_window_bits(window_bits: u8, context_takeover: bool) -> Result<Self> {
        let window_bits = check_window_bits(window_bits)?.max(9);
        Ok(Self::with_decompress(
            flate2::Decompress::new_with_window_bits(false, window_bits),
            context_takeover,
        ))
    }

    fn with_decompress(decompress: flate2::Decompress, context_takeover: bool) -> Self {
        Self {
            decompress,
            context_takeover,
            output: vec![0; OUTPUT_CHUNK].into_boxed_slice(),
            ended: false,
        }
    }

    /// Inflates `input`, passing the decompressed bytes to `sink`.
    pub fn decompress<F>(&mut self, input: &[u8], mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut input = input;

        while !self.ended {
            let before_in = self.decompress.total_in();
            let before_out = self.decompress.total_out();

            let status = self
                .decompress
                .decompress(input, &mut self.output, FlushDecompress::None)
                .map_err(inflate_error)?;

            let consumed = (self.decompress.total_in() - before_in) as usize;
            let produced = (self.decompress.total_out() - before_out) as usize;
            input = &input[consumed..];

            if produced > 0 {
                sink(&self.output[..produced])?;
            }

            if status == Status::StreamEnd {
                self.ended = true;
            } else if input.is_empty() && produced < self.output.len() {
                break;
            } else if consumed == 0 && produced == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "corrupt deflate stream",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Completes a message: appends the trailer removed by the sender and flushes the output.
    pub fn finish<F>(&mut self, sink: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        // Add the required 4-byte suffix as per RFC 7692, Section 7.2.2
        self.decompress(&TRAILER, sink)?;

        if !self.context_takeover || self.ended {
            #[cfg(feature = "logging")]
            log::trace!("resetting decompression context");

            self.decompress.reset(false);
            self.ended = false;
        }

        Ok(())
    }
}

fn deflate_error(err: CompressError) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("Compression error: {}", err),
    )
}

fn inflate_error(err: DecompressError) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("Decompression error: {}", err),
    )
}

impl fmt::Display for DeflateOptions {
    /// Formats the options as a `Sec-WebSocket-Extensions` value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PERMESSAGE_DEFLATE)?;

        if let Some(server_max_window_bits) = self.server_max_window_bits {
            write!(f, "; server_max_window_bits={}", server_max_window_bits)?;
        }
        if let Some(client_max_window_bits) = self.client_max_window_bits {
            write!(f, "; client_max_window_bits={}", client_max_window_bits)?;
        }
        if self.server_no_context_takeover {
            write!(f, "; server_no_context_takeover")?;
        }
        if self.client_no_context_takeover {
            write!(f, "; client_no_context_takeover")?;
        }

        Ok(())
    }
}

/// Parses the parameters of an already negotiated permessage-deflate extension, such as the
/// `Sec-WebSocket-Extensions` value of a handshake response.
///
/// A bare `client_max_window_bits` (a client offering support without a value) leaves the
/// window size unset. The compression level is not part of the extension and stays at its
/// default.
impl FromStr for DeflateOptions {
    type Err = WebSocketError;

    fn from_str(input: &str) -> Result<Self> {
        let (mut input, _) = tag::<_, _, nom::error::Error<&str>>(PERMESSAGE_DEFLATE)
            .parse(input.trim())
            .map_err(|err| WebSocketError::InvalidExtension(err.to_string()))?;

        let mut options = Self::default();
        while !input.is_empty() {
            let (remaining, (key, value)) = parse_param(input)
                .map_err(|err| WebSocketError::InvalidExtension(err.to_string()))?;

            let bits = value.map(|value| value.parse::<u8>()).transpose();
            let bits = bits.map_err(|_| WebSocketError::InvalidExtension(key.to_owned()))?;

            match (key, bits) {
                ("client_no_context_takeover", None) => options.client_no_context_takeover = true,
                ("server_no_context_takeover", None) => options.server_no_context_takeover = true,
                ("server_max_window_bits", Some(bits)) => {
                    options.server_max_window_bits = Some(check_window_bits(bits)?);
                }
                ("client_max_window_bits", bits) => {
                    options.client_max_window_bits = bits.map(check_window_bits).transpose()?;
                }
                _ => return Err(WebSocketError::InvalidExtension(key.to_owned())),
            }

            input = remaining.trim_end();
        }

        Ok(options)
    }
}

/// Parses one `; key[=value]` parameter.
fn parse_param(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    preceded(
        (space0, tag(";"), space0),
        pair(
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            opt(preceded(tag("="), digit1)),
        ),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::BytesEncoder;

    fn compress_all(compressor: &mut Compressor, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut source = BytesEncoder::new(data.to_vec());
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let produced = compressor.fill(&mut source, &mut buf).unwrap();
            out.extend_from_slice(&buf[..produced.written()]);
            if produced.is_done() {
                break out;
            }
        }
    }

    fn decompress_all(decompressor: &mut Decompressor, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        decompressor
            .decompress(data, |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            })
            .unwrap();
        decompressor
            .finish(|chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_parse_extensions() {
        let options: DeflateOptions = "permessage-deflate; client_no_context_takeover; server_max_window_bits=10; client_max_window_bits=12; server_no_context_takeover".parse().unwrap();
        assert!(options.client_no_context_takeover);
        assert!(options.server_no_context_takeover);
        assert_eq!(options.server_max_window_bits, Some(10));
        assert_eq!(options.client_max_window_bits, Some(12));
    }

    #[test]
    fn test_parse_bare_client_window_bits() {
        let options: DeflateOptions = "permessage-deflate; client_max_window_bits".parse().unwrap();
        assert_eq!(options.client_max_window_bits, None);
    }

    #[test]
    fn test_parse_extensions_fail() {
        for input in [
            "permessage-deflate; client_max_window_bits=",
            "foo, bar; baz=1",
            "permessage-deflate; client_no_context_takeover server_max_window_bits=7",
            "permessage-deflate; server_max_window_bits=; client_no_context_takeover",
            "permessage-deflate; server_max_window_bits=7",
            "permessage-deflate; server_max_window_bits",
            "permessage-deflate; server_no_context_takeover=1",
            "permessage-deflate; unknown",
        ] {
            assert!(input.parse::<DeflateOptions>().is_err(), "{input}");
        }
    }

    #[test]
    fn test_display_parses_back() {
        let options = DeflateOptions {
            server_max_window_bits: Some(11),
            client_no_context_takeover: true,
            ..Default::default()
        };
        let formatted = options.to_string();
        assert_eq!(
            formatted,
            "permessage-deflate; server_max_window_bits=11; client_no_context_takeover"
        );
        assert_eq!(formatted.parse::<DeflateOptions>().unwrap(), options);
    }

    #[test]
    fn test_compress_strips_trailer() {
        let mut compressor = Compressor::new(CompressionLevel::default());
        let compressed = compress_all(&mut compressor, b"Hello", 1024);
        assert!(!compressed.ends_with(&TRAILER));

        let mut decompressor = Decompressor::new();
        assert_eq!(decompress_all(&mut decompressor, &compressed), b"Hello");
    }

    #[test]
    fn test_compress_empty_message() {
        let mut compressor = Compressor::new(CompressionLevel::default());
        let compressed = compress_all(&mut compressor, b"", 1024);
        assert!(!compressed.is_empty());
        assert!(!compressed.ends_with(&TRAILER));

        let mut decompressor = Decompressor::new();
        assert!(decompress_all(&mut decompressor, &compressed).is_empty());
    }

    #[test]
    fn test_compress_is_chunk_invariant() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let whole = compress_all(&mut Compressor::new(CompressionLevel::default()), &data, 1 << 16);

        for chunk in [5, 7, 64, 1000] {
            let mut compressor = Compressor::new(CompressionLevel::default());
            assert_eq!(compress_all(&mut compressor, &data, chunk), whole, "{chunk}");
        }
    }

    #[test]
    fn test_context_takeover() {
        let mut compressor = Compressor::new(CompressionLevel::default());
        let mut decompressor = Decompressor::new();

        let first = compress_all(&mut compressor, b"Hello", 1024);
        let second = compress_all(&mut compressor, b"Hello", 1024);
        assert!(second.len() < first.len());

        assert_eq!(decompress_all(&mut decompressor, &first), b"Hello");
        assert_eq!(decompress_all(&mut decompressor, &second), b"Hello");
    }

    #[test]
    fn test_no_context_takeover() {
        let mut compressor = Compressor::no_context_takeover(CompressionLevel::default());

        let first = compress_all(&mut compressor, b"Hello", 1024);
        let second = compress_all(&mut compressor, b"Hello", 1024);
        assert_eq!(first, second);

        // every message stands alone
        let mut decompressor = Decompressor::no_context_takeover();
        assert_eq!(decompress_all(&mut decompressor, &second), b"Hello");
        assert_eq!(decompress_all(&mut decompressor, &first), b"Hello");
    }

    #[test]
    fn test_rfc7692_vectors() {
        let mut decompressor = Decompressor::new();
        assert_eq!(
            decompress_all(&mut decompressor, &[0xf2, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00]),
            b"Hello"
        );
        assert_eq!(
            decompress_all(&mut decompressor, &[0xf2, 0x00, 0x11, 0x00, 0x00]),
            b"Hello"
        );
    }

    #[test]
    fn test_decompress_final_block() {
        // BFINAL set on a fixed-huffman block: "Hello", then the appended trailer is ignored
        let mut decompressor = Decompressor::new();
        assert_eq!(
            decompress_all(&mut decompressor, &[0xf3, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00]),
            b"Hello"
        );
        // the context was reset, so a fresh stream decodes
        assert_eq!(
            decompress_all(&mut decompressor, &[0xf2, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00]),
            b"Hello"
        );
    }

    #[test]
    fn test_decompress_corrupt() {
        let mut decompressor = Decompressor::new();
        let res = decompressor.decompress(&[0xff, 0xff, 0xff, 0xff], |_| Ok(()));
        assert!(matches!(res, Err(WebSocketError::IoError(_))));
    }
}

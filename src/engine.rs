//! A loop that pushes frames through an encoder and a decoder over one bounded buffer.
//!
//! [`Engine::transcode`] alternates between the two halves: the encoder writes into the free
//! end of the buffer, at most `write_chunk` bytes per call, and the decoder reads from the
//! filled end, at most `read_chunk` bytes per call. Small chunk sizes make messages straddle
//! many calls on both sides, which is how the suspension points of the codecs get exercised.
use std::iter::Peekable;

use crate::{
    buffer::{Input, Output},
    decoder::{Decode, FrameDecoder},
    encoder::{Encode, FrameEncoder},
    frame::Frame,
    payload::{BytesPayload, DecodePayload, EncodePayload, PayloadDecoder},
    Result,
};

/// Drives a [`FrameEncoder`] into a [`FrameDecoder`].
///
/// ```rust
/// use wsframe::{decoder::FrameDecoder, encoder::FrameEncoder, engine::Engine, Frame, Options, Role};
///
/// let options = Options::default();
/// let encoder = FrameEncoder::new(Role::Client, &options)?;
/// let decoder = FrameDecoder::new(Role::Server, &options)?;
///
/// let mut engine = Engine::new(encoder, decoder, 16).with_read_chunk(3);
/// let frames = engine.transcode([Frame::text("Hello, world!"), Frame::binary("bye")])?;
/// assert_eq!(frames, [Frame::text("Hello, world!"), Frame::binary("bye")]);
/// # Ok::<(), wsframe::WebSocketError>(())
/// ```
pub struct Engine<P: DecodePayload = BytesPayload> {
    encoder: FrameEncoder,
    decoder: FrameDecoder<P>,
    buf: Box<[u8]>,
    /// Start of the bytes waiting to be decoded.
    start: usize,
    /// End of the bytes waiting to be decoded.
    end: usize,
    write_chunk: usize,
    read_chunk: usize,
}

impl<P: DecodePayload> Engine<P> {
    /// Creates an engine over a buffer of `capacity` bytes, read and written whole.
    pub fn new(encoder: FrameEncoder, decoder: FrameDecoder<P>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            encoder,
            decoder,
            buf: vec![0; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
            write_chunk: capacity,
            read_chunk: capacity,
        }
    }

    /// Limits how many bytes the encoder may write per call.
    pub fn with_write_chunk(self, size: usize) -> Self {
        Self {
            write_chunk: size.clamp(1, self.buf.len()),
            ..self
        }
    }

    /// Limits how many bytes the decoder may read per call.
    pub fn with_read_chunk(self, size: usize) -> Self {
        Self {
            read_chunk: size.max(1),
            ..self
        }
    }

    pub fn encoder(&self) -> &FrameEncoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &FrameDecoder<P> {
        &self.decoder
    }

    /// Encodes `frames` in order and returns everything decoded from the resulting stream,
    /// which is marked as ended once the last frame was written.
    pub fn transcode<T, I>(
        &mut self,
        frames: I,
    ) -> Result<Vec<Frame<<P::Decoder as PayloadDecoder>::Output>>>
    where
        T: EncodePayload,
        I: IntoIterator<Item = Frame<T>>,
    {
        let mut frames = frames.into_iter().peekable();
        let mut decoded = Vec::new();

        loop {
            self.write(&mut frames)?;

            let finished = self.encoder.is_idle() && frames.peek().is_none();
            let len = (self.end - self.start).min(self.read_chunk);
            let last = finished && len == self.end - self.start;

            let mut input = Input::new(&mut self.buf[self.start..self.start + len], last);
            loop {
                match self.decoder.decode(&mut input)? {
                    Decode::Frame(frame) => decoded.push(frame),
                    Decode::Fragment(_) => {}
                    Decode::Pending => break,
                }
            }
            self.start += input.position();

            if last {
                return Ok(decoded);
            }
        }
    }

    /// Lets the encoder write one chunk, if there is room for it.
    fn write<T, I>(&mut self, frames: &mut Peekable<I>) -> Result<()>
    where
        T: EncodePayload,
        I: Iterator<Item = Frame<T>>,
    {
        if self.encoder.is_idle() && frames.peek().is_none() {
            return Ok(());
        }

        if self.buf.len() - self.end < self.write_chunk {
            self.compact();
        }
        // a partial chunk would make the encoder report a buffer that is too small
        if self.buf.len() - self.end < self.write_chunk {
            return Ok(());
        }

        let mut output = Output::new(&mut self.buf[self.end..self.end + self.write_chunk]);
        loop {
            let status = if self.encoder.is_idle() {
                match frames.next() {
                    Some(frame) => self.encoder.encode(frame, &mut output)?,
                    None => break,
                }
            } else {
                self.encoder.resume(&mut output)?
            };

            if status == Encode::Pending {
                break;
            }
        }
        self.end += output.len();

        Ok(())
    }

    /// Moves the undecoded bytes to the front of the buffer.
    fn compact(&mut self) {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
    }
}

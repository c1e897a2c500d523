//! [`tokio_util::codec`] adapters over the frame decoder and encoder.
//!
//! These let a byte stream be driven with `Framed`, `FramedRead` or `FramedWrite`. The
//! decoder surfaces complete frames only: fragments are consumed silently until their
//! message is finished.
use bytes::{Buf, BytesMut};
use tokio_util::codec;

use crate::{
    buffer::{Input, Output},
    decoder::{Decode, FrameDecoder},
    encoder::{Encode, FrameEncoder},
    frame::Frame,
    options::{Options, Role},
    payload::EncodePayload,
    WebSocketError,
};

/// Space added to the destination buffer for each encoder call.
const WRITE_WINDOW: usize = 16 * 1024;

/// A combined codec that provides both encoding and decoding functionality for WebSocket frames.
///
/// This codec can be used with Tokio's framed streams to handle WebSocket protocol
/// frame encoding and decoding.
pub struct Codec {
    decoder: Decoder,
    encoder: Encoder,
}

impl Codec {
    /// Creates the codec of an endpoint with the given role.
    pub fn new(role: Role, options: &Options) -> crate::Result<Self> {
        Ok(Self {
            decoder: Decoder::new(role, options)?,
            encoder: Encoder::new(role, options)?,
        })
    }
}

impl From<(Decoder, Encoder)> for Codec {
    fn from((decoder, encoder): (Decoder, Encoder)) -> Self {
        Self { decoder, encoder }
    }
}

impl codec::Decoder for Codec {
    type Item = <Decoder as codec::Decoder>::Item;
    type Error = <Decoder as codec::Decoder>::Error;

    #[inline]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        codec::Decoder::decode(&mut self.decoder, src)
    }

    #[inline]
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        codec::Decoder::decode_eof(&mut self.decoder, src)
    }
}

impl<T: EncodePayload> codec::Encoder<Frame<T>> for Codec {
    type Error = WebSocketError;

    #[inline]
    fn encode(&mut self, frame: Frame<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        codec::Encoder::encode(&mut self.encoder, frame, dst)
    }
}

/// Decodes frames out of a `BytesMut` read buffer.
///
/// Payload bytes are moved out of the read buffer as they arrive, so the buffer never has to
/// hold a whole frame.
pub struct Decoder {
    inner: FrameDecoder,
}

impl Decoder {
    pub fn new(role: Role, options: &Options) -> crate::Result<Self> {
        Ok(Self {
            inner: FrameDecoder::new(role, options)?,
        })
    }

    fn decode_frame(&mut self, src: &mut BytesMut, last: bool) -> crate::Result<Option<Frame>> {
        loop {
            let mut input = Input::new(&mut src[..], last);
            let res = self.inner.decode(&mut input);
            let consumed = input.position();
            src.advance(consumed);

            match res? {
                Decode::Frame(frame) => return Ok(Some(frame)),
                Decode::Fragment(_) => continue,
                Decode::Pending => return Ok(None),
            }
        }
    }
}

impl codec::Decoder for Decoder {
    type Item = Frame;
    type Error = WebSocketError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_frame(src, false)
    }

    /// Fails if the stream ends inside a frame or a fragmented message.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_frame(src, true)
    }
}

/// Encodes frames at the end of a `BytesMut` write buffer.
///
/// The buffer grows by a fixed window for each encoder call, so data messages longer than
/// the window are sent as several wire frames.
pub struct Encoder {
    inner: FrameEncoder,
}

impl Encoder {
    pub fn new(role: Role, options: &Options) -> crate::Result<Self> {
        Ok(Self {
            inner: FrameEncoder::new(role, options)?,
        })
    }
}

impl From<FrameEncoder> for Encoder {
    fn from(inner: FrameEncoder) -> Self {
        Self { inner }
    }
}

impl<T: EncodePayload> codec::Encoder<Frame<T>> for Encoder {
    type Error = WebSocketError;

    fn encode(&mut self, frame: Frame<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut frame = Some(frame);

        loop {
            let start = dst.len();
            dst.resize(start + WRITE_WINDOW, 0);

            let mut output = Output::new(&mut dst[start..]);
            let res = match frame.take() {
                Some(frame) => self.inner.encode(frame, &mut output),
                None => self.inner.resume(&mut output),
            };
            let written = output.len();
            dst.truncate(start + written);

            if res? == Encode::Done {
                return Ok(());
            }
        }
    }
}

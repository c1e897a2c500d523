//! Payload producers and consumers.
//!
//! The framing engine never looks inside a data payload. When encoding, it hands the
//! remaining space of the output buffer to a [`PayloadEncoder`], which writes as much as it
//! can. When decoding, it feeds each run of unmasked (and, if needed, decompressed) bytes to a
//! [`PayloadDecoder`], which builds the payload value for the finished message.
//!
//! [`Bytes`] based implementations are provided for both directions; [`BytesPayload`] is the
//! default payload of a [`FrameDecoder`](crate::decoder::FrameDecoder).
use bytes::{Buf, Bytes, BytesMut};

use crate::{frame::OpCode, Result, WebSocketError};

/// Outcome of a [`PayloadEncoder::encode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced {
    /// The payload is complete; the value is the number of bytes written by this call.
    Done(usize),
    /// More bytes will follow; the value is the number of bytes written by this call.
    Partial(usize),
}

impl Produced {
    #[inline]
    pub fn written(self) -> usize {
        match self {
            Self::Done(n) | Self::Partial(n) => n,
        }
    }

    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Writes the bytes of one message payload, a buffer at a time.
pub trait PayloadEncoder {
    /// Writes as many payload bytes as fit into `dst`.
    ///
    /// Must return [`Produced::Done`] once the last byte has been written, including when
    /// `dst` is empty and nothing is left.
    fn encode(&mut self, dst: &mut [u8]) -> Result<Produced>;
}

impl<E: PayloadEncoder + ?Sized> PayloadEncoder for Box<E> {
    fn encode(&mut self, dst: &mut [u8]) -> Result<Produced> {
        (**self).encode(dst)
    }
}

/// Payload values the encoder accepts.
pub trait EncodePayload {
    type Encoder: PayloadEncoder + Send + 'static;

    fn into_encoder(self) -> Self::Encoder;
}

/// Produces the bytes of an in-memory payload.
#[derive(Debug, Clone, Default)]
pub struct BytesEncoder {
    payload: Bytes,
}

impl BytesEncoder {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl PayloadEncoder for BytesEncoder {
    fn encode(&mut self, dst: &mut [u8]) -> Result<Produced> {
        let n = dst.len().min(self.payload.len());
        dst[..n].copy_from_slice(&self.payload[..n]);
        self.payload.advance(n);

        if self.payload.is_empty() {
            Ok(Produced::Done(n))
        } else {
            Ok(Produced::Partial(n))
        }
    }
}

macro_rules! bytes_payload {
    ($($ty:ty),*) => {
        $(
            impl EncodePayload for $ty {
                type Encoder = BytesEncoder;

                #[inline]
                fn into_encoder(self) -> BytesEncoder {
                    BytesEncoder::new(self)
                }
            }
        )*
    };
}

bytes_payload!(Bytes, BytesMut, Vec<u8>, String, &'static str, &'static [u8]);

/// Builds the payload value of one message from its bytes.
pub trait PayloadDecoder {
    type Output;

    /// Consumes a run of payload bytes, returning how many were accepted.
    ///
    /// Accepting fewer bytes than offered signals the payload is complete; the frame decoder
    /// treats any declared bytes left over as a protocol error.
    fn decode(&mut self, chunk: &[u8]) -> Result<usize>;

    /// Called once the final frame of the message has been read.
    fn finish(self) -> Result<Self::Output>;
}

/// Creates a [`PayloadDecoder`] for each message the frame decoder starts.
pub trait DecodePayload {
    type Decoder: PayloadDecoder;

    /// `opcode` is either [`OpCode::Text`] or [`OpCode::Binary`].
    fn payload_decoder(&mut self, opcode: OpCode) -> Self::Decoder;
}

/// Default payload: messages are collected into [`Bytes`].
///
/// When `check_utf8` is set, text payloads are validated while they stream in.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesPayload {
    pub check_utf8: bool,
}

impl DecodePayload for BytesPayload {
    type Decoder = BytesDecoder;

    fn payload_decoder(&mut self, opcode: OpCode) -> BytesDecoder {
        if self.check_utf8 && opcode == OpCode::Text {
            BytesDecoder::utf8()
        } else {
            BytesDecoder::new()
        }
    }
}

/// Collects payload bytes, optionally checking they form valid UTF-8.
#[derive(Debug, Default)]
pub struct BytesDecoder {
    buf: BytesMut,
    /// Number of leading bytes already known to be valid UTF-8, when validating.
    checked: Option<usize>,
}

impl BytesDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that rejects payloads that are not valid UTF-8.
    pub fn utf8() -> Self {
        Self {
            buf: BytesMut::new(),
            checked: Some(0),
        }
    }
}

impl PayloadDecoder for BytesDecoder {
    type Output = Bytes;

    fn decode(&mut self, chunk: &[u8]) -> Result<usize> {
        self.buf.extend_from_slice(chunk);

        if let Some(checked) = self.checked.as_mut() {
            *checked += utf8_prefix(&self.buf[*checked..])?;
        }

        Ok(chunk.len())
    }

    fn finish(self) -> Result<Bytes> {
        match self.checked {
            // an incomplete code point at the very end
            Some(checked) if checked != self.buf.len() => Err(WebSocketError::InvalidUTF8),
            _ => Ok(self.buf.freeze()),
        }
    }
}

/// Length of the longest valid UTF-8 prefix of `bytes`.
///
/// Fails only on sequences that can never become valid, so a code point cut at the end of
/// the input is left for the next call.
fn utf8_prefix(bytes: &[u8]) -> Result<usize> {
    #[cfg(feature = "simd")]
    let res = simdutf8::compat::from_utf8(bytes);
    #[cfg(not(feature = "simd"))]
    let res = std::str::from_utf8(bytes);

    match res {
        Ok(_) => Ok(bytes.len()),
        Err(err) if err.error_len().is_none() => Ok(err.valid_up_to()),
        Err(_) => Err(WebSocketError::InvalidUTF8),
    }
}

//! # wsframe
//! Resumable implementation of the WebSocket framing protocol (RFC 6455) and the
//! permessage-deflate extension (RFC 7692).
//!
//! The crate only deals with bytes on the wire: frame headers, payload lengths, masking,
//! fragment boundaries and the compression context. It performs no I/O of its own. Every
//! entry point is a state transition over a caller-owned byte slice which may be arbitrarily
//! short, so frames can be decoded from, and encoded into, buffers of any size.
//!
//! # Features
//! The crate provides several optional features that can be enabled in your `Cargo.toml`:
//!
//! - `zlib`: Uses the zlib backend of `flate2`, which enables window size control through
//!   `client_max_window_bits` and `server_max_window_bits`.
//!
//! - `logging`: Enables debug logging of compression contexts and fragment handling using the `log` crate.
//!
//! - `simd`: Validates UTF-8 text payloads using `simdutf8`.
//!
//! # Decoding
//! ```rust
//! use wsframe::{buffer::Input, decoder::{Decode, FrameDecoder}, frame::Frame, Options, Role};
//!
//! let mut decoder = FrameDecoder::new(Role::Server, &Options::default())?;
//!
//! // A masked "Hello", split in two arbitrary chunks.
//! let mut wire = *b"\x81\x85\x37\xfa\x21\x3d\x7f\x9f\x4d\x51\x58";
//! let (head, tail) = wire.split_at_mut(4);
//!
//! let mut input = Input::new(head, false);
//! assert!(matches!(decoder.decode(&mut input)?, Decode::Pending));
//!
//! let mut input = Input::new(tail, true);
//! match decoder.decode(&mut input)? {
//!     Decode::Frame(Frame::Text(payload)) => assert_eq!(&payload[..], b"Hello"),
//!     _ => unreachable!(),
//! }
//! # Ok::<(), wsframe::WebSocketError>(())
//! ```
//!
//! # Encoding
//! ```rust
//! use wsframe::{buffer::Output, encoder::{Encode, FrameEncoder}, frame::Frame, Options, Role};
//!
//! let mut encoder = FrameEncoder::new(Role::Server, &Options::default())?;
//! let mut buf = [0u8; 64];
//! let mut output = Output::new(&mut buf);
//!
//! let status = encoder.encode(Frame::text("Hello"), &mut output)?;
//! assert!(matches!(status, Encode::Done));
//! assert_eq!(output.filled(), b"\x81\x05Hello");
//! # Ok::<(), wsframe::WebSocketError>(())
//! ```
//!
//! # Compression Support
//! The permessage-deflate extension is enabled through [`Options::compression`]:
//!
//! - Context takeover control for both client and server
//! - Compression level adjustment (0-9)
//! - Window size configuration (with `zlib` feature)
//!
//! The compression contexts live inside the encoder and decoder, one per direction, and by
//! default survive from one message to the next.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod buffer;
pub mod close;
pub mod codec;
pub mod compression;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod frame;
mod mask;
mod options;
pub mod payload;

use thiserror::Error;

pub use close::CloseCode;
pub use frame::{CloseFrame, Frame, OpCode};
pub use mask::apply_mask;
pub use options::{
    CompressionLevel, DeflateOptions, Options, Role, MAX_FRAME_SIZE, MAX_MESSAGE_SIZE,
};

/// A result type for WebSocket operations, using `WebSocketError` as the error type.
pub type Result<T> = std::result::Result<T, WebSocketError>;

/// Represents errors that can occur while decoding or encoding WebSocket frames.
///
/// The errors are broadly categorized into:
///
/// - Incomplete input (the stream ended in the middle of a frame or message)
/// - Protocol violations (malformed headers, invalid fragment sequences)
/// - Payload errors (invalid UTF-8, corrupt deflate streams)
/// - Resource errors (output buffers too small to make progress)
///
/// A [`FrameDecoder`](decoder::FrameDecoder) that returned an error, or a
/// [`FrameEncoder`](encoder::FrameEncoder) that failed while writing a frame, keeps failing
/// with the same error on every later call.
#[derive(Error, Debug)]
pub enum WebSocketError {
    /// The input was marked as final while a frame header, length, masking key or payload
    /// was still missing bytes.
    #[error("Incomplete frame")]
    IncompleteFrame,

    /// The input was marked as final while a fragmented message was still waiting for
    /// its final continuation frame.
    #[error("Incomplete message")]
    IncompleteMessage,

    /// Occurs when receiving a WebSocket fragment that violates RFC 6455,
    /// such as receiving a new data frame before completing the previous message.
    #[error("Invalid fragment")]
    InvalidFragment,

    /// Indicates that a text frame or close frame reason contains invalid UTF-8 data.
    /// According to RFC 6455, all text payloads must be valid UTF-8.
    #[error("Invalid UTF-8")]
    InvalidUTF8,

    /// Occurs when receiving a continuation frame without a preceding initial frame.
    #[error("Invalid continuation frame")]
    InvalidContinuationFrame,

    /// Indicates that a received close frame has an invalid format, such as
    /// containing a payload of 1 byte (close frames must be either empty or ≥2 bytes).
    #[error("Invalid close frame")]
    InvalidCloseFrame,

    /// Occurs when a close frame contains a status code that must not appear on the wire.
    #[error("Invalid close code")]
    InvalidCloseCode,

    /// Indicates that reserved bits in the WebSocket frame header are set when they
    /// should be 0, or RSV1 is set on a frame that cannot carry it.
    #[error("Reserved bits are not zero")]
    ReservedBitsNotZero,

    /// Occurs when a control frame (ping, pong, or close) has the FIN bit cleared.
    /// RFC 6455 requires that control frames must not be fragmented.
    #[error("Control frame must not be fragmented")]
    ControlFrameFragmented,

    /// Indicates that a control frame payload exceeds 125 bytes.
    #[error("Control frame too large")]
    ControlFrameTooLarge,

    /// Occurs when a frame's declared payload length exceeds the configured maximum.
    #[error("Frame too large")]
    FrameTooLarge,

    /// Occurs when the payload accumulated for one message exceeds the configured maximum.
    #[error("Message too large")]
    MessageTooLarge,

    /// The 64-bit extended payload length had its most significant bit set.
    #[error("Invalid payload length")]
    InvalidPayloadLength,

    /// Indicates receipt of a frame with a reserved opcode (0x3-0x7, 0xB-0xF).
    #[error("Invalid opcode (byte={0})")]
    InvalidOpCode(u8),

    /// The payload decoder stopped accepting bytes while the frame still declared more.
    #[error("Payload decoded with undelivered bytes remaining")]
    UndecodedPayload,

    /// Occurs when receiving a compressed frame on a decoder without a decompressor.
    #[error("Received compressed frame on stream that doesn't support compression")]
    CompressionNotSupported,

    /// The output buffer cannot hold even the smallest piece of the frame being encoded.
    #[error("Output buffer too small")]
    BufferTooSmall,

    /// A new frame was handed to the encoder while the previous one was still being written.
    #[error("Encoder is busy with another frame")]
    EncoderBusy,

    /// The LZ77 window size is outside of the 8-15 range.
    #[error("Invalid window bits: {0}")]
    InvalidWindowBits(u8),

    /// The permessage-deflate parameters could not be parsed.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    /// Wraps I/O errors, which is also how corrupt deflate streams are reported.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl WebSocketError {
    /// Builds an equal error, to be returned again by a failed decoder or encoder.
    pub(crate) fn replay(&self) -> Self {
        match self {
            Self::IncompleteFrame => Self::IncompleteFrame,
            Self::IncompleteMessage => Self::IncompleteMessage,
            Self::InvalidFragment => Self::InvalidFragment,
            Self::InvalidUTF8 => Self::InvalidUTF8,
            Self::InvalidContinuationFrame => Self::InvalidContinuationFrame,
            Self::InvalidCloseFrame => Self::InvalidCloseFrame,
            Self::InvalidCloseCode => Self::InvalidCloseCode,
            Self::ReservedBitsNotZero => Self::ReservedBitsNotZero,
            Self::ControlFrameFragmented => Self::ControlFrameFragmented,
            Self::ControlFrameTooLarge => Self::ControlFrameTooLarge,
            Self::FrameTooLarge => Self::FrameTooLarge,
            Self::MessageTooLarge => Self::MessageTooLarge,
            Self::InvalidPayloadLength => Self::InvalidPayloadLength,
            Self::InvalidOpCode(code) => Self::InvalidOpCode(*code),
            Self::UndecodedPayload => Self::UndecodedPayload,
            Self::CompressionNotSupported => Self::CompressionNotSupported,
            Self::BufferTooSmall => Self::BufferTooSmall,
            Self::EncoderBusy => Self::EncoderBusy,
            Self::InvalidWindowBits(bits) => Self::InvalidWindowBits(*bits),
            Self::InvalidExtension(ext) => Self::InvalidExtension(ext.clone()),
            Self::IoError(err) => Self::IoError(std::io::Error::new(err.kind(), err.to_string())),
        }
    }
}

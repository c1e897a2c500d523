//! # Frame
//!
//! The `frame` module implements the WebSocket frame model as defined in
//! [RFC 6455 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6455#section-5.2).
//!
//! ### Frame Binary Format
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |         (16 or 64 bits)       |
//! |N|V|V|V|       |S|             |                               |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |        Extended payload length continued, if payload len == 127|
//! +---------------------------------------------------------------+
//! |                               |   Masking-key, if MASK set to 1|
//! +-------------------------------+-------------------------------+
//! |     Masking-key (continued)       |          Payload Data      |
//! +-----------------------------------+ - - - - - - - - - - - - - -+
//! :                     Payload Data continued ...                :
//! +---------------------------------------------------------------+
//! ```
//!
//! A [`Frame`] is the logical unit handed to the encoder or produced by the decoder. Data
//! frames ([`Frame::Text`], [`Frame::Binary`]) carry a payload value of type `T`; how that
//! value is turned into bytes, or built from them, is delegated to the traits in
//! [`payload`](crate::payload). Continuation frames never surface as a `Frame`: the decoder
//! folds them into the message they continue, and the encoder emits them when a message
//! does not fit in one output buffer.
use bytes::{BufMut, Bytes, BytesMut};

use crate::{close::CloseCode, WebSocketError};

/// Largest payload a control frame may carry.
pub const MAX_CONTROL_PAYLOAD: usize = 125;

/// Largest possible frame header: 2 fixed bytes, 8 bytes of extended length and a masking key.
pub const MAX_HEAD_SIZE: usize = 14;

/// Size of the masking key.
pub const MASK_SIZE: usize = 4;

pub(crate) const FIN: u8 = 0b1000_0000;
pub(crate) const RSV1: u8 = 0b0100_0000;
pub(crate) const RSV2_3: u8 = 0b0011_0000;
pub(crate) const OPCODE: u8 = 0b0000_1111;
pub(crate) const MASKED: u8 = 0b1000_0000;
pub(crate) const LENGTH: u8 = 0b0111_1111;

/// WebSocket operation code (OpCode) that determines the semantic meaning and handling of a frame.
///
/// The ranges 0x3-0x7 and 0xB-0xF are reserved. They have no variant here: converting
/// one with [`TryFrom<u8>`] fails with [`WebSocketError::InvalidOpCode`], so a reserved
/// frame can never be constructed.
///
/// The numeric values for each OpCode are defined in [RFC 6455, Section 11.8](https://datatracker.ietf.org/doc/html/rfc6455#section-11.8).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    /// Returns `true` if the `OpCode` represents a control frame (`Close`, `Ping`, or `Pong`).
    ///
    /// Control frames cannot be fragmented and carry at most 125 bytes of payload.
    pub fn is_control(&self) -> bool {
        matches!(*self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    /// Returns `true` for the opcodes that may start a message (`Text` or `Binary`).
    pub fn is_data(&self) -> bool {
        matches!(*self, OpCode::Text | OpCode::Binary)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = WebSocketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            _ => Err(WebSocketError::InvalidOpCode(value)),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(val: OpCode) -> Self {
        match val {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }
}

/// Status code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    pub code: CloseCode,
    pub reason: String,
}

impl CloseFrame {
    /// Parses a close payload: empty, or a big-endian status code followed by a UTF-8 reason.
    pub fn parse(payload: &[u8]) -> Result<Option<Self>, WebSocketError> {
        match payload.len() {
            0 => Ok(None),
            1 => Err(WebSocketError::InvalidCloseFrame),
            _ => {
                let code = CloseCode::from(u16::from_be_bytes([payload[0], payload[1]]));
                if !code.is_allowed() {
                    return Err(WebSocketError::InvalidCloseCode);
                }

                let reason = std::str::from_utf8(&payload[2..])
                    .map_err(|_| WebSocketError::InvalidUTF8)?
                    .to_owned();

                Ok(Some(Self { code, reason }))
            }
        }
    }

    /// Serializes the close payload.
    pub fn to_payload(&self) -> Bytes {
        let mut payload = BytesMut::with_capacity(2 + self.reason.len());
        payload.put_u16(self.code.into());
        payload.put_slice(self.reason.as_bytes());
        payload.freeze()
    }
}

/// A complete WebSocket frame.
///
/// `T` is the payload value of data frames. The decoder produces whatever the configured
/// [`DecodePayload`](crate::payload::DecodePayload) builds (`Bytes` by default); the encoder
/// accepts any [`EncodePayload`](crate::payload::EncodePayload).
///
/// ```rust
/// use wsframe::{CloseCode, Frame};
///
/// let text = Frame::text("Hello");
/// let ping = Frame::<bytes::Bytes>::Ping("are you there".into());
/// let close = Frame::<bytes::Bytes>::close(CloseCode::Normal, "bye");
///
/// assert!(!text.is_control());
/// assert!(ping.is_control());
/// assert!(close.is_control());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<T = Bytes> {
    Text(T),
    Binary(T),
    /// Either both a status code and reason are present, or neither is.
    Close(Option<CloseFrame>),
    Ping(Bytes),
    Pong(Bytes),
}

impl<T> Frame<T> {
    /// The opcode the frame is sent with.
    pub fn opcode(&self) -> OpCode {
        match self {
            Self::Text(_) => OpCode::Text,
            Self::Binary(_) => OpCode::Binary,
            Self::Close(_) => OpCode::Close,
            Self::Ping(_) => OpCode::Ping,
            Self::Pong(_) => OpCode::Pong,
        }
    }

    #[inline]
    pub fn is_control(&self) -> bool {
        self.opcode().is_control()
    }

    /// Creates a close frame with a status code and reason.
    pub fn close(code: CloseCode, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))
    }

    /// Maps the payload value of a data frame, leaving control frames untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Frame<U> {
        match self {
            Self::Text(payload) => Frame::Text(f(payload)),
            Self::Binary(payload) => Frame::Binary(f(payload)),
            Self::Close(close) => Frame::Close(close),
            Self::Ping(payload) => Frame::Ping(payload),
            Self::Pong(payload) => Frame::Pong(payload),
        }
    }

    /// Builds the frame for a completed control payload.
    pub(crate) fn control(opcode: OpCode, payload: Bytes) -> Result<Self, WebSocketError> {
        match opcode {
            OpCode::Ping => Ok(Self::Ping(payload)),
            OpCode::Pong => Ok(Self::Pong(payload)),
            OpCode::Close => Ok(Self::Close(CloseFrame::parse(&payload)?)),
            _ => Err(WebSocketError::InvalidFragment),
        }
    }

    /// Builds the frame for a completed message.
    pub(crate) fn data(opcode: OpCode, payload: T) -> Result<Self, WebSocketError> {
        match opcode {
            OpCode::Text => Ok(Self::Text(payload)),
            OpCode::Binary => Ok(Self::Binary(payload)),
            _ => Err(WebSocketError::InvalidFragment),
        }
    }
}

impl Frame<Bytes> {
    /// Creates a text frame.
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::Text(payload.into())
    }

    /// Creates a binary frame.
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::Binary(payload.into())
    }

    /// Returns the payload of a text frame as a string slice.
    ///
    /// Returns `None` for any other frame or if the payload is not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(payload) => std::str::from_utf8(payload).ok(),
            _ => None,
        }
    }
}

/// Writes a frame header into `head` and returns its size.
///
/// `head` must hold at least the size returned by [`head_size`].
pub(crate) fn fmt_head(
    head: &mut [u8],
    fin: bool,
    rsv1: bool,
    opcode: OpCode,
    mask: Option<[u8; 4]>,
    len: usize,
) -> usize {
    head[0] = (fin as u8) << 7 | (rsv1 as u8) << 6 | u8::from(opcode);

    let size = if len < 126 {
        head[1] = len as u8;
        2
    } else if len < 65536 {
        head[1] = 126;
        head[2..4].copy_from_slice(&(len as u16).to_be_bytes());
        4
    } else {
        head[1] = 127;
        head[2..10].copy_from_slice(&(len as u64).to_be_bytes());
        10
    };

    if let Some(mask) = mask {
        head[1] |= MASKED;
        head[size..size + MASK_SIZE].copy_from_slice(&mask);
        size + MASK_SIZE
    } else {
        size
    }
}

/// Size of the header of a frame carrying `len` payload bytes.
#[inline]
pub(crate) fn head_size(len: usize, masked: bool) -> usize {
    let size = if len < 126 {
        2
    } else if len < 65536 {
        4
    } else {
        10
    };
    size + masked as usize * MASK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    mod opcode_tests {
        use super::*;

        #[test]
        fn test_is_control() {
            assert!(OpCode::Close.is_control());
            assert!(OpCode::Ping.is_control());
            assert!(OpCode::Pong.is_control());

            assert!(!OpCode::Continuation.is_control());
            assert!(!OpCode::Text.is_control());
            assert!(!OpCode::Binary.is_control());
        }

        #[test]
        fn test_is_data() {
            assert!(OpCode::Text.is_data());
            assert!(OpCode::Binary.is_data());
            assert!(!OpCode::Continuation.is_data());
            assert!(!OpCode::Ping.is_data());
        }

        #[test]
        fn test_try_from_u8_reserved() {
            for code in [0x3, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
                assert!(matches!(
                    OpCode::try_from(code),
                    Err(WebSocketError::InvalidOpCode(byte)) if byte == code
                ));
            }
        }

        #[test]
        fn test_u8_conversion_is_symmetric() {
            for code in [0x0, 0x1, 0x2, 0x8, 0x9, 0xA] {
                assert_eq!(u8::from(OpCode::try_from(code).unwrap()), code);
            }
        }
    }

    mod close_tests {
        use super::*;

        #[test]
        fn test_parse_empty() {
            assert_eq!(CloseFrame::parse(&[]).unwrap(), None);
        }

        #[test]
        fn test_parse_single_byte() {
            assert!(matches!(
                CloseFrame::parse(&[0x03]),
                Err(WebSocketError::InvalidCloseFrame)
            ));
        }

        #[test]
        fn test_parse_code_and_reason() {
            let close = CloseFrame::parse(b"\x03\xe8Goodbye").unwrap().unwrap();
            assert_eq!(close.code, CloseCode::Normal);
            assert_eq!(close.reason, "Goodbye");
        }

        #[test]
        fn test_parse_forbidden_code() {
            // 1005 (no status received) must never be sent on the wire
            assert!(matches!(
                CloseFrame::parse(&1005u16.to_be_bytes()),
                Err(WebSocketError::InvalidCloseCode)
            ));
        }

        #[test]
        fn test_parse_invalid_reason() {
            assert!(matches!(
                CloseFrame::parse(b"\x03\xe8\xff\xfe"),
                Err(WebSocketError::InvalidUTF8)
            ));
        }

        #[test]
        fn test_payload() {
            let close = CloseFrame {
                code: CloseCode::Away,
                reason: "later".into(),
            };
            assert_eq!(&close.to_payload()[..], b"\x03\xe9later");
        }
    }

    mod head_tests {
        use super::*;

        #[test]
        fn test_fmt_head_masked() {
            let mask_key = [0xAA, 0xBB, 0xCC, 0xDD];
            let mut head = [0u8; MAX_HEAD_SIZE];
            let size = fmt_head(&mut head, true, false, OpCode::Text, Some(mask_key), 11);

            assert_eq!(size, 2 + 4);
            assert_eq!(head[0], 0x81);
            assert_eq!(head[1], 0x80 | 11);
            assert_eq!(&head[2..6], &mask_key);
        }

        #[test]
        fn test_fmt_head_lengths() {
            let mut head = [0u8; MAX_HEAD_SIZE];

            assert_eq!(fmt_head(&mut head, true, false, OpCode::Binary, None, 125), 2);
            assert_eq!(head[1], 125);

            assert_eq!(fmt_head(&mut head, true, false, OpCode::Binary, None, 126), 4);
            assert_eq!(&head[1..4], &[126, 0, 126]);

            assert_eq!(fmt_head(&mut head, false, true, OpCode::Binary, None, 65536), 10);
            assert_eq!(head[0], 0x42);
            assert_eq!(&head[1..10], &[127, 0, 0, 0, 0, 0, 1, 0, 0]);
        }

        #[test]
        fn test_head_size() {
            assert_eq!(head_size(0, false), 2);
            assert_eq!(head_size(125, true), 6);
            assert_eq!(head_size(126, false), 4);
            assert_eq!(head_size(65535, true), 8);
            assert_eq!(head_size(65536, false), 10);
        }
    }

    mod frame_tests {
        use super::*;

        #[test]
        fn test_opcode() {
            assert_eq!(Frame::text("a").opcode(), OpCode::Text);
            assert_eq!(Frame::binary("a").opcode(), OpCode::Binary);
            assert_eq!(Frame::<Bytes>::Close(None).opcode(), OpCode::Close);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(Frame::text("Hello, 世界").as_str(), Some("Hello, 世界"));
            assert_eq!(Frame::binary("Hello").as_str(), None);
            assert_eq!(Frame::text(&b"\xff\xfe"[..]).as_str(), None);
        }

        #[test]
        fn test_map() {
            let frame = Frame::text("abc").map(|payload| payload.len());
            assert_eq!(frame, Frame::Text(3));

            let frame = Frame::<Bytes>::Ping("p".into()).map(|payload| payload.len());
            assert_eq!(frame, Frame::Ping(Bytes::from("p")));
        }

        #[test]
        fn test_control() {
            let frame = Frame::<Bytes>::control(OpCode::Close, Bytes::new()).unwrap();
            assert_eq!(frame, Frame::Close(None));
            assert!(Frame::<Bytes>::control(OpCode::Text, Bytes::new()).is_err());
        }
    }
}

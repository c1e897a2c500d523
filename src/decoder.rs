//! Resumable frame decoder.
//!
//! [`FrameDecoder::decode`] reads a frame one field at a time: the opcode byte, the length
//! byte, the extended length, the masking key and finally the payload. Every field can be cut
//! anywhere by the end of the input; the partial field is kept and completed by the next call.
//! Payload bytes are unmasked in place and handed to the message's
//! [`PayloadDecoder`], after going through the inflate context when the message is
//! compressed, so the decoder itself never buffers data payloads.
use bytes::BytesMut;

use crate::{
    buffer::Input,
    compression::Decompressor,
    frame::{self, Frame, OpCode, FIN, LENGTH, MASKED, MASK_SIZE, OPCODE, RSV1, RSV2_3},
    mask::apply_mask,
    options::{Options, Role},
    payload::{BytesPayload, DecodePayload, PayloadDecoder},
    Result, WebSocketError,
};

/// Outcome of a [`FrameDecoder::decode`] call.
#[derive(Debug)]
pub enum Decode<T> {
    /// The input is exhausted; call again with the bytes that follow.
    Pending,
    /// A complete control frame, or the last frame of a message.
    Frame(Frame<T>),
    /// A non-final frame of a message with the given opcode was read; its payload was passed
    /// to the message decoder and the message awaits its continuation frames.
    Fragment(OpCode),
}

/// First byte of a frame.
#[derive(Debug, Clone, Copy)]
struct Head {
    fin: bool,
    opcode: OpCode,
}

/// Where the decoder is within the current frame.
enum ReadState {
    /// The length byte is next.
    Length(Head),
    /// Reading a 16 or 64 bit extended length.
    ExtendedLength {
        head: Head,
        masked: bool,
        buf: [u8; 8],
        width: usize,
        filled: usize,
    },
    /// Reading the masking key.
    Mask {
        head: Head,
        len: usize,
        key: [u8; MASK_SIZE],
        filled: usize,
    },
    /// Streaming the payload; `phase` is the offset within the masking key.
    Payload {
        head: Head,
        mask: Option<[u8; MASK_SIZE]>,
        remaining: usize,
        phase: usize,
    },
}

/// A message whose frames are being read.
struct Message<D> {
    opcode: OpCode,
    compressed: bool,
    decoder: D,
    /// Payload bytes delivered so far, after decompression.
    size: usize,
}

impl<D: PayloadDecoder> Message<D> {
    fn feed(&mut self, bytes: &[u8], limit: usize) -> Result<()> {
        self.size += bytes.len();
        if self.size > limit {
            return Err(WebSocketError::MessageTooLarge);
        }

        if self.decoder.decode(bytes)? < bytes.len() {
            return Err(WebSocketError::UndecodedPayload);
        }

        Ok(())
    }
}

/// Decodes frames from a byte stream delivered in arbitrary pieces.
///
/// Data payloads are built by `P`, [`BytesPayload`] by default. Continuation frames are
/// folded into the message they continue and control frames may arrive between them.
///
/// The decoder accepts both masked and unmasked frames whatever its role; the role only picks
/// which side's deflate parameters apply. Once a call fails, every later call fails with the
/// same error without reading any input.
pub struct FrameDecoder<P: DecodePayload = BytesPayload> {
    /// `None` between frames.
    state: Option<ReadState>,
    payload: P,
    message: Option<Message<P::Decoder>>,
    /// Payload of the control frame being read.
    control: BytesMut,
    decompressor: Option<Decompressor>,
    max_frame_size: usize,
    max_message_size: usize,
    /// Error that stopped the decoder.
    failed: Option<WebSocketError>,
}

impl FrameDecoder {
    /// Creates a decoder collecting payloads into [`Bytes`](bytes::Bytes).
    pub fn new(role: Role, options: &Options) -> Result<Self> {
        Self::with_payload(
            role,
            options,
            BytesPayload {
                check_utf8: options.check_utf8,
            },
        )
    }
}

impl<P: DecodePayload> FrameDecoder<P> {
    /// Creates a decoder building data payloads with `payload`.
    ///
    /// `role` is the role of the endpoint doing the decoding.
    pub fn with_payload(role: Role, options: &Options, payload: P) -> Result<Self> {
        let decompressor = options
            .compression
            .as_ref()
            .map(|compression| compression.decompressor(role))
            .transpose()?;

        Ok(Self {
            state: None,
            payload,
            message: None,
            control: BytesMut::with_capacity(frame::MAX_CONTROL_PAYLOAD),
            decompressor,
            max_frame_size: options.frame_size_limit(),
            max_message_size: options.message_size_limit(),
            failed: None,
        })
    }

    /// Whether a fragmented message is waiting for its continuation frames.
    pub fn is_fragmented(&self) -> bool {
        self.message.is_some()
    }

    /// Reads from `input` until a frame or fragment is complete, or the input runs out.
    ///
    /// All bytes up to [`Input::position`] were consumed and must not be passed again. When
    /// `input` is the last of the stream, ending between two frames returns
    /// [`Decode::Pending`], while ending inside a frame or an unfinished message fails.
    pub fn decode(
        &mut self,
        input: &mut Input<'_>,
    ) -> Result<Decode<<P::Decoder as PayloadDecoder>::Output>> {
        if let Some(err) = &self.failed {
            return Err(err.replay());
        }

        let res = self.read(input);
        if let Err(err) = &res {
            #[cfg(feature = "logging")]
            log::debug!("frame decoding failed: {err}");

            self.state = None;
            self.message = None;
            self.failed = Some(err.replay());
        }

        res
    }

    fn read(
        &mut self,
        input: &mut Input<'_>,
    ) -> Result<Decode<<P::Decoder as PayloadDecoder>::Output>> {
        loop {
            match self.state.take() {
                None => {
                    let Some(byte) = input.next_byte() else {
                        return self.suspend(input, None);
                    };
                    self.state = Some(ReadState::Length(self.read_head(byte)?));
                }
                Some(ReadState::Length(head)) => {
                    let Some(byte) = input.next_byte() else {
                        return self.suspend(input, Some(ReadState::Length(head)));
                    };

                    let masked = byte & MASKED != 0;
                    let state = match byte & LENGTH {
                        126 => ReadState::ExtendedLength {
                            head,
                            masked,
                            buf: [0; 8],
                            width: 2,
                            filled: 0,
                        },
                        127 => ReadState::ExtendedLength {
                            head,
                            masked,
                            buf: [0; 8],
                            width: 8,
                            filled: 0,
                        },
                        len => self.read_length(head, masked, u64::from(len))?,
                    };
                    self.state = Some(state);
                }
                Some(ReadState::ExtendedLength {
                    head,
                    masked,
                    mut buf,
                    width,
                    mut filled,
                }) => {
                    while filled < width {
                        let Some(byte) = input.next_byte() else {
                            let state = ReadState::ExtendedLength {
                                head,
                                masked,
                                buf,
                                width,
                                filled,
                            };
                            return self.suspend(input, Some(state));
                        };
                        buf[filled] = byte;
                        filled += 1;
                    }

                    let len = if width == 2 {
                        u64::from(u16::from_be_bytes([buf[0], buf[1]]))
                    } else {
                        u64::from_be_bytes(buf)
                    };
                    self.state = Some(self.read_length(head, masked, len)?);
                }
                Some(ReadState::Mask {
                    head,
                    len,
                    mut key,
                    mut filled,
                }) => {
                    while filled < MASK_SIZE {
                        let Some(byte) = input.next_byte() else {
                            let state = ReadState::Mask {
                                head,
                                len,
                                key,
                                filled,
                            };
                            return self.suspend(input, Some(state));
                        };
                        key[filled] = byte;
                        filled += 1;
                    }

                    self.state = Some(ReadState::Payload {
                        head,
                        mask: Some(key),
                        remaining: len,
                        phase: 0,
                    });
                }
                Some(ReadState::Payload {
                    head,
                    mask,
                    remaining,
                    phase,
                }) => {
                    let chunk = input.take(remaining);
                    let phase = match mask {
                        Some(key) => apply_mask(chunk, key, phase),
                        None => phase,
                    };
                    let remaining = remaining - chunk.len();
                    self.deliver(head, chunk)?;

                    if remaining > 0 {
                        let state = ReadState::Payload {
                            head,
                            mask,
                            remaining,
                            phase,
                        };
                        return self.suspend(input, Some(state));
                    }

                    return self.complete(head);
                }
            }
        }
    }

    /// Parses and validates the first byte of a frame.
    fn read_head(&mut self, byte: u8) -> Result<Head> {
        if byte & RSV2_3 != 0 {
            return Err(WebSocketError::ReservedBitsNotZero);
        }

        let fin = byte & FIN != 0;
        let rsv1 = byte & RSV1 != 0;
        let opcode = OpCode::try_from(byte & OPCODE)?;

        if opcode.is_control() {
            if !fin {
                return Err(WebSocketError::ControlFrameFragmented);
            }
            if rsv1 {
                return Err(WebSocketError::ReservedBitsNotZero);
            }
            self.control.clear();
        } else if opcode == OpCode::Continuation {
            if self.message.is_none() {
                return Err(WebSocketError::InvalidContinuationFrame);
            }
            if rsv1 {
                return Err(WebSocketError::ReservedBitsNotZero);
            }
        } else {
            if self.message.is_some() {
                return Err(WebSocketError::InvalidFragment);
            }
            if rsv1 && self.decompressor.is_none() {
                return Err(WebSocketError::CompressionNotSupported);
            }

            self.message = Some(Message {
                opcode,
                compressed: rsv1,
                decoder: self.payload.payload_decoder(opcode),
                size: 0,
            });
        }

        Ok(Head { fin, opcode })
    }

    /// Validates the payload length and picks the next state.
    fn read_length(&self, head: Head, masked: bool, len: u64) -> Result<ReadState> {
        if len & (1 << 63) != 0 {
            return Err(WebSocketError::InvalidPayloadLength);
        }

        let len = usize::try_from(len).map_err(|_| WebSocketError::FrameTooLarge)?;
        if head.opcode.is_control() && len > frame::MAX_CONTROL_PAYLOAD {
            return Err(WebSocketError::ControlFrameTooLarge);
        }
        if len > self.max_frame_size {
            return Err(WebSocketError::FrameTooLarge);
        }

        Ok(if masked {
            ReadState::Mask {
                head,
                len,
                key: [0; MASK_SIZE],
                filled: 0,
            }
        } else {
            ReadState::Payload {
                head,
                mask: None,
                remaining: len,
                phase: 0,
            }
        })
    }

    /// Passes unmasked payload bytes to where they belong.
    fn deliver(&mut self, head: Head, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        if head.opcode.is_control() {
            self.control.extend_from_slice(chunk);
            return Ok(());
        }

        let limit = self.max_message_size;
        let message = self
            .message
            .as_mut()
            .ok_or(WebSocketError::InvalidContinuationFrame)?;

        if message.compressed {
            let decompressor = self
                .decompressor
                .as_mut()
                .ok_or(WebSocketError::CompressionNotSupported)?;
            decompressor.decompress(chunk, |bytes| message.feed(bytes, limit))
        } else {
            message.feed(chunk, limit)
        }
    }

    /// Wraps up a frame whose payload was fully read.
    fn complete(&mut self, head: Head) -> Result<Decode<<P::Decoder as PayloadDecoder>::Output>> {
        if head.opcode.is_control() {
            let payload = self.control.split().freeze();
            return Ok(Decode::Frame(Frame::control(head.opcode, payload)?));
        }

        let mut message = self
            .message
            .take()
            .ok_or(WebSocketError::InvalidContinuationFrame)?;

        if !head.fin {
            let opcode = message.opcode;
            self.message = Some(message);

            #[cfg(feature = "logging")]
            log::trace!("fragment of {opcode:?} message read");

            return Ok(Decode::Fragment(opcode));
        }

        if message.compressed {
            let limit = self.max_message_size;
            let decompressor = self
                .decompressor
                .as_mut()
                .ok_or(WebSocketError::CompressionNotSupported)?;
            decompressor.finish(|bytes| message.feed(bytes, limit))?;
        }

        let payload = message.decoder.finish()?;
        Ok(Decode::Frame(Frame::data(message.opcode, payload)?))
    }

    /// Stops at the end of the input, keeping `state` for the next call.
    fn suspend(
        &mut self,
        input: &Input<'_>,
        state: Option<ReadState>,
    ) -> Result<Decode<<P::Decoder as PayloadDecoder>::Output>> {
        if !input.is_last() {
            self.state = state;
            return Ok(Decode::Pending);
        }

        if state.is_some() {
            Err(WebSocketError::IncompleteFrame)
        } else if self.message.is_some() {
            Err(WebSocketError::IncompleteMessage)
        } else {
            Ok(Decode::Pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{CloseCode, DeflateOptions};

    const MASKED_HELLO: &[u8] = b"\x81\x85\x37\xfa\x21\x3d\x7f\x9f\x4d\x51\x58";
    const UNMASKED_HELLO: &[u8] = b"\x81\x05\x48\x65\x6c\x6c\x6f";

    fn decoder() -> FrameDecoder {
        FrameDecoder::new(Role::Server, &Options::default()).unwrap()
    }

    /// Decodes every frame of `wire`, delivered in the given pieces.
    fn decode_chunks(decoder: &mut FrameDecoder, wire: &[u8], splits: &[usize]) -> Result<Vec<Frame>> {
        let mut wire = wire.to_vec();
        let mut frames = Vec::new();
        let mut bounds = splits.to_vec();
        bounds.push(wire.len());

        let mut start = 0;
        for (i, &end) in bounds.iter().enumerate() {
            let last = i == bounds.len() - 1;
            let mut input = Input::new(&mut wire[start..end], last);
            loop {
                match decoder.decode(&mut input)? {
                    Decode::Frame(frame) => frames.push(frame),
                    Decode::Fragment(_) => {}
                    Decode::Pending => break,
                }
            }
            assert_eq!(input.position(), end - start);
            start = end;
        }

        Ok(frames)
    }

    fn decode_all(wire: &[u8]) -> Result<Vec<Frame>> {
        decode_chunks(&mut decoder(), wire, &[])
    }

    #[test]
    fn test_rfc_vectors_at_every_split() {
        for wire in [MASKED_HELLO, UNMASKED_HELLO] {
            for split in 0..=wire.len() {
                let frames = decode_chunks(&mut decoder(), wire, &[split]).unwrap();
                assert_eq!(frames, [Frame::text("Hello")], "split at {split}");
            }
        }
    }

    #[test]
    fn test_byte_by_byte() {
        let splits: Vec<usize> = (1..MASKED_HELLO.len()).collect();
        let frames = decode_chunks(&mut decoder(), MASKED_HELLO, &splits).unwrap();
        assert_eq!(frames, [Frame::text("Hello")]);
    }

    #[test]
    fn test_fragmented_unmasked() {
        // RFC 6455 Section 5.7: "Hel" + "lo"
        let wire = b"\x01\x03\x48\x65\x6c\x80\x02\x6c\x6f";
        let mut decoder = decoder();
        let mut data = *wire;

        let mut input = Input::new(&mut data, true);
        assert!(matches!(
            decoder.decode(&mut input).unwrap(),
            Decode::Fragment(OpCode::Text)
        ));
        assert!(decoder.is_fragmented());
        assert!(matches!(
            decoder.decode(&mut input).unwrap(),
            Decode::Frame(Frame::Text(payload)) if payload == "Hello"
        ));
        assert!(!decoder.is_fragmented());
    }

    #[test]
    fn test_ping_between_fragments() {
        let wire = b"\x01\x03Hel\x89\x05Hello\x80\x02lo";
        let frames = decode_all(wire).unwrap();
        assert_eq!(
            frames,
            [Frame::Ping(Bytes::from_static(b"Hello")), Frame::text("Hello")]
        );
    }

    #[test]
    fn test_extended_lengths() {
        for len in [126usize, 65535, 65536] {
            let mut wire = vec![0x82];
            if len < 65536 {
                wire.push(126);
                wire.extend_from_slice(&(len as u16).to_be_bytes());
            } else {
                wire.push(127);
                wire.extend_from_slice(&(len as u64).to_be_bytes());
            }
            wire.extend(std::iter::repeat(0xab).take(len));

            let frames = decode_chunks(&mut decoder(), &wire, &[1, 3, 7]).unwrap();
            assert_eq!(frames, [Frame::binary(vec![0xab; len])]);
        }
    }

    #[test]
    fn test_empty_frames() {
        let frames = decode_all(b"\x81\x00\x82\x80\x01\x02\x03\x04\x88\x00").unwrap();
        assert_eq!(
            frames,
            [
                Frame::text(""),
                Frame::binary(""),
                Frame::Close(None)
            ]
        );
    }

    #[test]
    fn test_close_frame() {
        let frames = decode_all(b"\x88\x04\x03\xe8ok").unwrap();
        assert_eq!(frames, [Frame::close(CloseCode::Normal, "ok")]);

        assert!(matches!(
            decode_all(b"\x88\x01\x03"),
            Err(WebSocketError::InvalidCloseFrame)
        ));
        assert!(matches!(
            decode_all(b"\x88\x02\x03\xee"),
            Err(WebSocketError::InvalidCloseCode)
        ));
    }

    #[test]
    fn test_fragmented_ping_rejected() {
        assert!(matches!(
            decode_all(b"\x09\x00"),
            Err(WebSocketError::ControlFrameFragmented)
        ));
    }

    #[test]
    fn test_error_is_terminal() {
        let mut decoder = decoder();
        // a fragmented ping, whose length and payload read like a text frame
        let mut wire = *b"\x09\x81\x01\x41";
        let mut input = Input::new(&mut wire, false);
        assert!(matches!(
            decoder.decode(&mut input),
            Err(WebSocketError::ControlFrameFragmented)
        ));
        assert_eq!(input.position(), 1);

        let mut rest = *b"\x81\x01\x41";
        let mut input = Input::new(&mut rest, false);
        assert!(matches!(
            decoder.decode(&mut input),
            Err(WebSocketError::ControlFrameFragmented)
        ));
        assert_eq!(input.position(), 0);

        // a well formed frame is refused as well
        let mut wire = UNMASKED_HELLO.to_vec();
        let mut input = Input::new(&mut wire, true);
        assert!(matches!(
            decoder.decode(&mut input),
            Err(WebSocketError::ControlFrameFragmented)
        ));
        assert!(!decoder.is_fragmented());
    }

    #[test]
    fn test_payload_error_is_terminal() {
        let options = Options::default().with_utf8();
        let mut decoder = FrameDecoder::new(Role::Server, &options).unwrap();
        assert!(matches!(
            decode_chunks(&mut decoder, b"\x01\x02\xc3\x28", &[]),
            Err(WebSocketError::InvalidUTF8)
        ));
        assert!(matches!(
            decode_chunks(&mut decoder, b"\x80\x01a", &[]),
            Err(WebSocketError::InvalidUTF8)
        ));
    }

    #[test]
    fn test_protocol_violations() {
        let cases: [(&[u8], fn(&WebSocketError) -> bool); 8] = [
            (b"\x83\x00", |e| matches!(e, WebSocketError::InvalidOpCode(3))),
            (b"\x80\x00", |e| matches!(e, WebSocketError::InvalidContinuationFrame)),
            (b"\x01\x00\x81\x00", |e| matches!(e, WebSocketError::InvalidFragment)),
            (b"\xa1\x00", |e| matches!(e, WebSocketError::ReservedBitsNotZero)),
            (b"\xc9\x00", |e| matches!(e, WebSocketError::ReservedBitsNotZero)),
            (b"\xc1\x00", |e| matches!(e, WebSocketError::CompressionNotSupported)),
            (b"\x89\x7e\x00\x7e", |e| matches!(e, WebSocketError::ControlFrameTooLarge)),
            (
                b"\x82\x7f\x80\x00\x00\x00\x00\x00\x00\x00",
                |e| matches!(e, WebSocketError::InvalidPayloadLength),
            ),
        ];

        for (wire, check) in cases {
            let err = decode_all(wire).unwrap_err();
            assert!(check(&err), "{wire:?}: {err:?}");
        }
    }

    #[test]
    fn test_incomplete() {
        assert!(matches!(
            decode_all(&MASKED_HELLO[..8]),
            Err(WebSocketError::IncompleteFrame)
        ));
        assert!(matches!(
            decode_all(&MASKED_HELLO[..1]),
            Err(WebSocketError::IncompleteFrame)
        ));
        assert!(matches!(
            decode_all(b"\x01\x01H"),
            Err(WebSocketError::IncompleteMessage)
        ));
        assert!(decode_all(b"").unwrap().is_empty());
    }

    #[test]
    fn test_frame_too_large() {
        let options = Options::default().with_max_frame_size(4);
        let mut decoder = FrameDecoder::new(Role::Server, &options).unwrap();
        // fails on the header alone, before any payload byte
        let mut wire = *b"\x82\x05";
        let mut input = Input::new(&mut wire, false);
        assert!(matches!(
            decoder.decode(&mut input),
            Err(WebSocketError::FrameTooLarge)
        ));
    }

    #[test]
    fn test_message_too_large() {
        let options = Options::default()
            .with_max_frame_size(4)
            .with_max_message_size(6);
        let mut decoder = FrameDecoder::new(Role::Server, &options).unwrap();
        assert!(matches!(
            decode_chunks(&mut decoder, b"\x02\x04abcd\x80\x04efgh", &[]),
            Err(WebSocketError::MessageTooLarge)
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let options = Options::default().with_utf8();
        let mut decoder = FrameDecoder::new(Role::Server, &options).unwrap();
        assert!(matches!(
            decode_chunks(&mut decoder, b"\x81\x02\xc3\x28", &[]),
            Err(WebSocketError::InvalidUTF8)
        ));

        // a code point split across two frames is fine
        let mut decoder = FrameDecoder::new(Role::Server, &options).unwrap();
        let frames = decode_chunks(&mut decoder, b"\x01\x01\xc3\x80\x01\xa9", &[]).unwrap();
        assert_eq!(frames, [Frame::text("é")]);
    }

    #[test]
    fn test_compressed_rfc7692() {
        let options = Options::default().with_compression(DeflateOptions::default());
        let wire = b"\xc1\x07\xf2\x48\xcd\xc9\xc9\x07\x00\xc1\x05\xf2\x00\x11\x00\x00";

        for split in 0..=wire.len() {
            let mut decoder = FrameDecoder::new(Role::Client, &options).unwrap();
            let frames = decode_chunks(&mut decoder, wire, &[split]).unwrap();
            assert_eq!(frames, [Frame::text("Hello"), Frame::text("Hello")]);
        }
    }

    #[test]
    fn test_compressed_fragments() {
        // RFC 7692 Section 7.2.3.1: a compressed message split over two frames
        let options = Options::default().with_compression(DeflateOptions::default());
        let mut decoder = FrameDecoder::new(Role::Client, &options).unwrap();
        let wire = b"\x41\x03\xf2\x48\xcd\x80\x04\xc9\xc9\x07\x00";
        let frames = decode_chunks(&mut decoder, wire, &[]).unwrap();
        assert_eq!(frames, [Frame::text("Hello")]);
    }

    #[test]
    fn test_compressed_continuation_rejected() {
        let options = Options::default().with_compression(DeflateOptions::default());
        let mut decoder = FrameDecoder::new(Role::Client, &options).unwrap();
        let wire = b"\x41\x03\xf2\x48\xcd\xc0\x04\xc9\xc9\x07\x00";
        assert!(matches!(
            decode_chunks(&mut decoder, wire, &[]),
            Err(WebSocketError::ReservedBitsNotZero)
        ));
    }

    #[test]
    fn test_custom_payload() {
        /// Counts payload bytes and refuses anything past a limit.
        struct Counter(usize);

        impl PayloadDecoder for Counter {
            type Output = usize;

            fn decode(&mut self, chunk: &[u8]) -> Result<usize> {
                let accepted = chunk.len().min(4 - self.0);
                self.0 += accepted;
                Ok(accepted)
            }

            fn finish(self) -> Result<usize> {
                Ok(self.0)
            }
        }

        struct Counting;

        impl DecodePayload for Counting {
            type Decoder = Counter;

            fn payload_decoder(&mut self, _: OpCode) -> Counter {
                Counter(0)
            }
        }

        let mut decoder =
            FrameDecoder::with_payload(Role::Server, &Options::default(), Counting).unwrap();

        let mut wire = *b"\x82\x03abc";
        let mut input = Input::new(&mut wire, true);
        assert!(matches!(
            decoder.decode(&mut input).unwrap(),
            Decode::Frame(Frame::Binary(3))
        ));

        let mut wire = *b"\x82\x05abcde";
        let mut input = Input::new(&mut wire, true);
        assert!(matches!(
            decoder.decode(&mut input),
            Err(WebSocketError::UndecodedPayload)
        ));
    }
}

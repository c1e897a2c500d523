//! Resumable frame encoder.
//!
//! The length of a data frame is only known once its payload has been written, yet the header
//! comes first. [`FrameEncoder`] reserves the largest header the remaining output could
//! need, lets the payload (or the deflate context) fill the space behind it, then moves the
//! payload back against the real header and masks it. A message that does not fit is split
//! into several wire frames, one per output buffer.
use bytes::Bytes;

use crate::{
    buffer::Output,
    compression::Compressor,
    frame::{self, Frame, OpCode, MASK_SIZE},
    mask::apply_mask,
    options::{Options, Role},
    payload::{EncodePayload, PayloadEncoder},
    Result, WebSocketError,
};

/// Outcome of a [`FrameEncoder`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encode {
    /// The output is full; hand its bytes to the transport and call
    /// [`FrameEncoder::resume`] with a fresh one.
    Pending,
    /// The frame was fully written.
    Done,
}

/// How outgoing frames are masked.
#[derive(Debug, Clone, Copy)]
enum Masking {
    Unmasked,
    /// A fresh random key for every wire frame.
    Random,
    Fixed([u8; MASK_SIZE]),
}

impl Masking {
    #[inline]
    fn is_masked(self) -> bool {
        !matches!(self, Self::Unmasked)
    }

    fn next_key(self) -> Option<[u8; MASK_SIZE]> {
        match self {
            Self::Unmasked => None,
            Self::Random => Some(rand::random()),
            Self::Fixed(key) => Some(key),
        }
    }
}

/// A message being written.
struct Message {
    /// Opcode of the next wire frame.
    opcode: OpCode,
    source: Box<dyn PayloadEncoder + Send>,
    compressed: bool,
    /// No wire frame of the message was written yet.
    first: bool,
}

/// A frame that did not fit in the previous output.
enum Pending {
    Control { opcode: OpCode, payload: Bytes },
    Message(Message),
}

/// What one attempt at writing a wire frame achieved.
enum Step {
    /// The final frame of the message was written.
    Done,
    /// A non-final frame was written.
    Written,
    /// Nothing could be written.
    Stalled,
}

/// Size of the header to reserve in front of a payload that may fill `available` bytes.
#[inline]
fn reserved_head_size(available: usize, masked: bool) -> usize {
    let size = if available < 126 {
        2
    } else if available < 65536 {
        4
    } else {
        10
    };
    size + masked as usize * MASK_SIZE
}

/// Encodes frames into output buffers of arbitrary size.
///
/// One frame is encoded at a time: after [`FrameEncoder::encode`] returns
/// [`Encode::Pending`], the frame must be finished with [`FrameEncoder::resume`] before the
/// next one is accepted.
///
/// A frame refused before any of it is written leaves the encoder as it was. Once writing a
/// frame fails, every later call fails with the same error.
pub struct FrameEncoder {
    masking: Masking,
    compressor: Option<Compressor>,
    pending: Option<Pending>,
    /// Error that stopped the encoder.
    failed: Option<WebSocketError>,
}

impl FrameEncoder {
    /// Creates an encoder for an endpoint of the given role; clients mask their frames.
    pub fn new(role: Role, options: &Options) -> Result<Self> {
        let compressor = options
            .compression
            .as_ref()
            .map(|compression| compression.compressor(role))
            .transpose()?;

        Ok(Self {
            masking: match role {
                Role::Client => Masking::Random,
                Role::Server => Masking::Unmasked,
            },
            compressor,
            pending: None,
            failed: None,
        })
    }

    /// Masks every frame with `key` instead of a random one.
    pub fn with_mask_key(self, key: [u8; MASK_SIZE]) -> Self {
        Self {
            masking: Masking::Fixed(key),
            ..self
        }
    }

    /// Whether no frame is waiting to be finished.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Starts encoding `frame` into `output`.
    ///
    /// Control frames are written whole or not at all. Data frames are written as a single
    /// wire frame when the output has room for the entire payload, and are split into
    /// continuation frames otherwise.
    ///
    /// Close frames with a status code that may not be sent, and control payloads over 125
    /// bytes, are refused before anything is written.
    pub fn encode<T: EncodePayload>(
        &mut self,
        frame: Frame<T>,
        output: &mut Output<'_>,
    ) -> Result<Encode> {
        if let Some(err) = &self.failed {
            return Err(err.replay());
        }
        if self.pending.is_some() {
            return Err(WebSocketError::EncoderBusy);
        }

        let opcode = frame.opcode();
        let pending = match frame {
            Frame::Text(payload) | Frame::Binary(payload) => Pending::Message(Message {
                opcode,
                source: Box::new(payload.into_encoder()),
                compressed: self.compressor.is_some(),
                first: true,
            }),
            Frame::Close(close) => {
                if close.as_ref().is_some_and(|close| !close.code.is_allowed()) {
                    return Err(WebSocketError::InvalidCloseCode);
                }
                Pending::Control {
                    opcode,
                    payload: close.map(|close| close.to_payload()).unwrap_or_default(),
                }
            }
            Frame::Ping(payload) | Frame::Pong(payload) => Pending::Control { opcode, payload },
        };

        if let Pending::Control { payload, .. } = &pending {
            if payload.len() > frame::MAX_CONTROL_PAYLOAD {
                return Err(WebSocketError::ControlFrameTooLarge);
            }
        }

        self.pending = Some(pending);
        self.resume(output)
    }

    /// Continues writing the frame left unfinished by the previous call.
    ///
    /// Returns [`Encode::Done`] straight away when there is nothing left to write. Fails with
    /// [`WebSocketError::BufferTooSmall`] when nothing fits in an empty `output`.
    pub fn resume(&mut self, output: &mut Output<'_>) -> Result<Encode> {
        if let Some(err) = &self.failed {
            return Err(err.replay());
        }

        let res = self.write(output);
        if let Err(err) = &res {
            #[cfg(feature = "logging")]
            log::debug!("frame encoding failed: {err}");

            self.pending = None;
            self.failed = Some(err.replay());
        }

        res
    }

    fn write(&mut self, output: &mut Output<'_>) -> Result<Encode> {
        match self.pending.take() {
            None => Ok(Encode::Done),
            Some(Pending::Control { opcode, payload }) => {
                let size = frame::head_size(payload.len(), self.masking.is_masked()) + payload.len();
                if size > output.remaining() {
                    self.pending = Some(Pending::Control { opcode, payload });
                    return self.stalled(output);
                }

                let mask = self.masking.next_key();
                let dst = output.unfilled_mut();
                let head = frame::fmt_head(dst, true, false, opcode, mask, payload.len());
                let body = &mut dst[head..head + payload.len()];
                body.copy_from_slice(&payload);
                if let Some(key) = mask {
                    apply_mask(body, key, 0);
                }
                output.advance(head + payload.len());

                Ok(Encode::Done)
            }
            Some(Pending::Message(mut message)) => loop {
                match self.write_message(&mut message, output)? {
                    Step::Done => return Ok(Encode::Done),
                    Step::Written => continue,
                    Step::Stalled => {
                        self.pending = Some(Pending::Message(message));
                        return self.stalled(output);
                    }
                }
            },
        }
    }

    fn stalled(&self, output: &Output<'_>) -> Result<Encode> {
        if output.is_empty() {
            Err(WebSocketError::BufferTooSmall)
        } else {
            Ok(Encode::Pending)
        }
    }

    /// Writes one wire frame of `message`.
    fn write_message(&mut self, message: &mut Message, output: &mut Output<'_>) -> Result<Step> {
        let available = output.remaining();
        let reserved = reserved_head_size(available, self.masking.is_masked());
        if available < reserved {
            return Ok(Step::Stalled);
        }

        let dst = output.unfilled_mut();
        let produced = match self.compressor.as_mut() {
            Some(compressor) if message.compressed => {
                compressor.fill(&mut message.source, &mut dst[reserved..])?
            }
            _ => message.source.encode(&mut dst[reserved..])?,
        };

        let len = produced.written();
        let fin = produced.is_done();
        if len == 0 && !fin {
            return Ok(Step::Stalled);
        }

        let mask = self.masking.next_key();
        let head = frame::head_size(len, mask.is_some());
        if head < reserved {
            dst.copy_within(reserved..reserved + len, head);
        }
        if let Some(key) = mask {
            apply_mask(&mut dst[head..head + len], key, 0);
        }
        frame::fmt_head(
            dst,
            fin,
            message.compressed && message.first,
            message.opcode,
            mask,
            len,
        );
        output.advance(head + len);

        if fin {
            return Ok(Step::Done);
        }

        #[cfg(feature = "logging")]
        if message.first {
            log::trace!("splitting {:?} message across wire frames", message.opcode);
        }

        message.first = false;
        message.opcode = OpCode::Continuation;
        Ok(Step::Written)
    }
}

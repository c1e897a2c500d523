use crate::compression::{Compressor, Decompressor};

/// Compression level used by the deflate compressor.
pub type CompressionLevel = flate2::Compression;

/// The default maximum payload size of a single incoming frame (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// The default maximum size of a complete incoming message (2 MiB).
pub const MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;

/// The role an endpoint takes.
///
/// A client masks every frame it sends and expects unmasked frames from the server; a server
/// does the opposite. The role also picks which half of the negotiated deflate parameters
/// applies to each direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Configuration of a frame encoder and decoder pair.
///
/// ```rust
/// use wsframe::{CompressionLevel, Options};
///
/// let options = Options::default()
///     .with_compression_level(CompressionLevel::new(6))
///     .with_max_frame_size(64 * 1024)
///     .with_utf8();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Maximum payload size of an incoming frame, in bytes.
    ///
    /// Checked against the declared length, before any payload byte is read.
    ///
    /// Default: [`MAX_FRAME_SIZE`]
    pub max_frame_size: Option<usize>,

    /// Maximum size of an incoming message once reassembled and decompressed, in bytes.
    ///
    /// Default: [`MAX_MESSAGE_SIZE`], or twice `max_frame_size` if that is set.
    pub max_message_size: Option<usize>,

    /// permessage-deflate parameters, when the extension was negotiated.
    pub compression: Option<DeflateOptions>,

    /// Whether incoming text messages are checked to be valid UTF-8.
    ///
    /// Default: `false`
    pub check_utf8: bool,
}

/// Parameters of the permessage-deflate extension.
///
/// Parameters prefixed with `server_` govern what the server sends, and the `client_`
/// ones what the client sends.
///
/// # Memory Window Size
/// Window sizes only take effect with the `zlib` feature; the default backend always uses a
/// 15 bit window, which is enough to decompress anything but may exceed what a peer asked
/// for when compressing.
///
/// ```
/// use wsframe::{CompressionLevel, DeflateOptions};
///
/// let opts = DeflateOptions {
///     level: CompressionLevel::default(),
///     server_no_context_takeover: true,
///     ..Default::default()
/// };
/// assert_eq!(opts.to_string(), "permessage-deflate; server_no_context_takeover");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeflateOptions {
    /// Compression level of outgoing messages (0-9).
    pub level: CompressionLevel,

    /// LZ77 window of the server's compressor, 8-15 bits.
    pub server_max_window_bits: Option<u8>,

    /// LZ77 window of the client's compressor, 8-15 bits.
    pub client_max_window_bits: Option<u8>,

    /// The server resets its compression context after each message.
    pub server_no_context_takeover: bool,

    /// The client resets its compression context after each message.
    pub client_no_context_takeover: bool,
}

impl DeflateOptions {
    /// Builds the context compressing what `role` sends.
    pub(crate) fn compressor(&self, role: Role) -> crate::Result<Compressor> {
        let (no_context_takeover, window_bits) = match role {
            Role::Client => (self.client_no_context_takeover, self.client_max_window_bits),
            Role::Server => (self.server_no_context_takeover, self.server_max_window_bits),
        };

        #[cfg(feature = "logging")]
        log::debug!(
            "Established compressor for {role} with settings \
            no_context_takeover={no_context_takeover} max_window_bits={window_bits:?}"
        );

        #[cfg(feature = "zlib")]
        if let Some(window_bits) = window_bits {
            return Compressor::new_with_window_bits(self.level, window_bits, !no_context_takeover);
        }
        #[cfg(not(feature = "zlib"))]
        if let Some(window_bits) = window_bits {
            crate::compression::check_window_bits(window_bits)?;
        }

        Ok(if no_context_takeover {
            Compressor::no_context_takeover(self.level)
        } else {
            Compressor::new(self.level)
        })
    }

    /// Builds the context decompressing what the peer of `role` sends.
    pub(crate) fn decompressor(&self, role: Role) -> crate::Result<Decompressor> {
        let (no_context_takeover, window_bits) = match role {
            Role::Server => (self.client_no_context_takeover, self.client_max_window_bits),
            Role::Client => (self.server_no_context_takeover, self.server_max_window_bits),
        };

        #[cfg(feature = "logging")]
        log::debug!(
            "Established decompressor for {role} with settings \
            no_context_takeover={no_context_takeover} max_window_bits={window_bits:?}"
        );

        #[cfg(feature = "zlib")]
        if let Some(window_bits) = window_bits {
            return Decompressor::new_with_window_bits(window_bits, !no_context_takeover);
        }
        #[cfg(not(feature = "zlib"))]
        if let Some(window_bits) = window_bits {
            crate::compression::check_window_bits(window_bits)?;
        }

        Ok(if no_context_takeover {
            Decompressor::no_context_takeover()
        } else {
            Decompressor::new()
        })
    }
}

impl Options {
    /// Enables compression with the given level for outgoing messages.
    pub fn with_compression_level(self, level: CompressionLevel) -> Self {
        let mut compression = self.compression.unwrap_or_default();
        compression.level = level;

        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Sets the negotiated permessage-deflate parameters.
    pub fn with_compression(self, compression: DeflateOptions) -> Self {
        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Disables compression.
    pub fn without_compression(self) -> Self {
        Self {
            compression: None,
            ..self
        }
    }

    /// Sets the maximum payload size of an incoming frame.
    pub fn with_max_frame_size(self, size: usize) -> Self {
        Self {
            max_frame_size: Some(size),
            ..self
        }
    }

    /// Sets the maximum size of an incoming message.
    pub fn with_max_message_size(self, size: usize) -> Self {
        Self {
            max_message_size: Some(size),
            ..self
        }
    }

    /// Enables UTF-8 validation of incoming text messages.
    pub fn with_utf8(self) -> Self {
        Self {
            check_utf8: true,
            ..self
        }
    }

    /// Sets the LZ77 window of the client's compressor.
    pub fn with_client_max_window_bits(self, max_window_bits: u8) -> Self {
        let mut compression = self.compression.unwrap_or_default();
        compression.client_max_window_bits = Some(max_window_bits);
        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Sets the LZ77 window of the server's compressor.
    pub fn with_server_max_window_bits(self, max_window_bits: u8) -> Self {
        let mut compression = self.compression.unwrap_or_default();
        compression.server_max_window_bits = Some(max_window_bits);
        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Makes the server reset its compression context after each message.
    ///
    /// This corresponds to the `server_no_context_takeover` extension parameter.
    pub fn server_no_context_takeover(self) -> Self {
        let mut compression = self.compression.unwrap_or_default();
        compression.server_no_context_takeover = true;
        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Makes the client reset its compression context after each message.
    ///
    /// This corresponds to the `client_no_context_takeover` extension parameter.
    pub fn client_no_context_takeover(self) -> Self {
        let mut compression = self.compression.unwrap_or_default();
        compression.client_no_context_takeover = true;
        Self {
            compression: Some(compression),
            ..self
        }
    }

    pub(crate) fn frame_size_limit(&self) -> usize {
        self.max_frame_size.unwrap_or(MAX_FRAME_SIZE)
    }

    pub(crate) fn message_size_limit(&self) -> usize {
        self.max_message_size.unwrap_or_else(|| {
            self.max_frame_size
                .map_or(MAX_MESSAGE_SIZE, |size| size.saturating_mul(2))
        })
    }
}

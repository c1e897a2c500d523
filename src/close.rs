//! Close status codes, as listed in [RFC 6455 Section 7.4](https://datatracker.ietf.org/doc/html/rfc6455#section-7.4).

/// When closing an established connection an endpoint MAY indicate a reason for closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// The purpose for which the connection was established has been fulfilled.
    Normal,
    /// Server going down or a browser having navigated away from a page.
    Away,
    /// An endpoint is terminating the connection due to a protocol error.
    Protocol,
    /// It has received a type of data it cannot accept.
    Unsupported,
    /// MUST NOT be set as a status code in a Close control frame by an endpoint.
    ///
    /// No status code was actually present.
    Status,
    /// MUST NOT be set as a status code in a Close control frame by an endpoint.
    ///
    /// Connection was closed abnormally.
    Abnormal,
    /// Data within a message was not consistent with the type of the message.
    Invalid,
    /// Generic status code for when there is no other more suitable status code.
    Policy,
    /// Message that is too big for it to process.
    Size,
    /// The client expected the server to negotiate one or more extension.
    Extension,
    /// The server encountered an unexpected condition.
    Error,
    /// The server is restarting.
    Restart,
    /// The server is overloaded, try again later.
    Again,
    /// MUST NOT be set as a status code in a Close control frame by an endpoint.
    ///
    /// The connection was closed due to a failure to perform a TLS handshake.
    Tls,
    /// Codes registered with IANA (3000-3999).
    Iana(u16),
    /// Codes for private use (4000-4999).
    Library(u16),
    /// Any other code; these are reserved or out of range.
    Bad(u16),
}

impl CloseCode {
    /// Whether the code may be sent in a close frame.
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Status | Self::Abnormal | Self::Tls | Self::Bad(_))
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1002 => Self::Protocol,
            1003 => Self::Unsupported,
            1005 => Self::Status,
            1006 => Self::Abnormal,
            1007 => Self::Invalid,
            1008 => Self::Policy,
            1009 => Self::Size,
            1010 => Self::Extension,
            1011 => Self::Error,
            1012 => Self::Restart,
            1013 => Self::Again,
            1015 => Self::Tls,
            3000..=3999 => Self::Iana(code),
            4000..=4999 => Self::Library(code),
            _ => Self::Bad(code),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> u16 {
        match code {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::Protocol => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::Status => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::Invalid => 1007,
            CloseCode::Policy => 1008,
            CloseCode::Size => 1009,
            CloseCode::Extension => 1010,
            CloseCode::Error => 1011,
            CloseCode::Restart => 1012,
            CloseCode::Again => 1013,
            CloseCode::Tls => 1015,
            CloseCode::Iana(code) | CloseCode::Library(code) | CloseCode::Bad(code) => code,
        }
    }
}

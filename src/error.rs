//! Error handling for shuffled.
//!
//! A single crate-wide [`enum@Error`] covers transport failures, protocol
//! violations, and the authorization workflow. Server-reported failures
//! ([`Error::Server`]) keep the numeric MPD error code, so callers can tell
//! a rejected password apart from any other `ACK`.

use std::io;

use thiserror::Error;

/// Standard result type for shuffled operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure while dialing or talking to the server.
    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    /// The server replied with an `ACK` failure.
    ///
    /// `code` is the server's error code, e.g. `3` for an incorrect
    /// password or `4` for a command the session may not run.
    #[error("mpd server error {code}: {message}")]
    Server {
        /// Numeric MPD `ACK` error code.
        code: u32,
        /// Human-readable message sent by the server.
        message: String,
    },

    /// The server sent something we could not parse.
    #[error("malformed server response: {0}")]
    Protocol(String),

    /// The session lacks required commands, even after applying a password.
    #[error("not authorized to run required commands: {}", .missing.join(", "))]
    Unauthorized {
        /// Required commands the session may not run.
        missing: Vec<String>,
    },

    /// A rule pattern named a tag that MPD does not know about.
    #[error("unknown tag \"{0}\"")]
    UnknownTag(String),
}

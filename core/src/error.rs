//! Error types for the postback client.
//!
//! # Design
//! Validation errors (`IndexOutOfRange`, `SlotAlreadySet`,
//! `MissingClickId`) are raised before anything touches the network and
//! surface identically in live and dry-run mode. `UnexpectedStatus`
//! keeps both the status code and the raw response body because the
//! tracker reports rejection reasons only in the body text. Nothing in
//! this layer retries.

use std::fmt;

/// Errors returned by the event collection, request builder, and client.
#[derive(Debug)]
pub enum PostbackError {
    /// Event index is outside the tracker's `0..30` window.
    IndexOutOfRange { index: u8 },

    /// The event slot is already occupied and the write was not forced.
    SlotAlreadySet { index: u8 },

    /// A request was built with an empty click identifier.
    MissingClickId,

    /// Connection, DNS, timeout, or body-read failure in the transport.
    Transport(String),

    /// The tracker answered with a status other than 200.
    UnexpectedStatus { status: u16, body: String },

    /// The operation exists in the tracker API but is not implemented
    /// by this client.
    Unsupported(&'static str),
}

impl fmt::Display for PostbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostbackError::IndexOutOfRange { index } => {
                write!(f, "event index {index} out of range, max 29")
            }
            PostbackError::SlotAlreadySet { index } => {
                write!(f, "event {index} already set")
            }
            PostbackError::MissingClickId => write!(f, "click id is empty"),
            PostbackError::Transport(msg) => write!(f, "transport error: {msg}"),
            PostbackError::UnexpectedStatus { status, body } => {
                write!(f, "unexpected status {status}: {body}")
            }
            PostbackError::Unsupported(op) => write!(f, "{op} is not supported"),
        }
    }
}

impl std::error::Error for PostbackError {}

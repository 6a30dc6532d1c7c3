//! Error types for ipbus-transactor.
//!
//! Rejected packets and engine faults are *not* errors: they are normal
//! per-packet outcomes (see [`crate::transactor::PacketOutcome`]). This enum
//! covers everything around the state machine that can genuinely fail.

use thiserror::Error;

/// Main error type for all transactor operations.
#[derive(Debug, Error)]
pub enum TransactorError {
    /// I/O error while reading or writing traces.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config and traces).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Buffer access outside the addressable range.
    #[error("Address {address:#x} out of range for buffer of {capacity} words")]
    AddressOutOfRange { address: u32, capacity: usize },

    /// Configuration rejected by validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Malformed word or byte stream (wrong length, truncated packet, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The driver ran out of ticks before the packet reached `Done`.
    #[error("Packet not finished after {0} ticks")]
    TickLimit(u64),

    /// The service task has shut down.
    #[error("Transactor service closed")]
    ServiceClosed,
}

/// Result type alias using TransactorError.
pub type Result<T> = std::result::Result<T, TransactorError>;

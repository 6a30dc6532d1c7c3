//! Transactor configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```
//! use ipbus_transactor::config::TransactorConfig;
//!
//! let config = TransactorConfig::from_json_str(r#"{ "addr_width": 10 }"#).unwrap();
//! assert_eq!(config.addr_width, 10);
//! assert_eq!(config.initial_expected_id, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransactorError};

/// Default buffer address width in bits (4096 words per buffer).
pub const DEFAULT_ADDR_WIDTH: u8 = 12;

/// Widest supported buffer address.
pub const MAX_ADDR_WIDTH: u8 = 24;

/// Default watchdog for driving a single packet.
pub const DEFAULT_MAX_TICKS_PER_PACKET: u64 = 1 << 20;

/// Default depth of the service request queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration shared by the transactor, driver and service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactorConfig {
    /// Buffer address bits. Read and write addresses wrap modulo `2^addr_width`.
    pub addr_width: u8,
    /// Ticks the driver allows one packet before giving up.
    pub max_ticks_per_packet: u64,
    /// Record a per-tick trace while driving packets.
    pub record_trace: bool,
    /// Bounded queue depth in front of the service task.
    pub channel_capacity: usize,
    /// Value NextExpectedId takes at reset.
    pub initial_expected_id: u16,
}

impl Default for TransactorConfig {
    fn default() -> Self {
        Self {
            addr_width: DEFAULT_ADDR_WIDTH,
            max_ticks_per_packet: DEFAULT_MAX_TICKS_PER_PACKET,
            record_trace: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            initial_expected_id: 1,
        }
    }
}

impl TransactorConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.addr_width == 0 || self.addr_width > MAX_ADDR_WIDTH {
            return Err(TransactorError::InvalidConfig(format!(
                "addr_width {} not in 1..={}",
                self.addr_width, MAX_ADDR_WIDTH
            )));
        }

        if self.max_ticks_per_packet == 0 {
            return Err(TransactorError::InvalidConfig(
                "max_ticks_per_packet must be non-zero".to_string(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(TransactorError::InvalidConfig(
                "channel_capacity must be non-zero".to_string(),
            ));
        }

        if self.initial_expected_id == 0 {
            return Err(TransactorError::InvalidConfig(
                "initial_expected_id 0 is reserved".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of words each buffer holds.
    #[inline]
    pub fn buffer_words(&self) -> usize {
        1usize << self.addr_width
    }

    /// Mask applied to read and write addresses.
    ///
    /// Widths of 32 bits or more give the full mask rather than overflowing.
    #[inline]
    pub fn addr_mask(&self) -> u32 {
        let width = u32::from(self.addr_width).min(u32::BITS);
        u32::MAX.checked_shr(u32::BITS - width).unwrap_or(0)
    }
}

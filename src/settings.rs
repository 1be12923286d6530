//! Client settings
//!
//! Tunables the connection layer applies when constructing frames. Kept
//! serde-friendly so callers can load them from their own config files.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Default chunk size for draining a frame's byte source (64 KiB)
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Client core settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Upper bound on a single read while materializing a frame payload.
    /// The final read of a frame is smaller when less than a full chunk
    /// remains.
    pub read_chunk_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(ClientError::config("read_chunk_size must be non-zero"));
        }
        Ok(())
    }
}

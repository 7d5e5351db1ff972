//! Configuration for segmentlog
//!
//! Centralized configuration with sensible defaults.

use crate::error::{LogError, Result};
use crate::storage::ENTRY_WIDTH;

/// Size limit applied when a configured limit is left at zero.
///
/// Deliberately small: useful for tests and illustration, not production capacity.
pub const DEFAULT_MAX_BYTES: u64 = 1024;

/// Main configuration for a log instance
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Per-segment size limits and bootstrap offset
    pub segment: SegmentConfig,

    /// How index files are trusted when a segment is reopened
    pub index_recovery: IndexRecovery,
}

/// Segment sizing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Rotate once the store file reaches this many bytes
    pub max_store_bytes: u64,

    /// Rotate once the index reaches this many bytes; also the size the
    /// index file is pre-allocated and mapped to. Rounded down to whole entries.
    pub max_index_bytes: u64,

    /// Base offset of the first segment when bootstrapping an empty directory
    pub initial_offset: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: DEFAULT_MAX_BYTES,
            max_index_bytes: DEFAULT_MAX_BYTES,
            initial_offset: 0,
        }
    }
}

impl SegmentConfig {
    /// Usable index capacity in bytes (whole entries only)
    pub fn index_capacity(&self) -> u64 {
        self.max_index_bytes - self.max_index_bytes % ENTRY_WIDTH
    }
}

/// Index recovery mode on segment open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexRecovery {
    /// Take the on-disk length as the entry count.
    ///
    /// An index left pre-allocated by an unclean shutdown is not detected
    /// and will read as zero-valued entries.
    #[default]
    Trust,

    /// Scan entries and truncate at the first one that cannot be valid
    /// (zero padding, out-of-order offset, or a position past the store end).
    Scan,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Replace zero size limits with [`DEFAULT_MAX_BYTES`] and validate
    pub fn with_defaults(mut self) -> Result<Self> {
        if self.segment.max_store_bytes == 0 {
            self.segment.max_store_bytes = DEFAULT_MAX_BYTES;
        }
        if self.segment.max_index_bytes == 0 {
            self.segment.max_index_bytes = DEFAULT_MAX_BYTES;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that the limits describe a usable segment
    pub fn validate(&self) -> Result<()> {
        if self.segment.max_store_bytes == 0 {
            return Err(LogError::Config("max_store_bytes must be non-zero".to_string()));
        }
        if self.segment.max_index_bytes < ENTRY_WIDTH {
            return Err(LogError::Config(format!(
                "max_index_bytes must hold at least one {}-byte entry, got {}",
                ENTRY_WIDTH, self.segment.max_index_bytes
            )));
        }
        if usize::try_from(self.segment.max_index_bytes).is_err() {
            return Err(LogError::Config(format!(
                "max_index_bytes {} does not fit in memory",
                self.segment.max_index_bytes
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store rotation threshold (in bytes)
    pub fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_store_bytes = bytes;
        self
    }

    /// Set the index rotation threshold and pre-allocation size (in bytes)
    pub fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_index_bytes = bytes;
        self
    }

    /// Set the base offset used when bootstrapping an empty log
    pub fn initial_offset(mut self, offset: u64) -> Self {
        self.config.segment.initial_offset = offset;
        self
    }

    /// Set the index recovery mode
    pub fn index_recovery(mut self, mode: IndexRecovery) -> Self {
        self.config.index_recovery = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

//! Battery-backed key/value area.
//!
//! A few hundred bytes of backup SRAM survive power-off as long as the coin
//! cell / main battery holds. Items are addressed by a fixed key and carry a
//! visibility class. Everything the firmware keeps there today is public.

/// Keys of the items stored in backup RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackupRamKey {
    /// Battery temperature extremes.
    Telemetry,
}

impl BackupRamKey {
    /// On-media item identifier.
    pub const fn id(self) -> u16 {
        match self {
            Self::Telemetry => 0x0001,
        }
    }
}

/// Who may read an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ItemVisibility {
    /// Readable from the application.
    Public,
}

/// Backup RAM access.
pub trait BackupRam {
    /// Backend error type.
    type Error: core::fmt::Debug;

    /// Copy item `key` into `buf`.
    ///
    /// Returns `Ok(None)` if the item does not exist, otherwise the stored
    /// item length. A stored length larger than `buf` still reports the
    /// stored length; only `buf.len()` bytes are copied.
    fn read(&mut self, key: BackupRamKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Create or replace item `key`.
    fn write(
        &mut self,
        key: BackupRamKey,
        visibility: ItemVisibility,
        data: &[u8],
    ) -> Result<(), Self::Error>;
}

//! Secure storage seams
//!
//! The encrypted PIN-protected storage is an external library. Bringing it up
//! needs a device-unique salt and a callback the storage invokes while it
//! runs the slow PIN key-derivation, so the UI can show progress.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::status::Status;

/// Maximum salt length accepted by the storage library.
pub const MAX_SALT_LEN: usize = 32;

/// Progress message shown while the storage works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageUiMessage {
    /// Keep the current text.
    NoMessage,
    /// PIN check in progress.
    VerifyingPin,
    /// Generic processing.
    Processing,
    /// Storage starting up.
    Starting,
    /// Last PIN attempt was wrong.
    WrongPin,
}

/// PIN UI progress callback.
///
/// `wait` is the remaining time in seconds, `progress` is in permille.
/// Returning `true` asks the storage to abort the operation.
pub type PinUiWaitCallback = fn(wait: u32, progress: u32, message: StorageUiMessage) -> bool;

/// Device-unique storage salt.
///
/// Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StorageSalt {
    bytes: [u8; MAX_SALT_LEN],
    len: usize,
}

impl StorageSalt {
    /// Empty salt.
    pub const fn new() -> Self {
        Self {
            bytes: [0; MAX_SALT_LEN],
            len: 0,
        }
    }

    /// Copy `data` into a new salt.
    ///
    /// Returns `None` if `data` is longer than [`MAX_SALT_LEN`].
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let mut salt = Self::new();
        salt.bytes.get_mut(..data.len())?.copy_from_slice(data);
        salt.len = data.len();
        Some(salt)
    }

    /// Salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or(&[])
    }

    /// `true` once the salt has been wiped (or was never filled).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for StorageSalt {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for StorageSalt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StorageSalt")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Source of the device-unique salt (OTP / secret sector).
pub trait SaltSource {
    /// Produce the salt.
    fn storage_salt(&mut self) -> Result<StorageSalt, Status>;
}

/// The encrypted storage library.
pub trait SecureStorage {
    /// Initialise the storage with `salt`, reporting PIN progress through
    /// `callback`.
    fn init(&mut self, callback: Option<PinUiWaitCallback>, salt: &[u8]) -> Result<(), Status>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_rejects_oversized_input() {
        assert!(StorageSalt::from_slice(&[0u8; MAX_SALT_LEN + 1]).is_none());
        assert_eq!(
            StorageSalt::from_slice(&[7u8; 4]).map(|s| s.as_bytes().len()),
            Some(4)
        );
    }

    #[test]
    fn zeroize_clears_bytes_and_length() {
        let mut salt = StorageSalt::from_slice(&[0xA5; 16]).unwrap_or_default();
        salt.zeroize();
        assert!(salt.is_empty());
        assert!(salt.bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn debug_hides_salt_bytes() {
        let salt = StorageSalt::from_slice(&[0xA5; 2]).unwrap_or_default();
        let text = format!("{salt:?}");
        assert!(!text.contains("165"));
        assert!(text.contains("len: 2"));
    }
}

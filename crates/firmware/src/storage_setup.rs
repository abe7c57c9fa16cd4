//! Secure storage bring-up.
//!
//! The salt is held for exactly as long as the storage needs it and is
//! wiped before returning, on success and on failure alike. It is never
//! logged.

use platform::{PinUiWaitCallback, SaltSource, SecureStorage, Status};
use zeroize::Zeroize;

/// Read the device salt and initialise `storage` with it.
///
/// `callback` is forwarded to the storage for PIN progress reporting.
pub fn storage_setup<S, T>(
    salt_source: &mut S,
    storage: &mut T,
    callback: Option<PinUiWaitCallback>,
) -> Result<(), Status>
where
    S: SaltSource + ?Sized,
    T: SecureStorage + ?Sized,
{
    let mut salt = salt_source.storage_salt().map_err(|status| {
        error!("storage salt unavailable: {}", status.code());
        status
    })?;

    let result = storage.init(callback, salt.as_bytes());
    salt.zeroize();

    match result {
        Ok(()) => info!("secure storage ready"),
        Err(status) => error!("secure storage init failed: {}", status.code()),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::{MockSaltSource, MockSecureStorage};
    use platform::StorageUiMessage;

    fn ui(_wait: u32, _progress: u32, _message: StorageUiMessage) -> bool {
        false
    }

    #[test]
    fn storage_receives_salt_and_callback() {
        let mut source = MockSaltSource::new(&[0xA5; 16]);
        let mut storage = MockSecureStorage::new();

        assert_eq!(storage_setup(&mut source, &mut storage, Some(ui)), Ok(()));
        assert_eq!(source.reads(), 1);
        assert_eq!(storage.init_count(), 1);
        assert_eq!(storage.salt(), &[0xA5; 16]);
        assert!(storage.callback().is_some());
    }

    #[test]
    fn missing_callback_is_forwarded() {
        let mut source = MockSaltSource::new(&[1, 2, 3]);
        let mut storage = MockSecureStorage::new();

        assert_eq!(storage_setup(&mut source, &mut storage, None), Ok(()));
        assert!(storage.callback().is_none());
    }

    #[test]
    fn salt_failure_skips_storage() {
        let mut source = MockSaltSource::failing(Status::EIO);
        let mut storage = MockSecureStorage::new();

        assert_eq!(storage_setup(&mut source, &mut storage, Some(ui)), Err(Status::EIO));
        assert_eq!(storage.init_count(), 0);
    }

    #[test]
    fn storage_failure_is_propagated() {
        let mut source = MockSaltSource::new(&[7; 32]);
        let mut storage = MockSecureStorage::new();
        storage.set_fail(Some(Status::EACCES));

        assert_eq!(
            storage_setup(&mut source, &mut storage, None),
            Err(Status::EACCES)
        );
        assert_eq!(storage.init_count(), 1);
    }
}

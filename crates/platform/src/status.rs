//! Typed status codes.
//!
//! [`Status`] wraps an errno value so that subsystems can report *which*
//! failure happened without each inventing its own error enum at the
//! boundary. `Status::OK` is zero; every other value is an error.
//!
//! Unrecoverable conditions go through [`ensure_ok`] / [`ensure_true`], which
//! hand the caller's source location to a [`FatalErrorHandler`] (on the
//! device: show the error screen and shut down).

use core::panic::Location;

use crate::display::DisplayError;

/// errno-valued status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct Status(u32);

impl Status {
    /// Success.
    pub const OK: Self = Self(0);
    /// Operation not permitted.
    pub const EPERM: Self = Self(1);
    /// No such file or directory.
    pub const ENOENT: Self = Self(2);
    /// Input/output error.
    pub const EIO: Self = Self(5);
    /// Device not configured.
    pub const ENXIO: Self = Self(6);
    /// Argument list too long.
    pub const E2BIG: Self = Self(7);
    /// Cannot allocate memory.
    pub const ENOMEM: Self = Self(12);
    /// Permission denied.
    pub const EACCES: Self = Self(13);
    /// Bad address.
    pub const EFAULT: Self = Self(14);
    /// Device busy.
    pub const EBUSY: Self = Self(16);
    /// File exists.
    pub const EEXIST: Self = Self(17);
    /// Operation not supported by device.
    pub const ENODEV: Self = Self(19);
    /// Invalid argument.
    pub const EINVAL: Self = Self(22);
    /// No space left on device.
    pub const ENOSPC: Self = Self(28);
    /// Result too large.
    pub const ERANGE: Self = Self(34);
    /// Resource temporarily unavailable.
    pub const EAGAIN: Self = Self(35);
    /// Operation now in progress.
    pub const EINPROGRESS: Self = Self(36);
    /// Operation already in progress.
    pub const EALREADY: Self = Self(37);
    /// Message too long.
    pub const EMSGSIZE: Self = Self(40);
    /// Software caused connection abort.
    pub const ECONNABORTED: Self = Self(53);
    /// Operation timed out.
    pub const ETIMEDOUT: Self = Self(60);

    /// Wrap a raw code.
    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    /// Raw code.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// `true` for [`Status::OK`].
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// `true` for anything but [`Status::OK`].
    pub const fn is_err(self) -> bool {
        !self.is_ok()
    }

    /// `Ok(())` for [`Status::OK`], `Err(self)` otherwise.
    pub const fn into_result(self) -> Result<(), Status> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Symbolic name for known codes.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "OK",
            1 => "EPERM",
            2 => "ENOENT",
            5 => "EIO",
            6 => "ENXIO",
            7 => "E2BIG",
            12 => "ENOMEM",
            13 => "EACCES",
            14 => "EFAULT",
            16 => "EBUSY",
            17 => "EEXIST",
            19 => "ENODEV",
            22 => "EINVAL",
            28 => "ENOSPC",
            34 => "ERANGE",
            35 => "EAGAIN",
            36 => "EINPROGRESS",
            37 => "EALREADY",
            40 => "EMSGSIZE",
            53 => "ECONNABORTED",
            60 => "ETIMEDOUT",
            _ => return None,
        })
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "status {}", self.0),
        }
    }
}

impl From<Result<(), Status>> for Status {
    fn from(result: Result<(), Status>) -> Self {
        match result {
            Ok(()) => Self::OK,
            Err(status) => status,
        }
    }
}

impl From<DisplayError> for Status {
    fn from(err: DisplayError) -> Self {
        match err {
            DisplayError::NotInitialized => Self::EPERM,
            DisplayError::Timeout(_) => Self::ETIMEDOUT,
            DisplayError::PanelPower | DisplayError::Backlight => Self::ENODEV,
            DisplayError::SerialLink(_)
            | DisplayError::Compositor(_)
            | DisplayError::LinkStart(_)
            | DisplayError::Panel(_)
            | DisplayError::LineEvent(_) => Self::EIO,
        }
    }
}

// ---------------------------------------------------------------------------
// Fatal error path
// ---------------------------------------------------------------------------

/// Terminal error sink.
pub trait FatalErrorHandler {
    /// Report `msg` with its source location and never return.
    fn fatal_error(&self, msg: &str, file: &'static str, line: u32) -> !;
}

/// Stop through `handler` unless `status` is [`Status::OK`].
#[track_caller]
pub fn ensure_ok<H: FatalErrorHandler + ?Sized>(handler: &H, status: Status, msg: &str) {
    if status.is_err() {
        let caller = Location::caller();
        handler.fatal_error(msg, caller.file(), caller.line());
    }
}

/// Stop through `handler` unless `cond` holds.
#[track_caller]
pub fn ensure_true<H: FatalErrorHandler + ?Sized>(handler: &H, cond: bool, msg: &str) {
    if !cond {
        let caller = Location::caller();
        handler.fatal_error(msg, caller.file(), caller.line());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::display::{HalError, WaitCondition};

    struct PanicHandler;

    impl FatalErrorHandler for PanicHandler {
        fn fatal_error(&self, msg: &str, file: &'static str, line: u32) -> ! {
            panic!("{msg} at {file}:{line}");
        }
    }

    #[test]
    fn ok_is_zero() {
        assert_eq!(Status::OK.code(), 0);
        assert!(Status::OK.is_ok());
        assert!(Status::EIO.is_err());
    }

    #[test]
    fn errno_values_match_bsd_table() {
        assert_eq!(Status::EPERM.code(), 1);
        assert_eq!(Status::ENOENT.code(), 2);
        assert_eq!(Status::EIO.code(), 5);
        assert_eq!(Status::ETIMEDOUT.code(), 60);
    }

    #[test]
    fn equality_compares_codes() {
        assert_eq!(Status::from_code(5), Status::EIO);
        assert_ne!(Status::EIO, Status::EPERM);
    }

    #[test]
    fn display_uses_symbolic_name() {
        assert_eq!(Status::ENOENT.to_string(), "ENOENT");
        assert_eq!(Status::from_code(99).to_string(), "status 99");
    }

    #[test]
    fn result_round_trip() {
        assert_eq!(Status::OK.into_result(), Ok(()));
        assert_eq!(Status::EBUSY.into_result(), Err(Status::EBUSY));
        assert_eq!(Status::from(Err(Status::EBUSY)), Status::EBUSY);
    }

    #[test]
    fn display_errors_map_to_errno() {
        assert_eq!(Status::from(DisplayError::NotInitialized), Status::EPERM);
        assert_eq!(
            Status::from(DisplayError::Timeout(WaitCondition::VsyncActive)),
            Status::ETIMEDOUT
        );
        assert_eq!(
            Status::from(DisplayError::Compositor(HalError::Busy)),
            Status::EIO
        );
    }

    #[test]
    fn ensure_ok_passes_on_ok() {
        ensure_ok(&PanicHandler, Status::OK, "unreachable");
        ensure_true(&PanicHandler, true, "unreachable");
    }

    #[test]
    #[should_panic(expected = "storage locked")]
    fn ensure_ok_stops_on_error() {
        ensure_ok(&PanicHandler, Status::EACCES, "storage locked");
    }

    #[test]
    #[should_panic(expected = "status.rs")]
    fn ensure_true_reports_caller_location() {
        ensure_true(&PanicHandler, false, "invariant broken");
    }
}

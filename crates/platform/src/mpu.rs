//! MPU mode switching around interrupt service.
//!
//! The secure firmware runs each context with a narrow MPU layout (kernel
//! SRAM, storage, application, ...). Interrupt handlers that touch
//! peripheral handles must first switch to [`MpuMode::Default`] and put the
//! interrupted context's layout back before returning.
//!
//! [`MpuModeGuard`] makes the restore structural: it saves the previous mode
//! on entry and restores it on drop, on every exit path.

use core::ops::{Deref, DerefMut};

/// MPU region layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuMode {
    /// MPU off.
    Disabled,
    /// Kernel layout: peripherals and kernel RAM accessible.
    Default,
    /// Bootloader region writable for an update.
    BootUpdate,
    /// OTP area accessible.
    Otp,
    /// Main filesystem area accessible.
    FsMain,
    /// Auxiliary filesystem area accessible.
    FsAux,
    /// Secure storage area accessible.
    Storage,
    /// SAES peripheral accessible.
    Saes,
    /// Kernel SRAM accessible.
    KernelSram,
    /// Unused flash accessible (erase on update).
    UnusedFlash,
    /// Assets area accessible.
    Assets,
    /// Unprivileged application layout.
    App,
}

/// MPU layout switching.
pub trait MpuControl {
    /// Switch to `mode` and return the mode that was active before.
    fn mpu_reconfig(&mut self, mode: MpuMode) -> MpuMode;

    /// Switch back to a mode previously returned by [`Self::mpu_reconfig`].
    fn mpu_restore(&mut self, mode: MpuMode);
}

/// Scoped MPU mode switch.
///
/// Dereferences to the wrapped controller so the code inside the scope can
/// keep using it.
pub struct MpuModeGuard<'a, M: MpuControl + ?Sized> {
    inner: &'a mut M,
    saved: MpuMode,
}

impl<'a, M: MpuControl + ?Sized> MpuModeGuard<'a, M> {
    /// Switch `inner` to `mode` until the guard is dropped.
    pub fn enter(inner: &'a mut M, mode: MpuMode) -> Self {
        let saved = inner.mpu_reconfig(mode);
        Self { inner, saved }
    }

    /// Mode that will be restored on drop.
    pub fn saved(&self) -> MpuMode {
        self.saved
    }
}

impl<M: MpuControl + ?Sized> Deref for MpuModeGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.inner
    }
}

impl<M: MpuControl + ?Sized> DerefMut for MpuModeGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.inner
    }
}

impl<M: MpuControl + ?Sized> Drop for MpuModeGuard<'_, M> {
    fn drop(&mut self) {
        self.inner.mpu_restore(self.saved);
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    struct FakeMpu {
        mode: MpuMode,
        switches: u32,
    }

    impl MpuControl for FakeMpu {
        fn mpu_reconfig(&mut self, mode: MpuMode) -> MpuMode {
            self.switches += 1;
            core::mem::replace(&mut self.mode, mode)
        }

        fn mpu_restore(&mut self, mode: MpuMode) {
            self.switches += 1;
            self.mode = mode;
        }
    }

    #[test]
    fn guard_switches_and_restores() {
        let mut mpu = FakeMpu {
            mode: MpuMode::App,
            switches: 0,
        };
        {
            let guard = MpuModeGuard::enter(&mut mpu, MpuMode::Default);
            assert_eq!(guard.saved(), MpuMode::App);
            assert_eq!(guard.mode, MpuMode::Default);
        }
        assert_eq!(mpu.mode, MpuMode::App);
        assert_eq!(mpu.switches, 2);
    }

    #[test]
    fn nested_guards_unwind_in_order() {
        let mut mpu = FakeMpu {
            mode: MpuMode::KernelSram,
            switches: 0,
        };
        {
            let mut outer = MpuModeGuard::enter(&mut mpu, MpuMode::Default);
            {
                let inner = MpuModeGuard::enter(&mut *outer, MpuMode::Storage);
                assert_eq!(inner.saved(), MpuMode::Default);
            }
            assert_eq!(outer.mode, MpuMode::Default);
        }
        assert_eq!(mpu.mode, MpuMode::KernelSram);
    }
}

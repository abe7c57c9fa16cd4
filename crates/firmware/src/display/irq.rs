//! LTDC interrupt plumbing.
//!
//! The vector table cannot own the driver, so the driver is parked in a
//! [`SharedDisplay`] static and the two LTDC vectors borrow it for the length
//! of one handler:
//!
//! ```ignore
//! static DISPLAY: SharedDisplay<DisplayDriver<Board>> = SharedDisplay::new();
//!
//! #[interrupt]
//! fn LTDC() {
//!     DISPLAY.with(|d| d.on_line_interrupt());
//! }
//!
//! #[interrupt]
//! fn LTDC_ER() {
//!     DISPLAY.with(|d| d.on_error_interrupt());
//! }
//! ```
//!
//! Thread-mode code reaches the driver through the same cell, so every
//! access runs inside a critical section.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use platform::DisplayInterrupt;

/// STM32U5 vector positions of the two LTDC interrupts (RM0456 table
/// "STM32U5 series vector table").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum LtdcIrq {
    /// LTDC global interrupt (line event, register reload).
    Ltdc = 135,
    /// LTDC error interrupt (FIFO underrun, transfer error).
    LtdcEr = 136,
}

impl LtdcIrq {
    /// NVIC position.
    pub const fn number(self) -> u16 {
        self as u16
    }
}

impl From<DisplayInterrupt> for LtdcIrq {
    fn from(irq: DisplayInterrupt) -> Self {
        match irq {
            DisplayInterrupt::Line => Self::Ltdc,
            DisplayInterrupt::Error => Self::LtdcEr,
        }
    }
}

/// Driver cell shared between thread mode and the LTDC vectors.
pub struct SharedDisplay<D> {
    inner: CriticalSectionMutex<RefCell<Option<D>>>,
}

impl<D> SharedDisplay<D> {
    /// Empty cell, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionMutex::new(RefCell::new(None)),
        }
    }

    /// Park `driver` in the cell. Returns the driver it replaces.
    pub fn install(&self, driver: D) -> Option<D> {
        self.inner.lock(|cell| cell.replace(Some(driver)))
    }

    /// Remove the driver. Handlers that fire afterwards find the cell empty.
    pub fn take(&self) -> Option<D> {
        self.inner.lock(RefCell::take)
    }

    /// `true` while a driver is parked.
    pub fn is_installed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Run `f` on the driver inside a critical section.
    ///
    /// Returns `None` if no driver is installed or the cell is already
    /// borrowed further up the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> Option<R> {
        self.inner.lock(|cell| {
            let mut slot = cell.try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }
}

impl<D> Default for SharedDisplay<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// NVIC (hardware only)
// ---------------------------------------------------------------------------

#[cfg(feature = "hardware")]
pub use nvic::NvicController;

#[cfg(feature = "hardware")]
mod nvic {
    use cortex_m::interrupt::InterruptNumber;
    use cortex_m::peripheral::NVIC;
    use platform::{DisplayInterrupt, InterruptControl};

    use super::LtdcIrq;

    // SAFETY: the discriminants are the device's LTDC vector positions.
    unsafe impl InterruptNumber for LtdcIrq {
        fn number(self) -> u16 {
            LtdcIrq::number(self)
        }
    }

    /// [`InterruptControl`] over the Cortex-M33 NVIC.
    pub struct NvicController {
        nvic: NVIC,
    }

    impl NvicController {
        /// Take over the NVIC.
        pub fn new(nvic: NVIC) -> Self {
            Self { nvic }
        }
    }

    impl InterruptControl for NvicController {
        fn enable(&mut self, irq: DisplayInterrupt, priority: u8) {
            let irq = LtdcIrq::from(irq);
            // SAFETY: the LTDC handlers only touch the driver through
            // `SharedDisplay`, which masks interrupts, so unmasking cannot
            // break a critical section.
            unsafe {
                self.nvic.set_priority(irq, priority);
                NVIC::unmask(irq);
            }
        }

        fn disable(&mut self, irq: DisplayInterrupt) {
            NVIC::mask(LtdcIrq::from(irq));
        }
    }
}

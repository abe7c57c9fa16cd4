//! Display abstraction layer
//!
//! Collaborator traits the display sequencer drives (panel power, panel
//! command set, backlight, frame buffer, interrupt controller), the bundle
//! trait [`DisplayPlatform`] that names one concrete type for each, and the
//! shared error and wait-policy types.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

use crate::clock_config::ClockControl;
use crate::dsi::DsiHost;
use crate::ltdc::Ltdc;
use crate::mpu::MpuControl;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Status returned by a rejected register-layer configuration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Parameters rejected or peripheral reported an error.
    Error,
    /// Peripheral locked by another operation.
    Busy,
    /// Peripheral did not respond in time.
    Timeout,
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Error => write!(f, "HAL error"),
            Self::Busy => write!(f, "HAL busy"),
            Self::Timeout => write!(f, "HAL timeout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Hardware condition a bounded wait was blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitCondition {
    /// PLL3RDY to clear after PLL3ON was dropped.
    Pll3Unlocked,
    /// PLL3RDY to set after PLL3ON was raised.
    Pll3Locked,
    /// The current VSYNC pulse to end.
    VsyncInactive,
    /// The next VSYNC pulse to begin.
    VsyncActive,
}

/// Display bring-up and runtime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Operation requires an initialised display.
    NotInitialized,
    /// A bounded wait expired.
    Timeout(WaitCondition),
    /// Panel power / reset GPIO sequencing failed.
    PanelPower,
    /// Backlight driver failed to start.
    Backlight,
    /// DSI host configuration rejected.
    SerialLink(HalError),
    /// LTDC timing or layer configuration rejected.
    Compositor(HalError),
    /// DSI video-mode start rejected.
    LinkStart(HalError),
    /// Panel command bring-up failed.
    Panel(HalError),
    /// Line-event programming rejected.
    LineEvent(HalError),
}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Display not initialized"),
            Self::Timeout(WaitCondition::Pll3Unlocked) => {
                write!(f, "Timeout waiting for PLL3 to stop")
            }
            Self::Timeout(WaitCondition::Pll3Locked) => {
                write!(f, "Timeout waiting for PLL3 to lock")
            }
            Self::Timeout(WaitCondition::VsyncInactive) => {
                write!(f, "Timeout waiting for VSYNC to end")
            }
            Self::Timeout(WaitCondition::VsyncActive) => {
                write!(f, "Timeout waiting for VSYNC to start")
            }
            Self::PanelPower => write!(f, "Panel power sequencing failed"),
            Self::Backlight => write!(f, "Backlight initialization failed"),
            Self::SerialLink(e) => write!(f, "DSI host configuration failed: {e}"),
            Self::Compositor(e) => write!(f, "LTDC configuration failed: {e}"),
            Self::LinkStart(e) => write!(f, "DSI start failed: {e}"),
            Self::Panel(e) => write!(f, "Panel initialization failed: {e}"),
            Self::LineEvent(e) => write!(f, "Line event programming failed: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DisplayError {}

// ---------------------------------------------------------------------------
// Wait policy
// ---------------------------------------------------------------------------

/// Deadline used by [`WaitPolicy::default`].
///
/// Twice the 10 Hz frame period, so the two-edge VSYNC wait still fits at the
/// slowest refresh rate. PLL lock takes well under a millisecond.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(200);

/// How long busy-waits on hardware flags may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Spin until the flag changes. A stuck flag hangs the caller.
    Forever,
    /// Give up after this many polls.
    Polls(u32),
    /// Give up once this much time has passed (needs an embassy-time driver).
    Timeout(Duration),
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::Timeout(DEFAULT_WAIT_TIMEOUT)
    }
}

impl WaitPolicy {
    /// Poll `done` until it returns `true` or the policy gives up.
    ///
    /// `done` is always evaluated at least once.
    pub fn wait_for(
        self,
        condition: WaitCondition,
        mut done: impl FnMut() -> bool,
    ) -> Result<(), DisplayError> {
        match self {
            Self::Forever => {
                while !done() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            Self::Polls(max) => {
                for _ in 0..max.max(1) {
                    if done() {
                        return Ok(());
                    }
                    core::hint::spin_loop();
                }
                Err(DisplayError::Timeout(condition))
            }
            Self::Timeout(limit) => {
                let Some(deadline) = Instant::now().checked_add(limit) else {
                    return Self::Forever.wait_for(condition, done);
                };
                loop {
                    if done() {
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        return Err(DisplayError::Timeout(condition));
                    }
                    core::hint::spin_loop();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Interrupts
// ---------------------------------------------------------------------------

/// The two LTDC interrupt vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayInterrupt {
    /// LTDC global interrupt (line event, register reload).
    Line,
    /// LTDC error interrupt (FIFO underrun, transfer error).
    Error,
}

impl DisplayInterrupt {
    /// Both vectors, in enable order.
    pub const ALL: [Self; 2] = [Self::Line, Self::Error];
}

/// NVIC-level enable / disable of the display vectors.
pub trait InterruptControl {
    /// Set the priority and unmask the vector.
    fn enable(&mut self, irq: DisplayInterrupt, priority: u8);

    /// Mask the vector.
    fn disable(&mut self, irq: DisplayInterrupt);
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Panel supply and reset line sequencing.
pub trait PanelPower {
    /// GPIO error type.
    type Error: core::fmt::Debug;

    /// Switch the panel supply on and run the reset pulse.
    fn power_on(&mut self) -> Result<(), Self::Error>;

    /// Hold the panel in reset and switch its supply off.
    fn power_off(&mut self);
}

/// Panel-specific command bring-up, sent over the DSI link.
pub trait PanelInit {
    /// Send the panel's initialisation command sequence.
    fn init<L: DsiHost + ?Sized>(&mut self, link: &mut L) -> Result<(), HalError>;
}

/// Backlight driver.
pub trait Backlight {
    /// Driver error type.
    type Error: core::fmt::Debug;

    /// Start the driver with the backlight off.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Switch the backlight off and release the driver.
    fn deinit(&mut self);

    /// Current level, 0 = off.
    fn level(&self) -> u8;

    /// Set the level, 0 = off.
    fn set_level(&mut self, level: u8) -> Result<(), Self::Error>;
}

/// Placeholder for boards without a controllable backlight.
///
/// Uninhabited, so `Option<NoBacklight>` is always `None`.
#[derive(Debug)]
pub enum NoBacklight {}

impl Backlight for NoBacklight {
    type Error = core::convert::Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn deinit(&mut self) {
        match *self {}
    }

    fn level(&self) -> u8 {
        match *self {}
    }

    fn set_level(&mut self, _level: u8) -> Result<(), Self::Error> {
        match *self {}
    }
}

/// Frame buffer ownership.
pub trait FrameBufferManager {
    /// Allocate / clear the frame buffers and return the address the layer
    /// scans out first.
    fn init(&mut self) -> u32;

    /// Release the frame buffers.
    fn deinit(&mut self);

    /// Block until the frame last handed to the display has been scanned out.
    fn wait_refreshed(&mut self);
}

// ---------------------------------------------------------------------------
// Platform bundle
// ---------------------------------------------------------------------------

/// One concrete type for every collaborator of the display sequencer.
pub trait DisplayPlatform {
    /// RCC, DSI host, LTDC and MPU register layer.
    type Hal: ClockControl + DsiHost + Ltdc + MpuControl;
    /// NVIC access for the two LTDC vectors.
    type Interrupts: InterruptControl;
    /// Panel supply / reset GPIOs.
    type Power: PanelPower;
    /// Panel command driver.
    type Panel: PanelInit;
    /// Backlight driver ([`NoBacklight`] if absent).
    type Backlight: Backlight;
    /// Frame buffer manager.
    type FrameBuffer: FrameBufferManager;
    /// Blocking delay for settle times.
    type Delay: DelayNs;
}

/// Owned collaborator instances handed to the sequencer at construction.
pub struct DisplayParts<P: DisplayPlatform> {
    /// Register layer.
    pub hal: P::Hal,
    /// Interrupt controller.
    pub interrupts: P::Interrupts,
    /// Panel power sequencing.
    pub power: P::Power,
    /// Panel command driver.
    pub panel: P::Panel,
    /// Backlight, `None` if the board has none.
    pub backlight: Option<P::Backlight>,
    /// Frame buffer manager.
    pub frame_buffer: P::FrameBuffer,
    /// Delay provider.
    pub delay: P::Delay,
}

//! Display path for the LX250A2401A 380×520 MIPI-DSI panel.
//!
//! ```text
//! profile ─┬─> pll (PLL3) ─> dsi (SerialLink) ─> ltdc (FrameCompositor)
//!          └─────────────── driver (DisplayDriver) orchestrates all three
//! ```
//!
//! Register access goes through the `platform` traits, so everything here
//! runs against `platform::mocks` on the host.

pub mod clock_math;
pub mod driver;
pub mod dsi;
pub mod irq;
pub mod ltdc;
pub mod panel;
pub mod pll;
pub mod power;
pub mod profile;

pub use driver::{DisplayConfig, DisplayDriver, ENABLED_INTERRUPTS, IRQ_PRIORITY_NORMAL};
pub use dsi::{video_mode_config, LinkState, SerialLink};
pub use irq::{LtdcIrq, SharedDisplay};
pub use ltdc::{layer_config, ltdc_init, CompositorState, FrameCompositor};
pub use panel::{DISPLAY_RESX, DISPLAY_RESY};
pub use pll::{pll3_config, ClockDomain};
pub use power::GpioPanelPower;
pub use profile::{DisplayProfile, RefreshRate, TimingProfile};

#[cfg(feature = "hardware")]
pub use irq::NvicController;

//! STM32U5 display firmware
//!
//! Bring-up, teardown and live retiming of the 380×520 MIPI-DSI panel, plus
//! two small persisted services that share the board: battery temperature
//! telemetry in backup RAM and secure storage setup.
//!
//! # Architecture
//!
//! ```text
//! Application (board support, vector table)
//!         ↓
//! DisplayDriver (display::driver): ordered bring-up, rollback, refresh
//!         ↓
//! ClockDomain (PLL3) → SerialLink (DSI) → FrameCompositor (LTDC)
//!         ↓
//! platform traits (register layer, collaborators, mocks)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32U5 target (defmt, cortex-m NVIC)
//! - `emulator` - Build for desktop runs with `tracing` output
//! - `std` - Enable standard library (for emulator and testing)
//! - `hse-16mhz` - Board fitted with a 16 MHz HSE crystal
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv8m.main-none-eabihf --features hardware
//! ```
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example bringup_trace --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::unused_self)]

#[macro_use]
mod fmt;

pub mod display;
pub mod storage_setup;
pub mod telemetry;

// Re-export key types
pub use display::{
    DisplayConfig, DisplayDriver, DisplayProfile, GpioPanelPower, RefreshRate, SharedDisplay,
    TimingProfile, DISPLAY_RESX, DISPLAY_RESY,
};
pub use platform::{DisplayError, Status};
pub use storage_setup::storage_setup;
pub use telemetry::{Telemetry, TelemetryRecord};

#[cfg(feature = "hardware")]
pub use display::NvicController;

//! Hardware Abstraction Layer (HAL) for the display path of the secure
//! firmware
//!
//! This crate provides trait-based abstractions for the peripherals the
//! display sequencer drives, enabling development and testing without
//! physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Sequencer + drivers (firmware crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions and parameter records)
//!         ↓
//! Register layer (vendor HAL / PAC, or `mocks` on the host)
//! ```
//!
//! # Abstraction Levels
//!
//! ## Register layer
//! - [`ClockControl`] - RCC: PLL3 and display kernel clock muxes
//! - [`DsiHost`] - DSI host and D-PHY
//! - [`Ltdc`] - LCD-TFT timing generator and layers
//! - [`MpuControl`] - MPU layout switching around interrupt service
//!
//! ## Collaborators
//! - [`PanelPower`], [`PanelInit`], [`Backlight`], [`FrameBufferManager`]
//! - [`InterruptControl`] - NVIC lines of the LTDC
//! - [`BackupRam`] - battery-backed key/value area
//! - [`SaltSource`], [`SecureStorage`] - secure storage bring-up
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls and the [`mocks`] module
//! - `hse-16mhz`: 16 MHz HSE crystal instead of 32 MHz
//! - `hardware`: Physical hardware target marker
//! - `defmt`: Enable defmt logging

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::match_same_arms)] // errno mapping tables read better unmerged
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::struct_excessive_bools)] // DSI video-mode records mirror register bits

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod backup_ram;
pub mod clock_config;
pub mod display;
pub mod dsi;
pub mod ltdc;
pub mod mocks;
pub mod mpu;
pub mod status;
pub mod storage;

// Re-export register-layer traits
pub use clock_config::{ClockControl, HseFrequency, Pll3Config};
pub use dsi::DsiHost;
pub use ltdc::{Ltdc, LtdcInterrupts};
pub use mpu::{MpuControl, MpuMode, MpuModeGuard};

// Re-export collaborator traits and shared types
pub use backup_ram::{BackupRam, BackupRamKey, ItemVisibility};
pub use display::{
    Backlight, DisplayError, DisplayInterrupt, DisplayParts, DisplayPlatform, FrameBufferManager,
    HalError, InterruptControl, NoBacklight, PanelInit, PanelPower, WaitCondition, WaitPolicy,
};
pub use status::{ensure_ok, ensure_true, FatalErrorHandler, Status};
pub use storage::{PinUiWaitCallback, SaltSource, SecureStorage, StorageSalt, StorageUiMessage};

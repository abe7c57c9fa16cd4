//! Display bring-up trace
//!
//! Runs the display sequencer against the recording register layer and a
//! simulated NVIC, cycles through the tabulated refresh rates and fires the
//! line interrupt once per "frame". Driver logging goes to stderr through
//! `tracing`.
//!
//! Run with: RUST_LOG=trace cargo run --example bringup_trace --features emulator

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use firmware::{DisplayConfig, DisplayDriver, DisplayProfile, RefreshRate, SharedDisplay};
use platform::ltdc::LtdcInterrupts;
use platform::mocks::{simulated_parts, SimulatedInterruptController, SimulatedPlatform};
use platform::DisplayInterrupt;
use tracing_subscriber::EnvFilter;

static NVIC: SimulatedInterruptController = SimulatedInterruptController::new();
static DISPLAY: SharedDisplay<DisplayDriver<SimulatedPlatform>> = SharedDisplay::new();
static LINE_EVENTS: AtomicU32 = AtomicU32::new(0);

fn ltdc() {
    DISPLAY.with(|d| {
        if d.on_line_interrupt().contains(LtdcInterrupts::LINE) {
            LINE_EVENTS.fetch_add(1, Ordering::Relaxed);
        }
    });
}

fn ltdc_er() {
    DISPLAY.with(|d| {
        d.on_error_interrupt();
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let profile = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u8>().ok())
        .and_then(DisplayProfile::from_index)
        .unwrap_or_default();

    NVIC.register(DisplayInterrupt::Line, ltdc);
    NVIC.register(DisplayInterrupt::Error, ltdc_er);

    let config = DisplayConfig {
        profile,
        ..DisplayConfig::default()
    };
    DISPLAY.install(DisplayDriver::new(simulated_parts(&NVIC), config));

    DISPLAY
        .with(DisplayDriver::initialize)
        .ok_or("display cell busy")?
        .map_err(|e| e.to_string())?;
    NVIC.flush();
    println!("Display up, profile {}", profile.index());

    let mut frame = tokio::time::interval(Duration::from_millis(20));
    for rate in RefreshRate::ALL.into_iter().rev() {
        frame.tick().await;
        DISPLAY
            .with(|d| d.set_refresh_rate(rate))
            .ok_or("display cell busy")?
            .map_err(|e| e.to_string())?;

        DISPLAY.with(|d| d.parts_mut().hal.raise(LtdcInterrupts::LINE));
        NVIC.pend(DisplayInterrupt::Line);

        let vfp = DISPLAY
            .with(|d| d.parts().hal.vertical_front_porch())
            .unwrap_or_default();
        println!("{:>2} Hz -> vfp {}", rate.hz(), vfp);
    }

    DISPLAY.with(DisplayDriver::teardown);
    println!(
        "Torn down after {} line events",
        LINE_EVENTS.load(Ordering::Relaxed)
    );
    Ok(())
}

//! Display sequencer for the LX250A2401A MIPI-DSI panel.
//!
//! Owns the whole display path on the STM32U5:
//!
//! ```text
//! HSE -> PLL3 ------------------> LTDC (pixel clock, timing generator, layer 1)
//!          \                          |
//!           -> DSI kernel clock       v
//!              (until the D-PHY) -> DSI host -> 2 data lanes -> panel
//! ```
//!
//! # Bring-up
//!
//! [`DisplayDriver::initialize`] runs a fixed sequence: panel power, backlight,
//! frame buffer, clock domain, serial link, compositor, panel commands, link
//! start, line event, interrupts. A failing step unwinds the steps that
//! completed, newest first, and leaves the driver uninitialized.
//!
//! # Refresh rate
//!
//! The frame rate is set by the vertical front porch alone. The DSI host and
//! the LTDC each hold a copy of the frame height, and both have to change in
//! the same blanking interval or the two clock domains drift apart.
//! [`DisplayDriver::change_refresh_rate`] therefore waits for the end of the
//! current VSYNC pulse and the start of the next one, then rewrites both
//! registers with interrupts masked.
//!
//! # Interrupts
//!
//! The LTDC line and error vectors land in [`DisplayDriver::on_line_interrupt`]
//! and [`DisplayDriver::on_error_interrupt`]. See [`super::irq`] for how a
//! driver instance is shared with the vector table.

use heapless::Vec;
use platform::ltdc::{LayerConfig, LtdcInit, LtdcInterrupts};
use platform::{
    Backlight, DisplayError, DisplayInterrupt, DisplayParts, DisplayPlatform,
    DsiHost, FrameBufferManager, HalError, HseFrequency, InterruptControl, Ltdc, MpuMode,
    MpuModeGuard, PanelInit, PanelPower, WaitCondition, WaitPolicy,
};
use platform::dsi::VideoModeConfig;

use super::dsi::{LinkState, SerialLink};
use super::ltdc::{CompositorState, FrameCompositor};
use super::panel::LCD_HEIGHT;
use super::pll::ClockDomain;
use super::profile::{DisplayProfile, RefreshRate, TimingProfile};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// NVIC priority of both LTDC vectors (priority 8 of 16, upper nibble).
pub const IRQ_PRIORITY_NORMAL: u8 = 0x80;

/// LTDC interrupt sources unmasked after bring-up.
pub const ENABLED_INTERRUPTS: LtdcInterrupts = LtdcInterrupts::LINE
    .union(LtdcInterrupts::FIFO_UNDERRUN)
    .union(LtdcInterrupts::TRANSFER_ERROR);

/// Build-time display configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Timing profile.
    pub profile: DisplayProfile,
    /// Crystal on the board.
    pub hse: HseFrequency,
    /// Bound on PLL and VSYNC busy-waits.
    pub wait: WaitPolicy,
    /// NVIC priority for the LTDC vectors.
    pub irq_priority: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            profile: DisplayProfile::DEFAULT,
            hse: HseFrequency::default(),
            wait: WaitPolicy::default(),
            irq_priority: IRQ_PRIORITY_NORMAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Bring-up stages
// ---------------------------------------------------------------------------

/// Bring-up steps that have something to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Stage {
    Power,
    Backlight,
    FrameBuffer,
    Clock,
    SerialLink,
    Compositor,
    Interrupts,
}

impl Stage {
    /// Every stage in bring-up order.
    const ALL: [Self; 7] = [
        Self::Power,
        Self::Backlight,
        Self::FrameBuffer,
        Self::Clock,
        Self::SerialLink,
        Self::Compositor,
        Self::Interrupts,
    ];
}

type Stages = Vec<Stage, 8>;

fn reach(stages: &mut Stages, stage: Stage) {
    // Capacity exceeds Stage::ALL and each stage is reached at most once.
    let _ = stages.push(stage);
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// The display sequencer.
///
/// Generic over a [`DisplayPlatform`] so the same code drives the STM32U5
/// register layer and the recording mocks in tests.
pub struct DisplayDriver<P: DisplayPlatform> {
    parts: DisplayParts<P>,
    config: DisplayConfig,
    clock: ClockDomain,
    link: SerialLink,
    compositor: FrameCompositor,
    initialized: bool,
    /// Backlight level when the board has no backlight driver.
    emulated_backlight: u8,
}

impl<P: DisplayPlatform> DisplayDriver<P> {
    /// Wrap the collaborators. Nothing is touched until [`Self::initialize`].
    pub fn new(parts: DisplayParts<P>, config: DisplayConfig) -> Self {
        Self {
            parts,
            config,
            clock: ClockDomain::new(config.hse, config.wait),
            link: SerialLink::new(config.hse),
            compositor: FrameCompositor::new(),
            initialized: false,
            emulated_backlight: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// `true` between a successful [`Self::initialize`] and the next
    /// [`Self::teardown`].
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Configuration the driver was built with.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Selected timing profile.
    pub fn timing_profile(&self) -> &'static TimingProfile {
        self.config.profile.timing()
    }

    /// Active DSI video-mode configuration.
    pub fn video_mode(&self) -> Option<&VideoModeConfig> {
        self.link.video_mode()
    }

    /// Active LTDC timing generator configuration.
    pub fn timing(&self) -> Option<&LtdcInit> {
        self.compositor.timing()
    }

    /// Active layer configuration.
    pub fn layer(&self) -> Option<&LayerConfig> {
        self.compositor.layer()
    }

    /// Serial link progress.
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Compositor state.
    pub fn compositor_state(&self) -> CompositorState {
        self.compositor.state()
    }

    /// Collaborators, for inspection.
    pub fn parts(&self) -> &DisplayParts<P> {
        &self.parts
    }

    /// Collaborators, mutable. Bypasses the sequencer's bookkeeping.
    pub fn parts_mut(&mut self) -> &mut DisplayParts<P> {
        &mut self.parts
    }

    // -----------------------------------------------------------------------
    // Bring-up / teardown
    // -----------------------------------------------------------------------

    /// Power the panel and start continuous scan-out.
    ///
    /// Returns immediately if already initialized. On failure every step
    /// that completed is undone and the driver stays uninitialized.
    pub fn initialize(&mut self) -> Result<(), DisplayError> {
        if self.initialized {
            return Ok(());
        }

        let mut stages = Stages::new();
        if let Err(e) = self.bring_up(&mut stages) {
            error!("display bring-up failed: {}", e);
            for stage in stages.iter().rev() {
                self.undo(*stage);
            }
            self.reset_state();
            return Err(e);
        }

        self.initialized = true;
        info!(
            "display up: profile {} at {} Hz HSE",
            self.config.profile.index(),
            self.config.hse.hz()
        );
        Ok(())
    }

    fn bring_up(&mut self, stages: &mut Stages) -> Result<(), DisplayError> {
        let profile = self.config.profile.timing();
        let parts = &mut self.parts;

        // 1. Panel supply and reset
        parts
            .power
            .power_on()
            .map_err(|_| DisplayError::PanelPower)?;
        reach(stages, Stage::Power);

        // 2. Backlight (stays dark)
        if let Some(backlight) = parts.backlight.as_mut() {
            backlight.init().map_err(|_| DisplayError::Backlight)?;
        }
        reach(stages, Stage::Backlight);

        // 3. Frame buffer
        let frame_buffer = parts.frame_buffer.init();
        reach(stages, Stage::FrameBuffer);

        // 4. PLL3
        self.clock.init(&mut parts.hal, profile)?;
        reach(stages, Stage::Clock);

        // 5. DSI host, video mode
        self.link
            .init(&mut parts.hal, &mut parts.delay, profile)
            .map_err(DisplayError::SerialLink)?;
        reach(stages, Stage::SerialLink);

        // 6. LTDC, vertical timing taken from the DSI video mode
        let video = *self
            .link
            .video_mode()
            .ok_or(DisplayError::SerialLink(HalError::Error))?;
        self.compositor
            .init(&mut parts.hal, profile, &video, frame_buffer)
            .map_err(DisplayError::Compositor)?;
        reach(stages, Stage::Compositor);

        // 7. Panel command set
        parts
            .panel
            .init(&mut parts.hal)
            .map_err(DisplayError::Panel)?;

        // 8. Video stream
        self.link
            .start(&mut parts.hal)
            .map_err(DisplayError::LinkStart)?;

        // 9. End-of-frame line event
        parts
            .hal
            .ltdc_program_line_event(LCD_HEIGHT)
            .map_err(DisplayError::LineEvent)?;

        // 10. NVIC, then the LTDC sources
        for irq in DisplayInterrupt::ALL {
            parts.interrupts.enable(irq, self.config.irq_priority);
        }
        reach(stages, Stage::Interrupts);
        parts.hal.ltdc_enable_interrupts(ENABLED_INTERRUPTS);

        Ok(())
    }

    fn undo(&mut self, stage: Stage) {
        let parts = &mut self.parts;
        match stage {
            Stage::Interrupts => {
                for irq in DisplayInterrupt::ALL {
                    parts.interrupts.disable(irq);
                }
            }
            Stage::Compositor => self.compositor.deinit(&mut parts.hal),
            Stage::SerialLink => self.link.deinit(&mut parts.hal),
            Stage::Clock => self.clock.deinit(&mut parts.hal),
            Stage::FrameBuffer => parts.frame_buffer.deinit(),
            Stage::Backlight => {
                if let Some(backlight) = parts.backlight.as_mut() {
                    backlight.deinit();
                }
            }
            Stage::Power => parts.power.power_off(),
        }
    }

    fn reset_state(&mut self) {
        self.initialized = false;
        self.emulated_backlight = 0;
    }

    /// Shut the display path down, whatever state it is in.
    pub fn teardown(&mut self) {
        for stage in Stage::ALL.iter().rev() {
            self.undo(*stage);
        }
        self.reset_state();
        debug!("display down");
    }

    // -----------------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------------

    /// Scan out the frame buffer at `address` from the next frame on.
    pub fn set_frame_buffer(&mut self, address: u32) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::NotInitialized);
        }
        self.compositor
            .set_frame_buffer(&mut self.parts.hal, address)
            .map_err(DisplayError::Compositor)
    }

    /// Switch to a new vertical front porch without a visible glitch.
    ///
    /// No-op while uninitialized. With a bounded [`WaitPolicy`] a missing
    /// VSYNC edge returns [`DisplayError::Timeout`] before any output is
    /// disabled.
    pub fn change_refresh_rate(&mut self, vfp: u32) -> Result<(), DisplayError> {
        if !self.initialized {
            return Ok(());
        }

        let wait = self.config.wait;
        let hal = &mut self.parts.hal;
        let link = &mut self.link;
        let compositor = &mut self.compositor;

        critical_section::with(|_| -> Result<(), DisplayError> {
            // Let the current pulse finish, then catch the start of the next
            // one so the writes land in vertical blanking.
            wait.wait_for(WaitCondition::VsyncInactive, || !hal.ltdc_vsync_active())?;
            wait.wait_for(WaitCondition::VsyncActive, || hal.ltdc_vsync_active())?;

            hal.ltdc_set_enabled(false);
            hal.dsi_set_host_enabled(false);

            let total_height = compositor
                .accumulated_active_height()
                .unwrap_or_default()
                .saturating_add(vfp);
            link.set_vertical_front_porch(vfp);
            compositor.set_total_height(total_height);

            hal.dsi_write_vertical_front_porch(vfp);
            hal.ltdc_write_total_height(total_height);

            hal.dsi_set_host_enabled(true);
            hal.ltdc_set_enabled(true);
            Ok(())
        })?;

        trace!("vfp -> {}", vfp);
        Ok(())
    }

    /// Switch to the tabulated front porch for `rate`.
    pub fn set_refresh_rate(&mut self, rate: RefreshRate) -> Result<(), DisplayError> {
        let vfp = self.timing_profile().vfp(rate);
        self.change_refresh_rate(vfp)
    }

    // -----------------------------------------------------------------------
    // Backlight
    // -----------------------------------------------------------------------

    /// Set the backlight level.
    ///
    /// Turning a dark backlight on first waits for the current frame to be
    /// scanned out so stale content is never lit.
    pub fn set_backlight(&mut self, level: u8) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::NotInitialized);
        }

        let parts = &mut self.parts;
        match parts.backlight.as_mut() {
            Some(backlight) => {
                if level > 0 && backlight.level() == 0 {
                    parts.frame_buffer.wait_refreshed();
                }
                backlight
                    .set_level(level)
                    .map_err(|_| DisplayError::Backlight)
            }
            None => {
                self.emulated_backlight = level;
                Ok(())
            }
        }
    }

    /// Current backlight level, 0 while uninitialized.
    pub fn backlight(&self) -> u8 {
        if !self.initialized {
            return 0;
        }
        match self.parts.backlight.as_ref() {
            Some(backlight) => backlight.level(),
            None => self.emulated_backlight,
        }
    }

    // -----------------------------------------------------------------------
    // Interrupt entry points
    // -----------------------------------------------------------------------

    /// LTDC global vector body. Returns the flags that were serviced.
    pub fn on_line_interrupt(&mut self) -> LtdcInterrupts {
        self.service_interrupt()
    }

    /// LTDC error vector body. Returns the flags that were serviced.
    pub fn on_error_interrupt(&mut self) -> LtdcInterrupts {
        let serviced = self.service_interrupt();
        if serviced.intersects(LtdcInterrupts::FIFO_UNDERRUN | LtdcInterrupts::TRANSFER_ERROR) {
            warn!("LTDC error: {}", serviced.bits());
        }
        serviced
    }

    fn service_interrupt(&mut self) -> LtdcInterrupts {
        let mut hal = MpuModeGuard::enter(&mut self.parts.hal, MpuMode::Default);
        if self.compositor.is_ready() {
            hal.ltdc_service_interrupts()
        } else {
            // No configured handle to service against; drop every flag.
            hal.ltdc_clear_interrupts(LtdcInterrupts::all());
            LtdcInterrupts::empty()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::mocks::{
        mock_parts, FailPoint, HalCall, MockDisplayHal, MockPlatform, VsyncBehaviour,
    };

    type TestDriver = DisplayDriver<MockPlatform>;

    fn driver() -> TestDriver {
        DisplayDriver::new(
            mock_parts(),
            DisplayConfig {
                wait: WaitPolicy::Polls(64),
                ..DisplayConfig::default()
            },
        )
    }

    fn ready() -> TestDriver {
        let mut d = driver();
        assert!(d.initialize().is_ok());
        d.parts_mut().hal.clear_calls();
        d
    }

    fn hal(d: &TestDriver) -> &MockDisplayHal {
        &d.parts().hal
    }

    #[test]
    fn default_config() {
        let c = DisplayConfig::default();
        assert_eq!(c.profile, DisplayProfile::DEFAULT);
        assert_eq!(c.irq_priority, 0x80);
        assert_eq!(c.hse, HseFrequency::default());
        assert_eq!(
            c.wait,
            WaitPolicy::Timeout(platform::display::DEFAULT_WAIT_TIMEOUT)
        );
    }

    #[test]
    fn initialize_marks_driver_ready() {
        let d = ready();
        assert!(d.is_initialized());
        assert_eq!(d.link_state(), LinkState::Started);
        assert_eq!(d.compositor_state(), CompositorState::Ready);
        assert_eq!(hal(&d).line_event(), Some(520));
        assert_eq!(hal(&d).ltdc_interrupts(), ENABLED_INTERRUPTS);
        for irq in DisplayInterrupt::ALL {
            assert_eq!(d.parts().interrupts.priority(irq), Some(0x80));
        }
    }

    #[test]
    fn initialize_twice_is_a_no_op() {
        let mut d = ready();
        assert!(d.initialize().is_ok());
        assert!(hal(&d).calls().is_empty());
        assert_eq!(d.parts().power.power_on_count(), 1);
    }

    #[test]
    fn panel_commands_precede_link_start() {
        let mut d = driver();
        assert!(d.initialize().is_ok());
        let h = hal(&d);
        let panel = h.position(HalCall::DsiCommand(0x11));
        let start = h.position(HalCall::DsiStart);
        let line = h.position(HalCall::LtdcLineEvent(520));
        assert!(panel.is_some());
        assert!(panel < start && start < line);
    }

    #[test]
    fn power_failure_touches_nothing_else() {
        let mut d = driver();
        d.parts_mut().power.set_fail(true);
        assert_eq!(d.initialize(), Err(DisplayError::PanelPower));
        assert!(!d.is_initialized());
        assert!(hal(&d).calls().is_empty());
        assert_eq!(d.parts().frame_buffer.init_count(), 0);
    }

    #[test]
    fn link_failure_unwinds_clock_and_power() {
        let mut d = driver();
        d.parts_mut().hal.fail_at(FailPoint::DsiVideoMode);
        assert_eq!(d.initialize(), Err(DisplayError::SerialLink(HalError::Error)));
        let p = d.parts();
        assert!(!p.hal.pll3_on());
        assert!(!p.power.is_powered());
        assert_eq!(p.frame_buffer.deinit_count(), 1);
        assert_eq!(p.backlight.as_ref().map(|b| b.deinit_count()), Some(1));
        assert_eq!(p.hal.count(|c| *c == HalCall::LtdcReset), 0);
        assert_eq!(p.interrupts.disable_count(), 0);
    }

    #[test]
    fn start_failure_unwinds_compositor_and_link() {
        let mut d = driver();
        d.parts_mut().hal.fail_at(FailPoint::DsiStart);
        assert_eq!(d.initialize(), Err(DisplayError::LinkStart(HalError::Error)));
        assert_eq!(d.link_state(), LinkState::Unpowered);
        assert_eq!(d.compositor_state(), CompositorState::Reset);
        assert!(d.video_mode().is_none());
        let last = |call: HalCall| hal(&d).calls().iter().rposition(|c| *c == call);
        let ltdc = last(HalCall::LtdcReset);
        let dsi = last(HalCall::DsiReset);
        let pll = last(HalCall::Pll3Disable);
        assert!(ltdc.is_some() && ltdc < dsi && dsi < pll);
    }

    #[test]
    fn line_event_failure_leaves_interrupts_masked() {
        let mut d = driver();
        d.parts_mut().hal.fail_at(FailPoint::LtdcLineEvent);
        assert_eq!(d.initialize(), Err(DisplayError::LineEvent(HalError::Error)));
        assert_eq!(d.parts().interrupts.enable_count(), 0);
        assert!(!d.parts().hal.dsi_started());
    }

    #[test]
    fn retry_after_failure_succeeds() {
        let mut d = driver();
        d.parts_mut().hal.fail_at(FailPoint::LtdcLayer);
        assert!(d.initialize().is_err());
        d.parts_mut().hal.clear_failure();
        assert!(d.initialize().is_ok());
        assert!(d.is_initialized());
    }

    #[test]
    fn teardown_resets_everything() {
        let mut d = ready();
        assert!(d.set_backlight(10).is_ok());
        d.teardown();
        assert!(!d.is_initialized());
        assert_eq!(d.backlight(), 0);
        let p = d.parts();
        assert!(!p.hal.pll3_on());
        assert!(!p.hal.dsi_host_enabled());
        assert!(!p.hal.ltdc_enabled());
        assert!(!p.power.is_powered());
        for irq in DisplayInterrupt::ALL {
            assert!(!p.interrupts.is_enabled(irq));
        }
    }

    #[test]
    fn teardown_on_fresh_driver_is_safe() {
        let mut d = driver();
        d.teardown();
        d.teardown();
        assert!(!d.is_initialized());
        assert_eq!(d.parts().power.power_off_count(), 2);
    }

    #[test]
    fn refresh_rate_change_rewrites_both_heights() {
        let mut d = ready();
        assert!(d.change_refresh_rate(298).is_ok());
        assert_eq!(
            hal(&d).calls(),
            &[
                HalCall::LtdcEnabled(false),
                HalCall::DsiHostEnabled(false),
                HalCall::DsiVerticalFrontPorch(298),
                HalCall::LtdcTotalHeight(547 + 298),
                HalCall::DsiHostEnabled(true),
                HalCall::LtdcEnabled(true),
            ]
        );
        assert_eq!(d.video_mode().map(|v| v.vertical_front_porch), Some(298));
        assert_eq!(d.timing().map(|t| t.total_height), Some(845));
    }

    #[test]
    fn refresh_rate_change_waits_for_two_vsync_edges() {
        let mut d = ready();
        d.parts_mut()
            .hal
            .script_vsync(&[true, true, true, false, false, true]);
        assert!(d.set_refresh_rate(RefreshRate::Hz30).is_ok());
        assert_eq!(hal(&d).vertical_front_porch(), 16);
    }

    #[test]
    fn stuck_vsync_times_out_before_disabling_outputs() {
        let mut d = ready();
        d.parts_mut().hal.set_vsync_behaviour(VsyncBehaviour::Stuck(true));
        assert_eq!(
            d.change_refresh_rate(100),
            Err(DisplayError::Timeout(WaitCondition::VsyncInactive))
        );
        assert!(hal(&d).calls().is_empty());
        assert!(hal(&d).ltdc_enabled());

        d.parts_mut().hal.set_vsync_behaviour(VsyncBehaviour::Stuck(false));
        assert_eq!(
            d.change_refresh_rate(100),
            Err(DisplayError::Timeout(WaitCondition::VsyncActive))
        );
        assert!(hal(&d).calls().is_empty());
    }

    #[test]
    fn refresh_rate_change_before_init_is_a_no_op() {
        let mut d = driver();
        assert!(d.change_refresh_rate(100).is_ok());
        assert!(hal(&d).calls().is_empty());
    }

    #[test]
    fn frame_buffer_requires_init() {
        let mut d = driver();
        assert_eq!(d.set_frame_buffer(0x2000_0000), Err(DisplayError::NotInitialized));
        let mut d = ready();
        assert!(d.set_frame_buffer(0x2000_0000).is_ok());
        assert_eq!(d.layer().map(|l| l.frame_buffer), Some(0x2000_0000));
    }

    #[test]
    fn backlight_on_from_dark_waits_for_refresh() {
        let mut d = ready();
        assert!(d.set_backlight(0).is_ok());
        assert_eq!(d.parts().frame_buffer.refresh_waits(), 0);
        assert!(d.set_backlight(128).is_ok());
        assert_eq!(d.parts().frame_buffer.refresh_waits(), 1);
        assert!(d.set_backlight(200).is_ok());
        assert_eq!(d.parts().frame_buffer.refresh_waits(), 1);
        assert_eq!(d.backlight(), 200);
    }

    #[test]
    fn emulated_backlight_without_device() {
        let mut d = driver();
        d.parts_mut().backlight = None;
        assert_eq!(d.set_backlight(5), Err(DisplayError::NotInitialized));
        assert!(d.initialize().is_ok());
        assert!(d.set_backlight(77).is_ok());
        assert_eq!(d.backlight(), 77);
        assert_eq!(d.parts().frame_buffer.refresh_waits(), 0);
    }

    #[test]
    fn interrupt_before_init_clears_all_flags() {
        let mut d = driver();
        d.parts_mut().hal.raise(LtdcInterrupts::LINE | LtdcInterrupts::CRC_ERROR);
        assert_eq!(d.on_line_interrupt(), LtdcInterrupts::empty());
        let h = hal(&d);
        assert_eq!(
            h.calls(),
            &[
                HalCall::MpuReconfig(MpuMode::Default),
                HalCall::LtdcClear(LtdcInterrupts::all()),
                HalCall::MpuRestore(MpuMode::App),
            ]
        );
        assert_eq!(h.pending(), LtdcInterrupts::empty());
        assert_eq!(h.mpu_mode(), MpuMode::App);
    }

    #[test]
    fn interrupt_after_init_is_serviced() {
        let mut d = ready();
        d.parts_mut().hal.raise(LtdcInterrupts::FIFO_UNDERRUN);
        assert_eq!(d.on_error_interrupt(), LtdcInterrupts::FIFO_UNDERRUN);
        assert_eq!(
            hal(&d).calls(),
            &[
                HalCall::MpuReconfig(MpuMode::Default),
                HalCall::LtdcService,
                HalCall::MpuRestore(MpuMode::App),
            ]
        );
    }
}

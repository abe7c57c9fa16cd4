//! Mock implementations for testing
//!
//! Recording stand-ins for every display-path trait, plus in-memory backup
//! RAM and storage seams. [`MockDisplayHal`] logs each register-layer call in
//! order, keeps a model of the registers the sequencer reads back, and can be
//! told to fail at one configuration step.

#![cfg(any(test, feature = "std"))]
// Test scaffolding: counters and buffer copies here are not audited.
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embedded_hal::delay::DelayNs;

use crate::backup_ram::{BackupRam, BackupRamKey, ItemVisibility};
use crate::clock_config::{ClockControl, DsiClockSource, LtdcClockSource, Pll3Config};
use crate::display::{
    Backlight, DisplayInterrupt, DisplayParts, DisplayPlatform, FrameBufferManager, HalError,
    InterruptControl, PanelInit, PanelPower,
};
use crate::dsi::{
    DsiHost, DsiHostInit, DsiPllInit, FlowControl, HostTimeouts, PhyTimerConfig, VideoModeConfig,
};
use crate::ltdc::{LayerConfig, Ltdc, LtdcInit, LtdcInterrupts, LtdcLayer};
use crate::mpu::{MpuControl, MpuMode};
use crate::status::Status;
use crate::storage::{PinUiWaitCallback, SaltSource, SecureStorage, StorageSalt};

/// Error returned by mocks told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockFault;

// ---------------------------------------------------------------------------
// Register layer
// ---------------------------------------------------------------------------

/// One recorded register-layer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalCall {
    /// `pll3_disable`
    Pll3Disable,
    /// `pll3_configure`
    Pll3Configure(Pll3Config),
    /// `pll3_enable`
    Pll3Enable,
    /// `set_dsi_clock_source`
    DsiClockSource(DsiClockSource),
    /// `set_ltdc_clock_source`
    LtdcClockSource(LtdcClockSource),
    /// `dsi_reset`
    DsiReset,
    /// `dsi_set_clock`
    DsiClock(bool),
    /// `dsi_set_host_enabled`
    DsiHostEnabled(bool),
    /// `dsi_set_pll_enabled`
    DsiPllEnabled(bool),
    /// `dsi_enable_phy_lanes`
    DsiPhyLanes,
    /// `dsi_set_escape_divider`
    DsiEscapeDivider(u8),
    /// `dsi_configure_host`
    DsiConfigureHost,
    /// `dsi_set_generic_vcid`
    DsiGenericVcid(u8),
    /// `dsi_configure_video_mode`
    DsiVideoMode,
    /// `dsi_configure_phy_timer`
    DsiPhyTimer,
    /// `dsi_configure_host_timeouts`
    DsiHostTimeouts,
    /// `dsi_configure_flow_control`
    DsiFlowControl(FlowControl),
    /// `dsi_start`
    DsiStart,
    /// `dsi_write_vertical_front_porch`
    DsiVerticalFrontPorch(u32),
    /// `dsi_write_command`
    DsiCommand(u8),
    /// `ltdc_reset`
    LtdcReset,
    /// `ltdc_set_clock`
    LtdcClock(bool),
    /// `ltdc_configure`
    LtdcConfigure,
    /// `ltdc_configure_layer`
    LtdcLayer(LtdcLayer),
    /// `ltdc_program_line_event`
    LtdcLineEvent(u32),
    /// `ltdc_enable_interrupts`
    LtdcEnableInterrupts(LtdcInterrupts),
    /// `ltdc_disable_interrupts`
    LtdcDisableInterrupts(LtdcInterrupts),
    /// `ltdc_set_enabled`
    LtdcEnabled(bool),
    /// `ltdc_write_total_height`
    LtdcTotalHeight(u32),
    /// `ltdc_service_interrupts`
    LtdcService,
    /// `ltdc_clear_interrupts`
    LtdcClear(LtdcInterrupts),
    /// `mpu_reconfig`
    MpuReconfig(MpuMode),
    /// `mpu_restore`
    MpuRestore(MpuMode),
}

/// Register-layer step that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// PLL3RDY never sets.
    Pll3Lock,
    /// PLL3RDY never clears.
    Pll3Unlock,
    /// `dsi_configure_host`
    DsiHost,
    /// `dsi_set_generic_vcid`
    DsiGenericVcid,
    /// `dsi_configure_video_mode`
    DsiVideoMode,
    /// `dsi_configure_phy_timer`
    DsiPhyTimer,
    /// `dsi_configure_host_timeouts`
    DsiHostTimeouts,
    /// `dsi_configure_flow_control`
    DsiFlowControl,
    /// `dsi_start`
    DsiStart,
    /// `dsi_write_command`
    DsiCommand,
    /// `ltdc_configure`
    LtdcConfigure,
    /// `ltdc_configure_layer`
    LtdcLayer,
    /// `ltdc_program_line_event`
    LtdcLineEvent,
}

/// Behaviour of CDSR.VSYNCS once the scripted samples are used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VsyncBehaviour {
    /// Alternate on every read, starting inside the pulse.
    Toggle,
    /// Always read this value.
    Stuck(bool),
}

/// Recording register layer for the display path.
pub struct MockDisplayHal {
    log: heapless::Vec<HalCall, 512>,
    fail: Option<FailPoint>,
    vsync_script: heapless::Deque<bool, 32>,
    vsync_behaviour: VsyncBehaviour,
    vsync_phase: bool,
    pll3_on: bool,
    pll3_config: Option<Pll3Config>,
    dsi_clock_source: Option<DsiClockSource>,
    dsi_host_enabled: bool,
    dsi_started: bool,
    dsi_host: Option<(DsiHostInit, DsiPllInit)>,
    video_mode: Option<VideoModeConfig>,
    phy_timer: Option<PhyTimerConfig>,
    host_timeouts: Option<HostTimeouts>,
    vertical_front_porch: u32,
    ltdc_init: Option<LtdcInit>,
    ltdc_enabled: bool,
    total_height: u32,
    layer: Option<LayerConfig>,
    line_event: Option<u32>,
    ltdc_interrupts: LtdcInterrupts,
    pending: LtdcInterrupts,
    mpu_mode: MpuMode,
}

impl MockDisplayHal {
    /// Fresh, everything-off register model.
    pub fn new() -> Self {
        Self {
            log: heapless::Vec::new(),
            fail: None,
            vsync_script: heapless::Deque::new(),
            vsync_behaviour: VsyncBehaviour::Toggle,
            vsync_phase: false,
            pll3_on: false,
            pll3_config: None,
            dsi_clock_source: None,
            dsi_host_enabled: false,
            dsi_started: false,
            dsi_host: None,
            video_mode: None,
            phy_timer: None,
            host_timeouts: None,
            vertical_front_porch: 0,
            ltdc_init: None,
            ltdc_enabled: false,
            total_height: 0,
            layer: None,
            line_event: None,
            ltdc_interrupts: LtdcInterrupts::empty(),
            pending: LtdcInterrupts::empty(),
            mpu_mode: MpuMode::App,
        }
    }

    /// Make `point` fail until [`Self::clear_failure`].
    pub fn fail_at(&mut self, point: FailPoint) {
        self.fail = Some(point);
    }

    /// Stop failing.
    pub fn clear_failure(&mut self) {
        self.fail = None;
    }

    /// Queue VSYNCS samples returned before the fallback behaviour applies.
    pub fn script_vsync(&mut self, samples: &[bool]) {
        for sample in samples {
            let _ = self.vsync_script.push_back(*sample);
        }
    }

    /// Fallback VSYNCS behaviour.
    pub fn set_vsync_behaviour(&mut self, behaviour: VsyncBehaviour) {
        self.vsync_behaviour = behaviour;
    }

    /// Latch interrupt flags as pending.
    pub fn raise(&mut self, flags: LtdcInterrupts) {
        self.pending |= flags;
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[HalCall] {
        &self.log
    }

    /// Forget recorded calls. Register state is kept.
    pub fn clear_calls(&mut self) {
        self.log.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&HalCall) -> bool) -> usize {
        self.log.iter().filter(|c| pred(c)).count()
    }

    /// Index of the first recorded call equal to `call`.
    pub fn position(&self, call: HalCall) -> Option<usize> {
        self.log.iter().position(|c| *c == call)
    }

    /// PLL3ON.
    pub fn pll3_on(&self) -> bool {
        self.pll3_on
    }

    /// Last PLL3 parameter block.
    pub fn pll3_config(&self) -> Option<Pll3Config> {
        self.pll3_config
    }

    /// Current DSI kernel clock.
    pub fn dsi_clock_source(&self) -> Option<DsiClockSource> {
        self.dsi_clock_source
    }

    /// DSI host CR.EN.
    pub fn dsi_host_enabled(&self) -> bool {
        self.dsi_host_enabled
    }

    /// Video mode started and not reset since.
    pub fn dsi_started(&self) -> bool {
        self.dsi_started
    }

    /// Last host / PLL parameter pair.
    pub fn dsi_host(&self) -> Option<(DsiHostInit, DsiPllInit)> {
        self.dsi_host
    }

    /// Last video-mode configuration.
    pub fn video_mode(&self) -> Option<VideoModeConfig> {
        self.video_mode
    }

    /// Last PHY timer configuration.
    pub fn phy_timer(&self) -> Option<PhyTimerConfig> {
        self.phy_timer
    }

    /// Last host timeout configuration.
    pub fn host_timeouts(&self) -> Option<HostTimeouts> {
        self.host_timeouts
    }

    /// VVFPCR.
    pub fn vertical_front_porch(&self) -> u32 {
        self.vertical_front_porch
    }

    /// Last timing-generator configuration.
    pub fn ltdc_init(&self) -> Option<LtdcInit> {
        self.ltdc_init
    }

    /// GCR.LTDCEN.
    pub fn ltdc_enabled(&self) -> bool {
        self.ltdc_enabled
    }

    /// TWCR total height.
    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    /// Layer 1 registers.
    pub fn layer(&self) -> Option<LayerConfig> {
        self.layer
    }

    /// LIPCR.
    pub fn line_event(&self) -> Option<u32> {
        self.line_event
    }

    /// IER.
    pub fn ltdc_interrupts(&self) -> LtdcInterrupts {
        self.ltdc_interrupts
    }

    /// ISR.
    pub fn pending(&self) -> LtdcInterrupts {
        self.pending
    }

    /// Active MPU mode.
    pub fn mpu_mode(&self) -> MpuMode {
        self.mpu_mode
    }

    fn record(&mut self, call: HalCall) {
        let _ = self.log.push(call);
    }

    fn check(&self, point: FailPoint) -> Result<(), HalError> {
        if self.fail == Some(point) {
            Err(HalError::Error)
        } else {
            Ok(())
        }
    }
}

impl Default for MockDisplayHal {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockControl for MockDisplayHal {
    fn pll3_disable(&mut self) {
        self.record(HalCall::Pll3Disable);
        self.pll3_on = false;
    }

    fn pll3_is_ready(&mut self) -> bool {
        match self.fail {
            Some(FailPoint::Pll3Lock) => false,
            Some(FailPoint::Pll3Unlock) => true,
            _ => self.pll3_on,
        }
    }

    fn pll3_configure(&mut self, config: &Pll3Config) {
        self.record(HalCall::Pll3Configure(*config));
        self.pll3_config = Some(*config);
    }

    fn pll3_enable(&mut self) {
        self.record(HalCall::Pll3Enable);
        self.pll3_on = true;
    }

    fn set_dsi_clock_source(&mut self, source: DsiClockSource) {
        self.record(HalCall::DsiClockSource(source));
        self.dsi_clock_source = Some(source);
    }

    fn set_ltdc_clock_source(&mut self, source: LtdcClockSource) {
        self.record(HalCall::LtdcClockSource(source));
    }
}

impl DsiHost for MockDisplayHal {
    fn dsi_reset(&mut self) {
        self.record(HalCall::DsiReset);
        self.dsi_host_enabled = false;
        self.dsi_started = false;
        self.dsi_host = None;
        self.video_mode = None;
        self.vertical_front_porch = 0;
    }

    fn dsi_set_clock(&mut self, enabled: bool) {
        self.record(HalCall::DsiClock(enabled));
    }

    fn dsi_set_host_enabled(&mut self, enabled: bool) {
        self.record(HalCall::DsiHostEnabled(enabled));
        self.dsi_host_enabled = enabled;
    }

    fn dsi_set_pll_enabled(&mut self, enabled: bool) {
        self.record(HalCall::DsiPllEnabled(enabled));
    }

    fn dsi_enable_phy_lanes(&mut self) {
        self.record(HalCall::DsiPhyLanes);
    }

    fn dsi_set_escape_divider(&mut self, divider: u8) {
        self.record(HalCall::DsiEscapeDivider(divider));
    }

    fn dsi_configure_host(&mut self, host: &DsiHostInit, pll: &DsiPllInit) -> Result<(), HalError> {
        self.record(HalCall::DsiConfigureHost);
        self.check(FailPoint::DsiHost)?;
        self.dsi_host = Some((*host, *pll));
        Ok(())
    }

    fn dsi_set_generic_vcid(&mut self, vcid: u8) -> Result<(), HalError> {
        self.record(HalCall::DsiGenericVcid(vcid));
        self.check(FailPoint::DsiGenericVcid)
    }

    fn dsi_configure_video_mode(&mut self, config: &VideoModeConfig) -> Result<(), HalError> {
        self.record(HalCall::DsiVideoMode);
        self.check(FailPoint::DsiVideoMode)?;
        self.video_mode = Some(*config);
        self.vertical_front_porch = config.vertical_front_porch;
        Ok(())
    }

    fn dsi_configure_phy_timer(&mut self, config: &PhyTimerConfig) -> Result<(), HalError> {
        self.record(HalCall::DsiPhyTimer);
        self.check(FailPoint::DsiPhyTimer)?;
        self.phy_timer = Some(*config);
        Ok(())
    }

    fn dsi_configure_host_timeouts(&mut self, config: &HostTimeouts) -> Result<(), HalError> {
        self.record(HalCall::DsiHostTimeouts);
        self.check(FailPoint::DsiHostTimeouts)?;
        self.host_timeouts = Some(*config);
        Ok(())
    }

    fn dsi_configure_flow_control(&mut self, flow: FlowControl) -> Result<(), HalError> {
        self.record(HalCall::DsiFlowControl(flow));
        self.check(FailPoint::DsiFlowControl)
    }

    fn dsi_start(&mut self) -> Result<(), HalError> {
        self.record(HalCall::DsiStart);
        self.check(FailPoint::DsiStart)?;
        self.dsi_started = true;
        Ok(())
    }

    fn dsi_write_vertical_front_porch(&mut self, lines: u32) {
        self.record(HalCall::DsiVerticalFrontPorch(lines));
        self.vertical_front_porch = lines;
    }

    fn dsi_write_command(&mut self, _channel: u8, command: u8, _params: &[u8]) -> Result<(), HalError> {
        self.record(HalCall::DsiCommand(command));
        self.check(FailPoint::DsiCommand)
    }
}

impl Ltdc for MockDisplayHal {
    fn ltdc_reset(&mut self) {
        self.record(HalCall::LtdcReset);
        self.ltdc_init = None;
        self.ltdc_enabled = false;
        self.total_height = 0;
        self.layer = None;
        self.line_event = None;
        self.ltdc_interrupts = LtdcInterrupts::empty();
    }

    fn ltdc_set_clock(&mut self, enabled: bool) {
        self.record(HalCall::LtdcClock(enabled));
    }

    fn ltdc_configure(&mut self, init: &LtdcInit) -> Result<(), HalError> {
        self.record(HalCall::LtdcConfigure);
        self.check(FailPoint::LtdcConfigure)?;
        self.ltdc_init = Some(*init);
        self.total_height = init.total_height;
        self.ltdc_enabled = true;
        Ok(())
    }

    fn ltdc_configure_layer(
        &mut self,
        layer: LtdcLayer,
        config: &LayerConfig,
    ) -> Result<(), HalError> {
        self.record(HalCall::LtdcLayer(layer));
        self.check(FailPoint::LtdcLayer)?;
        self.layer = Some(*config);
        Ok(())
    }

    fn ltdc_program_line_event(&mut self, line: u32) -> Result<(), HalError> {
        self.record(HalCall::LtdcLineEvent(line));
        self.check(FailPoint::LtdcLineEvent)?;
        self.line_event = Some(line);
        Ok(())
    }

    fn ltdc_enable_interrupts(&mut self, interrupts: LtdcInterrupts) {
        self.record(HalCall::LtdcEnableInterrupts(interrupts));
        self.ltdc_interrupts |= interrupts;
    }

    fn ltdc_disable_interrupts(&mut self, interrupts: LtdcInterrupts) {
        self.record(HalCall::LtdcDisableInterrupts(interrupts));
        self.ltdc_interrupts &= !interrupts;
    }

    fn ltdc_vsync_active(&mut self) -> bool {
        if let Some(sample) = self.vsync_script.pop_front() {
            return sample;
        }
        match self.vsync_behaviour {
            VsyncBehaviour::Stuck(level) => level,
            VsyncBehaviour::Toggle => {
                self.vsync_phase = !self.vsync_phase;
                self.vsync_phase
            }
        }
    }

    fn ltdc_set_enabled(&mut self, enabled: bool) {
        self.record(HalCall::LtdcEnabled(enabled));
        self.ltdc_enabled = enabled;
    }

    fn ltdc_write_total_height(&mut self, total_height: u32) {
        self.record(HalCall::LtdcTotalHeight(total_height));
        self.total_height = total_height;
    }

    fn ltdc_service_interrupts(&mut self) -> LtdcInterrupts {
        self.record(HalCall::LtdcService);
        let serviced = self.pending;
        self.pending = LtdcInterrupts::empty();
        serviced
    }

    fn ltdc_clear_interrupts(&mut self, interrupts: LtdcInterrupts) {
        self.record(HalCall::LtdcClear(interrupts));
        self.pending &= !interrupts;
    }
}

impl MpuControl for MockDisplayHal {
    fn mpu_reconfig(&mut self, mode: MpuMode) -> MpuMode {
        self.record(HalCall::MpuReconfig(mode));
        core::mem::replace(&mut self.mpu_mode, mode)
    }

    fn mpu_restore(&mut self, mode: MpuMode) {
        self.record(HalCall::MpuRestore(mode));
        self.mpu_mode = mode;
    }
}

// ---------------------------------------------------------------------------
// Interrupt controllers
// ---------------------------------------------------------------------------

const fn irq_slot(irq: DisplayInterrupt) -> usize {
    match irq {
        DisplayInterrupt::Line => 0,
        DisplayInterrupt::Error => 1,
    }
}

/// NVIC stand-in that only records enable state.
#[derive(Debug, Default)]
pub struct MockInterruptController {
    priority: [Option<u8>; 2],
    enable_count: u32,
    disable_count: u32,
}

impl MockInterruptController {
    /// Both vectors masked.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `irq` is unmasked.
    pub fn is_enabled(&self, irq: DisplayInterrupt) -> bool {
        self.priority[irq_slot(irq)].is_some()
    }

    /// Priority `irq` was unmasked with.
    pub fn priority(&self, irq: DisplayInterrupt) -> Option<u8> {
        self.priority[irq_slot(irq)]
    }

    /// Number of `enable` calls.
    pub fn enable_count(&self) -> u32 {
        self.enable_count
    }

    /// Number of `disable` calls.
    pub fn disable_count(&self) -> u32 {
        self.disable_count
    }
}

impl InterruptControl for MockInterruptController {
    fn enable(&mut self, irq: DisplayInterrupt, priority: u8) {
        self.enable_count += 1;
        self.priority[irq_slot(irq)] = Some(priority);
    }

    fn disable(&mut self, irq: DisplayInterrupt) {
        self.disable_count += 1;
        self.priority[irq_slot(irq)] = None;
    }
}

/// Interrupt controller that runs registered handlers.
///
/// Usable from a `static`: handlers are plain `fn()` items, the enable and
/// pending bits are atomics. Pending a masked vector latches it. Unmasking
/// only sets the enable bit, since on hardware the latched handler runs once
/// the unmasking code leaves its critical section; call
/// [`flush`](Self::flush) at that point to run it.
pub struct SimulatedInterruptController {
    handlers: CriticalSectionMutex<RefCell<[Option<fn()>; 2]>>,
    enabled: [AtomicBool; 2],
    pending: [AtomicBool; 2],
    dispatched: [AtomicU32; 2],
}

impl SimulatedInterruptController {
    /// No handlers, everything masked.
    pub const fn new() -> Self {
        Self {
            handlers: CriticalSectionMutex::new(RefCell::new([None, None])),
            enabled: [AtomicBool::new(false), AtomicBool::new(false)],
            pending: [AtomicBool::new(false), AtomicBool::new(false)],
            dispatched: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Bind `handler` to `irq`, replacing any previous binding.
    pub fn register(&self, irq: DisplayInterrupt, handler: fn()) {
        self.handlers
            .lock(|h| h.borrow_mut()[irq_slot(irq)] = Some(handler));
    }

    /// Raise `irq`. Runs the handler now if the vector is unmasked.
    pub fn pend(&self, irq: DisplayInterrupt) {
        self.pending[irq_slot(irq)].store(true, Ordering::SeqCst);
        self.dispatch(irq);
    }

    /// Run every latched vector that is now unmasked.
    pub fn flush(&self) {
        for irq in DisplayInterrupt::ALL {
            self.dispatch(irq);
        }
    }

    /// `true` if `irq` is unmasked.
    pub fn is_enabled(&self, irq: DisplayInterrupt) -> bool {
        self.enabled[irq_slot(irq)].load(Ordering::SeqCst)
    }

    /// `true` if `irq` is latched but not yet serviced.
    pub fn is_pending(&self, irq: DisplayInterrupt) -> bool {
        self.pending[irq_slot(irq)].load(Ordering::SeqCst)
    }

    /// Number of handler invocations for `irq`.
    pub fn dispatched(&self, irq: DisplayInterrupt) -> u32 {
        self.dispatched[irq_slot(irq)].load(Ordering::SeqCst)
    }

    fn dispatch(&self, irq: DisplayInterrupt) {
        let slot = irq_slot(irq);
        if !self.enabled[slot].load(Ordering::SeqCst) {
            return;
        }
        if !self.pending[slot].swap(false, Ordering::SeqCst) {
            return;
        }
        // Copy the handler out so it runs outside the lock.
        let handler = self.handlers.lock(|h| h.borrow()[slot]);
        if let Some(handler) = handler {
            self.dispatched[slot].fetch_add(1, Ordering::SeqCst);
            handler();
        }
    }
}

impl Default for SimulatedInterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for &SimulatedInterruptController {
    fn enable(&mut self, irq: DisplayInterrupt, _priority: u8) {
        self.enabled[irq_slot(irq)].store(true, Ordering::SeqCst);
    }

    fn disable(&mut self, irq: DisplayInterrupt) {
        self.enabled[irq_slot(irq)].store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Panel supply / reset stand-in.
#[derive(Debug, Default)]
pub struct MockPanelPower {
    powered: bool,
    fail: bool,
    power_on_count: u32,
    power_off_count: u32,
}

impl MockPanelPower {
    /// Supply off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `power_on` fail.
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Supply state.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Number of `power_on` calls.
    pub fn power_on_count(&self) -> u32 {
        self.power_on_count
    }

    /// Number of `power_off` calls.
    pub fn power_off_count(&self) -> u32 {
        self.power_off_count
    }
}

impl PanelPower for MockPanelPower {
    type Error = MockFault;

    fn power_on(&mut self) -> Result<(), Self::Error> {
        self.power_on_count += 1;
        if self.fail {
            return Err(MockFault);
        }
        self.powered = true;
        Ok(())
    }

    fn power_off(&mut self) {
        self.power_off_count += 1;
        self.powered = false;
    }
}

/// Sleep-out, display-on.
pub const MOCK_PANEL_COMMANDS: [u8; 2] = [0x11, 0x29];

/// Panel command driver stand-in.
///
/// Sends [`MOCK_PANEL_COMMANDS`] over the link.
#[derive(Debug, Default)]
pub struct MockPanel {
    fail: bool,
    init_count: u32,
}

impl MockPanel {
    /// Panel that accepts its init sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `init` fail.
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Number of `init` calls.
    pub fn init_count(&self) -> u32 {
        self.init_count
    }
}

impl PanelInit for MockPanel {
    fn init<L: DsiHost + ?Sized>(&mut self, link: &mut L) -> Result<(), HalError> {
        self.init_count += 1;
        if self.fail {
            return Err(HalError::Error);
        }
        for command in MOCK_PANEL_COMMANDS {
            link.dsi_write_command(0, command, &[])?;
        }
        Ok(())
    }
}

/// Backlight stand-in.
#[derive(Debug, Default)]
pub struct MockBacklight {
    level: u8,
    fail_init: bool,
    init_count: u32,
    deinit_count: u32,
}

impl MockBacklight {
    /// Backlight off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `init` fail.
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Number of `init` calls.
    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    /// Number of `deinit` calls.
    pub fn deinit_count(&self) -> u32 {
        self.deinit_count
    }
}

impl Backlight for MockBacklight {
    type Error = MockFault;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.init_count += 1;
        if self.fail_init {
            return Err(MockFault);
        }
        self.level = 0;
        Ok(())
    }

    fn deinit(&mut self) {
        self.deinit_count += 1;
        self.level = 0;
    }

    fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, level: u8) -> Result<(), Self::Error> {
        self.level = level;
        Ok(())
    }
}

/// Address handed out by [`MockFrameBuffer::init`].
pub const MOCK_FRAME_BUFFER: u32 = 0x2005_0000;

/// Frame buffer stand-in.
#[derive(Debug, Default)]
pub struct MockFrameBuffer {
    init_count: u32,
    deinit_count: u32,
    refresh_waits: u32,
}

impl MockFrameBuffer {
    /// No buffers allocated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `init` calls.
    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    /// Number of `deinit` calls.
    pub fn deinit_count(&self) -> u32 {
        self.deinit_count
    }

    /// Number of `wait_refreshed` calls.
    pub fn refresh_waits(&self) -> u32 {
        self.refresh_waits
    }
}

impl FrameBufferManager for MockFrameBuffer {
    fn init(&mut self) -> u32 {
        self.init_count += 1;
        MOCK_FRAME_BUFFER
    }

    fn deinit(&mut self) {
        self.deinit_count += 1;
    }

    fn wait_refreshed(&mut self) {
        self.refresh_waits += 1;
    }
}

/// Delay that only adds up the requested time.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    /// Nothing waited yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested delays.
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns = self.total_ns.saturating_add(u64::from(ns));
    }
}

// ---------------------------------------------------------------------------
// Platform bundles
// ---------------------------------------------------------------------------

/// All-mock display platform.
pub struct MockPlatform;

impl DisplayPlatform for MockPlatform {
    type Hal = MockDisplayHal;
    type Interrupts = MockInterruptController;
    type Power = MockPanelPower;
    type Panel = MockPanel;
    type Backlight = MockBacklight;
    type FrameBuffer = MockFrameBuffer;
    type Delay = MockDelay;
}

/// Mock platform wired to a static [`SimulatedInterruptController`].
pub struct SimulatedPlatform;

impl DisplayPlatform for SimulatedPlatform {
    type Hal = MockDisplayHal;
    type Interrupts = &'static SimulatedInterruptController;
    type Power = MockPanelPower;
    type Panel = MockPanel;
    type Backlight = MockBacklight;
    type FrameBuffer = MockFrameBuffer;
    type Delay = MockDelay;
}

/// Fresh mock parts with a backlight fitted.
pub fn mock_parts() -> DisplayParts<MockPlatform> {
    DisplayParts {
        hal: MockDisplayHal::new(),
        interrupts: MockInterruptController::new(),
        power: MockPanelPower::new(),
        panel: MockPanel::new(),
        backlight: Some(MockBacklight::new()),
        frame_buffer: MockFrameBuffer::new(),
        delay: MockDelay::new(),
    }
}

/// Fresh mock parts dispatching through `irq`.
pub fn simulated_parts(irq: &'static SimulatedInterruptController) -> DisplayParts<SimulatedPlatform> {
    DisplayParts {
        hal: MockDisplayHal::new(),
        interrupts: irq,
        power: MockPanelPower::new(),
        panel: MockPanel::new(),
        backlight: Some(MockBacklight::new()),
        frame_buffer: MockFrameBuffer::new(),
        delay: MockDelay::new(),
    }
}

// ---------------------------------------------------------------------------
// Backup RAM and storage
// ---------------------------------------------------------------------------

/// Largest item [`MockBackupRam`] stores.
pub const MOCK_BACKUP_ITEM_LEN: usize = 64;

type StoredItem = (ItemVisibility, heapless::Vec<u8, MOCK_BACKUP_ITEM_LEN>);

/// In-memory backup RAM.
#[derive(Default)]
pub struct MockBackupRam {
    items: heapless::LinearMap<BackupRamKey, StoredItem, 4>,
    fail_reads: bool,
    fail_writes: bool,
    write_count: u32,
}

impl MockBackupRam {
    /// Empty backup RAM.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every write fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u32 {
        self.write_count
    }

    /// Raw bytes of `key`.
    pub fn item(&self, key: BackupRamKey) -> Option<&[u8]> {
        self.items.get(&key).map(|(_, data)| data.as_slice())
    }

    /// Visibility `key` was written with.
    pub fn visibility(&self, key: BackupRamKey) -> Option<ItemVisibility> {
        self.items.get(&key).map(|(vis, _)| *vis)
    }
}

impl BackupRam for MockBackupRam {
    type Error = MockFault;

    fn read(&mut self, key: BackupRamKey, buf: &mut [u8]) -> Result<Option<usize>, Self::Error> {
        if self.fail_reads {
            return Err(MockFault);
        }
        let Some((_, data)) = self.items.get(&key) else {
            return Ok(None);
        };
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(Some(data.len()))
    }

    fn write(
        &mut self,
        key: BackupRamKey,
        visibility: ItemVisibility,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockFault);
        }
        let stored = heapless::Vec::from_slice(data).map_err(|_| MockFault)?;
        self.items
            .insert(key, (visibility, stored))
            .map_err(|_| MockFault)?;
        self.write_count += 1;
        Ok(())
    }
}

/// Salt source returning a fixed salt or an error.
pub struct MockSaltSource {
    result: Result<StorageSalt, Status>,
    reads: u32,
}

impl MockSaltSource {
    /// Source returning `salt`.
    pub fn new(salt: &[u8]) -> Self {
        Self {
            result: StorageSalt::from_slice(salt).ok_or(Status::E2BIG),
            reads: 0,
        }
    }

    /// Source failing with `status`.
    pub fn failing(status: Status) -> Self {
        Self {
            result: Err(status),
            reads: 0,
        }
    }

    /// Number of `storage_salt` calls.
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl SaltSource for MockSaltSource {
    fn storage_salt(&mut self) -> Result<StorageSalt, Status> {
        self.reads += 1;
        self.result.clone()
    }
}

/// Secure storage stand-in that remembers what it was initialised with.
#[derive(Default)]
pub struct MockSecureStorage {
    salt: heapless::Vec<u8, { crate::storage::MAX_SALT_LEN }>,
    callback: Option<PinUiWaitCallback>,
    init_count: u32,
    fail: Option<Status>,
}

impl MockSecureStorage {
    /// Storage that accepts any salt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `init` fail with `status`.
    pub fn set_fail(&mut self, status: Option<Status>) {
        self.fail = status;
    }

    /// Salt passed to the last `init`.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Callback passed to the last `init`.
    pub fn callback(&self) -> Option<PinUiWaitCallback> {
        self.callback
    }

    /// Number of `init` calls.
    pub fn init_count(&self) -> u32 {
        self.init_count
    }
}

impl SecureStorage for MockSecureStorage {
    fn init(&mut self, callback: Option<PinUiWaitCallback>, salt: &[u8]) -> Result<(), Status> {
        self.init_count += 1;
        if let Some(status) = self.fail {
            return Err(status);
        }
        self.salt = heapless::Vec::from_slice(salt).map_err(|_| Status::E2BIG)?;
        self.callback = callback;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hal_records_calls_in_order() {
        let mut hal = MockDisplayHal::new();
        hal.pll3_enable();
        hal.dsi_reset();
        assert_eq!(hal.calls(), &[HalCall::Pll3Enable, HalCall::DsiReset]);
        assert!(hal.pll3_is_ready());
    }

    #[test]
    fn fail_point_rejects_only_that_step() {
        let mut hal = MockDisplayHal::new();
        hal.fail_at(FailPoint::DsiStart);
        assert_eq!(hal.dsi_start(), Err(HalError::Error));
        assert!(hal.dsi_set_generic_vcid(0).is_ok());
        hal.clear_failure();
        assert!(hal.dsi_start().is_ok());
    }

    #[test]
    fn vsync_script_then_toggle() {
        let mut hal = MockDisplayHal::new();
        hal.script_vsync(&[false, false]);
        assert!(!hal.ltdc_vsync_active());
        assert!(!hal.ltdc_vsync_active());
        assert!(hal.ltdc_vsync_active());
        assert!(!hal.ltdc_vsync_active());
    }

    #[test]
    fn backup_ram_reports_stored_length() {
        let mut ram = MockBackupRam::new();
        assert_eq!(ram.read(BackupRamKey::Telemetry, &mut [0; 4]), Ok(None));
        assert!(ram
            .write(BackupRamKey::Telemetry, ItemVisibility::Public, &[1, 2, 3])
            .is_ok());
        let mut buf = [0u8; 2];
        assert_eq!(ram.read(BackupRamKey::Telemetry, &mut buf), Ok(Some(3)));
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn backup_ram_rewrite_replaces_the_item() {
        assert_eq!(BackupRamKey::Telemetry.id(), 0x0001);
        let mut ram = MockBackupRam::new();
        assert_eq!(ram.visibility(BackupRamKey::Telemetry), None);
        for data in [&[1u8, 2, 3][..], &[7]] {
            assert!(ram
                .write(BackupRamKey::Telemetry, ItemVisibility::Public, data)
                .is_ok());
        }
        assert_eq!(ram.item(BackupRamKey::Telemetry), Some(&[7u8][..]));
        assert_eq!(
            ram.visibility(BackupRamKey::Telemetry),
            Some(ItemVisibility::Public)
        );
        assert_eq!(ram.write_count(), 2);
    }

    static SIM: SimulatedInterruptController = SimulatedInterruptController::new();
    static HITS: AtomicU32 = AtomicU32::new(0);

    fn on_line() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn simulated_controller_latches_while_masked() {
        SIM.register(DisplayInterrupt::Line, on_line);
        SIM.pend(DisplayInterrupt::Line);
        assert!(SIM.is_pending(DisplayInterrupt::Line));
        assert_eq!(HITS.load(Ordering::SeqCst), 0);

        let mut ctrl = &SIM;
        ctrl.enable(DisplayInterrupt::Line, 0x80);
        assert_eq!(HITS.load(Ordering::SeqCst), 0);
        assert!(SIM.is_pending(DisplayInterrupt::Line));

        SIM.flush();
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
        assert!(!SIM.is_pending(DisplayInterrupt::Line));
        SIM.flush();
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        SIM.pend(DisplayInterrupt::Line);
        assert_eq!(SIM.dispatched(DisplayInterrupt::Line), 2);
        ctrl.disable(DisplayInterrupt::Line);
    }
}

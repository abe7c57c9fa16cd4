//! Serial link controller: DSI host and D-PHY bring-up in video mode.
//!
//! # Bring-up
//!
//! The D-PHY PLL has to be running before the DSI kernel clock can be moved
//! from PLL3P onto the PHY clock. `init` therefore powers the host and its
//! PLL once with a temporary escape divider, switches the kernel clock,
//! then drops everything again and performs the real configuration from a
//! clean slate.
//!
//! # LTDC clock hand-off
//!
//! The LTDC bus clock is gated immediately before the host is enabled. With
//! both live during the enable the panel shows swapped or random colours.
//! The compositor turns its clock back on in its own `init`.

use embedded_hal::delay::DelayNs;
use platform::clock_config::{ClockControl, DsiClockSource, HseFrequency};
use platform::dsi::{
    DsiHost, DsiHostInit, DsiPllInit, FlowControl, HostTimeouts, LaneCount, LpRegions,
    PhyTimerConfig, PllBand, PllVcoRange, Polarity, VideoMode, VideoModeConfig,
};
use platform::ltdc::Ltdc;
use platform::HalError;

use super::clock_math::{dsi_ndiv, pixels_to_byte_clocks, DSI_PLL_IDF};
use super::panel::{HBP, HSYNC, VACT, VBP, VSYNC};
use super::profile::TimingProfile;

/// Escape divider written while the kernel clock moves onto the PHY.
const BOOTSTRAP_ESCAPE_DIV: u8 = 4;

/// Settle time after enabling the host PLL and after the PHY lanes.
const SETTLE_MS: u32 = 1;

/// Largest LP packet in the vertical blanking regions, bytes.
const LP_LARGEST_PACKET: u8 = 64;

/// Stop-state wait before a HS clock request, lane byte clocks.
const PHY_STOP_WAIT: u8 = 7;

/// Host timeout clock divider. All timeouts are disabled.
const TIMEOUT_CLOCK_DIV: u8 = 1;

/// Link progress. Steps are only ever taken in declaration order; any
/// failure drops back to [`LinkState::Unpowered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Reset, clock gated.
    Unpowered,
    /// Clock lane and digital PHY on.
    PhyEnabled,
    /// Kernel clock moved to the PHY.
    EscapeConfigured,
    /// Host and D-PHY PLL configured.
    HostConfigured,
    /// Video packet geometry programmed.
    VideoModeConfigured,
    /// PHY timers, timeouts and flow control set; host enabled.
    PhyTimingSet,
    /// Continuous video transmission running.
    Started,
}

/// Video-mode geometry for `profile`, at the 60 Hz front porch.
///
/// Horizontal fields are converted from pixel clocks into lane byte clocks
/// with the profile's precomputed ratio, truncating.
pub fn video_mode_config(profile: &TimingProfile) -> VideoModeConfig {
    let ratio = profile.byte_clk_to_pixel_clk_ratio;
    let line = profile
        .horizontal
        .hact
        .saturating_add(HSYNC)
        .saturating_add(HBP)
        .saturating_add(profile.horizontal.hfp);

    VideoModeConfig {
        virtual_channel: 0,
        hsync_polarity: Polarity::ActiveHigh,
        vsync_polarity: Polarity::ActiveHigh,
        data_enable_polarity: Polarity::ActiveHigh,
        color_coding: profile.color_coding,
        mode: VideoMode::Burst,
        // Burst mode needs a packet at least as wide as the visible line.
        packet_size: profile.horizontal.lcd_width,
        number_of_chunks: 0,
        null_packet_size: 0,
        horizontal_sync_active: pixels_to_byte_clocks(HSYNC, ratio),
        horizontal_back_porch: pixels_to_byte_clocks(HBP, ratio),
        horizontal_line: pixels_to_byte_clocks(line, ratio),
        vertical_sync_active: VSYNC,
        vertical_back_porch: VBP,
        vertical_front_porch: profile.default_vfp(),
        vertical_active: VACT,
        lp_command_enable: true,
        lp_largest_packet_size: LP_LARGEST_PACKET,
        lp_vact_largest_packet_size: 0,
        lp_regions: LpRegions::all(),
        frame_bta_acknowledge: true,
        loosely_packed: false,
    }
}

/// Host and D-PHY PLL parameters for `profile` on a board with `hse`.
pub const fn host_config(profile: &TimingProfile, hse: HseFrequency) -> (DsiHostInit, DsiPllInit) {
    let lane = &profile.lane;
    (
        DsiHostInit {
            // ES0499: automatic clock lane control is not functional.
            automatic_clock_lane_control: false,
            tx_escape_clock_div: lane.tx_escape_clock_div,
            lanes: LaneCount::Two,
            phy_frequency_range: lane.phy_frequency_range,
            phy_low_power_offset: 0,
        },
        DsiPllInit {
            ndiv: dsi_ndiv(hse, lane.pll_ndiv),
            idf: DSI_PLL_IDF,
            odf: lane.pll_odf,
            vco_range: PllVcoRange::Mhz800To1000,
            charge_pump: PllBand::Hz2000To4400,
            loop_filter: PllBand::Hz2000To4400,
        },
    )
}

/// PHY transition timers for `profile`.
pub const fn phy_timer_config(profile: &TimingProfile) -> PhyTimerConfig {
    PhyTimerConfig {
        clock_lane_hs2lp: profile.lane.clock_hs2lp,
        clock_lane_lp2hs: profile.lane.clock_lp2hs,
        data_lane_hs2lp: profile.lane.data_hs2lp,
        data_lane_lp2hs: profile.lane.data_lp2hs,
        data_lane_max_read: 0,
        stop_wait_time: PHY_STOP_WAIT,
    }
}

/// DSI host owner.
#[derive(Debug)]
pub struct SerialLink {
    hse: HseFrequency,
    state: LinkState,
    video: Option<VideoModeConfig>,
}

impl SerialLink {
    /// Unpowered link on a board with `hse`.
    pub const fn new(hse: HseFrequency) -> Self {
        Self {
            hse,
            state: LinkState::Unpowered,
            video: None,
        }
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Video-mode configuration programmed by the last successful `init`,
    /// including any later front-porch change.
    pub fn video_mode(&self) -> Option<&VideoModeConfig> {
        self.video.as_ref()
    }

    /// Record a new vertical front porch. The register write is the
    /// caller's, inside its blanking window.
    pub(crate) fn set_vertical_front_porch(&mut self, lines: u32) {
        if let Some(video) = self.video.as_mut() {
            video.vertical_front_porch = lines;
        }
    }

    /// Bring the host up in video mode for `profile`.
    ///
    /// On failure the link is torn down before returning.
    pub fn init<H, D>(
        &mut self,
        hal: &mut H,
        delay: &mut D,
        profile: &TimingProfile,
    ) -> Result<(), HalError>
    where
        H: ClockControl + DsiHost + Ltdc + ?Sized,
        D: DelayNs + ?Sized,
    {
        let result = self.configure(hal, delay, profile);
        if let Err(e) = result {
            warn!("DSI bring-up failed");
            self.deinit(hal);
            return Err(e);
        }
        Ok(())
    }

    fn configure<H, D>(
        &mut self,
        hal: &mut H,
        delay: &mut D,
        profile: &TimingProfile,
    ) -> Result<(), HalError>
    where
        H: ClockControl + DsiHost + Ltdc + ?Sized,
        D: DelayNs + ?Sized,
    {
        hal.dsi_reset();
        hal.dsi_set_clock(true);

        hal.dsi_set_host_enabled(true);
        hal.dsi_set_pll_enabled(true);
        delay.delay_ms(SETTLE_MS);

        hal.dsi_enable_phy_lanes();
        self.state = LinkState::PhyEnabled;

        hal.dsi_set_escape_divider(BOOTSTRAP_ESCAPE_DIV);
        delay.delay_ms(SETTLE_MS);
        hal.set_dsi_clock_source(DsiClockSource::DsiPhy);
        hal.dsi_set_escape_divider(0);
        hal.dsi_set_pll_enabled(false);
        hal.dsi_set_host_enabled(false);
        self.state = LinkState::EscapeConfigured;

        let (host, pll) = host_config(profile, self.hse);
        hal.dsi_configure_host(&host, &pll)?;
        hal.dsi_set_generic_vcid(0)?;
        self.state = LinkState::HostConfigured;

        let video = video_mode_config(profile);
        debug!(
            "DSI video: hsa={} hbp={} hline={} vfp={}",
            video.horizontal_sync_active,
            video.horizontal_back_porch,
            video.horizontal_line,
            video.vertical_front_porch
        );
        hal.dsi_configure_video_mode(&video)?;
        self.video = Some(video);
        self.state = LinkState::VideoModeConfigured;

        hal.dsi_configure_phy_timer(&phy_timer_config(profile))?;
        hal.dsi_configure_host_timeouts(&HostTimeouts {
            timeout_clock_div: TIMEOUT_CLOCK_DIV,
            ..HostTimeouts::default()
        })?;
        hal.dsi_configure_flow_control(FlowControl::BTA)?;

        hal.ltdc_set_clock(false);
        hal.dsi_set_host_enabled(true);
        self.state = LinkState::PhyTimingSet;
        Ok(())
    }

    /// Start continuous video transmission.
    pub fn start<H: DsiHost + ?Sized>(&mut self, hal: &mut H) -> Result<(), HalError> {
        hal.dsi_start()?;
        self.state = LinkState::Started;
        Ok(())
    }

    /// Reset the host and gate its clock. Safe in any state.
    pub fn deinit<H: DsiHost + ?Sized>(&mut self, hal: &mut H) {
        hal.dsi_set_clock(false);
        hal.dsi_reset();
        self.state = LinkState::Unpowered;
        self.video = None;
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::display::profile::DisplayProfile;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::dsi::ColorCoding;
    use platform::mocks::{FailPoint, HalCall, MockDelay, MockDisplayHal};

    fn link() -> SerialLink {
        SerialLink::new(HseFrequency::Mhz32)
    }

    #[test]
    fn default_profile_geometry() {
        let v = video_mode_config(DisplayProfile::DEFAULT.timing());
        assert_eq!(v.horizontal_sync_active, 17);
        assert_eq!(v.horizontal_back_porch, 5);
        assert_eq!(v.horizontal_line, 1631);
        assert_eq!((v.vertical_sync_active, v.vertical_back_porch), (2, 26));
        assert_eq!((v.vertical_front_porch, v.vertical_active), (16, 520));
        assert_eq!(v.packet_size, 480);
        assert_eq!(v.mode, VideoMode::Burst);
        assert_eq!(v.color_coding, ColorCoding::Rgb888);
        assert_eq!(v.lp_regions, LpRegions::all());
        assert!(v.lp_command_enable && v.frame_bta_acknowledge && !v.loosely_packed);
    }

    #[test]
    fn first_profile_geometry_uses_its_own_ratio() {
        let v = video_mode_config(DisplayProfile::Lane62Pclk18Hact480Rgb888.timing());
        assert_eq!(v.horizontal_sync_active, 20);
        assert_eq!(v.horizontal_back_porch, 6);
        assert_eq!(v.horizontal_line, 1821);
        assert_eq!(v.vertical_front_porch, 16);
    }

    #[test]
    fn ndiv_doubles_on_16mhz_crystal() {
        let t = DisplayProfile::DEFAULT.timing();
        let (_, pll32) = host_config(t, HseFrequency::Mhz32);
        let (host, pll16) = host_config(t, HseFrequency::Mhz16);
        assert_eq!(pll16.ndiv, pll32.ndiv * 2);
        assert_eq!(pll32.idf, 4);
        assert!(!host.automatic_clock_lane_control);
        assert_eq!(host.lanes, LaneCount::Two);
    }

    #[test]
    fn init_programs_host_and_gates_ltdc_before_enable() {
        let mut hal = MockDisplayHal::new();
        let mut delay = MockDelay::new();
        let mut link = link();
        let t = DisplayProfile::DEFAULT.timing();

        assert!(link.init(&mut hal, &mut delay, t).is_ok());
        assert_eq!(link.state(), LinkState::PhyTimingSet);
        assert_eq!(delay.total_ns(), 2_000_000);
        assert_eq!(hal.dsi_clock_source(), Some(DsiClockSource::DsiPhy));
        assert_eq!(hal.video_mode().as_ref(), link.video_mode());
        assert_eq!(hal.phy_timer().map(|p| p.stop_wait_time), Some(7));
        assert_eq!(hal.host_timeouts().map(|h| h.timeout_clock_div), Some(1));
        assert!(hal.dsi_host_enabled());

        let calls = hal.calls();
        assert_eq!(calls.last(), Some(&HalCall::DsiHostEnabled(true)));
        assert_eq!(
            calls.get(calls.len() - 2),
            Some(&HalCall::LtdcClock(false))
        );
        let switch = hal.position(HalCall::DsiClockSource(DsiClockSource::DsiPhy));
        let escape = hal.position(HalCall::DsiEscapeDivider(4));
        assert!(escape < switch);
        assert!(switch < hal.position(HalCall::DsiEscapeDivider(0)));
    }

    #[test]
    fn every_config_failure_resets_the_link() {
        let t = DisplayProfile::DEFAULT.timing();
        for point in [
            FailPoint::DsiHost,
            FailPoint::DsiGenericVcid,
            FailPoint::DsiVideoMode,
            FailPoint::DsiPhyTimer,
            FailPoint::DsiHostTimeouts,
            FailPoint::DsiFlowControl,
        ] {
            let mut hal = MockDisplayHal::new();
            hal.fail_at(point);
            let mut link = link();
            assert_eq!(
                link.init(&mut hal, &mut NoopDelay::new(), t),
                Err(HalError::Error),
                "{point:?}"
            );
            assert_eq!(link.state(), LinkState::Unpowered);
            assert!(link.video_mode().is_none());
            assert_eq!(hal.calls().last(), Some(&HalCall::DsiReset));
            assert!(!hal.dsi_host_enabled());
        }
    }

    #[test]
    fn start_failure_keeps_state() {
        let mut hal = MockDisplayHal::new();
        let mut link = link();
        let t = DisplayProfile::DEFAULT.timing();
        assert!(link.init(&mut hal, &mut NoopDelay::new(), t).is_ok());
        hal.fail_at(FailPoint::DsiStart);
        assert!(link.start(&mut hal).is_err());
        assert_eq!(link.state(), LinkState::PhyTimingSet);
        hal.clear_failure();
        assert!(link.start(&mut hal).is_ok());
        assert_eq!(link.state(), LinkState::Started);
        assert!(hal.dsi_started());
    }

    #[test]
    fn deinit_is_idempotent() {
        let mut hal = MockDisplayHal::new();
        let mut link = link();
        link.deinit(&mut hal);
        link.deinit(&mut hal);
        assert_eq!(link.state(), LinkState::Unpowered);
        assert_eq!(hal.count(|c| *c == HalCall::DsiReset), 2);
    }

    #[test]
    fn front_porch_update_is_tracked() {
        let mut hal = MockDisplayHal::new();
        let mut link = link();
        link.set_vertical_front_porch(100);
        assert!(link.video_mode().is_none());
        let t = DisplayProfile::DEFAULT.timing();
        assert!(link.init(&mut hal, &mut NoopDelay::new(), t).is_ok());
        link.set_vertical_front_porch(298);
        assert_eq!(link.video_mode().map(|v| v.vertical_front_porch), Some(298));
    }
}

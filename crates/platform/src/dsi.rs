//! DSI host abstraction.
//!
//! Parameter records mirror the DSI host register groups (host init, D-PHY
//! PLL, video mode, PHY timers, host timeouts, flow control). The
//! [`DsiHost`] trait is the seam between the serial-link controller in the
//! firmware crate and the register layer.

use crate::display::HalError;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Colour coding of the transmitted pixel stream (LCOLCR.COLC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorCoding {
    /// 16 bpp, 5-6-5.
    Rgb565,
    /// 18 bpp, 6-6-6.
    Rgb666,
    /// 24 bpp, 8-8-8.
    Rgb888,
}

impl ColorCoding {
    /// Bits transmitted per pixel.
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            Self::Rgb565 => 16,
            Self::Rgb666 => 18,
            Self::Rgb888 => 24,
        }
    }
}

/// Video-mode transmission scheme (VMCR.VMT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VideoMode {
    /// Non-burst with sync pulses.
    NonBurstSyncPulses,
    /// Non-burst with sync events.
    NonBurstSyncEvents,
    /// Burst: each line is one packet.
    Burst,
}

/// Signal polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Active high.
    ActiveHigh,
    /// Active low.
    ActiveLow,
}

/// Number of data lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaneCount {
    /// One data lane.
    One,
    /// Two data lanes.
    Two,
}

/// D-PHY band (lane bit rate) classification. Selects the HS2LP / LP2HS
/// defaults inside the PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyFrequencyRange {
    /// 80 – 100 MHz.
    Mhz80To100,
    /// 100 – 120 MHz.
    Mhz100To120,
    /// 120 – 160 MHz.
    Mhz120To160,
    /// 160 – 200 MHz.
    Mhz160To200,
    /// 200 – 240 MHz.
    Mhz200To240,
    /// 240 – 320 MHz.
    Mhz240To320,
    /// 320 – 390 MHz.
    Mhz320To390,
    /// 390 – 450 MHz.
    Mhz390To450,
    /// 450 – 510 MHz.
    Mhz450To510,
}

/// D-PHY PLL VCO range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllVcoRange {
    /// 500 – 800 MHz.
    Mhz500To800,
    /// 800 MHz – 1 GHz.
    Mhz800To1000,
}

/// D-PHY PLL charge-pump / loop-filter band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllBand {
    /// 2000 – 4400 Hz.
    Hz2000To4400,
    /// 4400 – 14100 Hz.
    Hz4400To14100,
    /// 14100 – 30900 Hz.
    Hz14100To30900,
    /// 30900 – 45700 Hz.
    Hz30900To45700,
    /// 45700 – 50000 Hz.
    Hz45700To50000,
}

bitflags::bitflags! {
    /// Blanking regions in which LP commands may be sent during video mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LpRegions: u8 {
        /// Horizontal front porch.
        const HFP = 1 << 0;
        /// Horizontal back porch.
        const HBP = 1 << 1;
        /// Vertical active.
        const VACT = 1 << 2;
        /// Vertical front porch.
        const VFP = 1 << 3;
        /// Vertical back porch.
        const VBP = 1 << 4;
        /// Vertical sync active.
        const VSYNC = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Flow-control features (PCR register).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FlowControl: u8 {
        /// CRC check on reception.
        const CRC_RX = 1 << 0;
        /// ECC check on reception.
        const ECC_RX = 1 << 1;
        /// Bus turn-around.
        const BTA = 1 << 2;
        /// EoTp reception.
        const EOTP_RX = 1 << 3;
        /// EoTp transmission.
        const EOTP_TX = 1 << 4;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LpRegions {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "LpRegions({=u8:#x})", self.bits());
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FlowControl {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "FlowControl({=u8:#x})", self.bits());
    }
}

// ---------------------------------------------------------------------------
// Parameter records
// ---------------------------------------------------------------------------

/// Host initialisation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DsiHostInit {
    /// Automatic clock-lane control. Must stay off: the feature is broken in
    /// silicon (ES0499 erratum "DSI automatic clock lane control not
    /// functional").
    pub automatic_clock_lane_control: bool,
    /// TX escape clock divider applied to the lane byte clock.
    pub tx_escape_clock_div: u8,
    /// Data lanes in use.
    pub lanes: LaneCount,
    /// D-PHY band.
    pub phy_frequency_range: PhyFrequencyRange,
    /// LP transmitter offset (LPXO). Zero means no offset.
    pub phy_low_power_offset: u8,
}

/// D-PHY PLL parameters.
///
/// `lane_bit_rate = ref / idf * 2 * ndiv / odf`, byte clock = bit rate / 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DsiPllInit {
    /// Loop multiplier.
    pub ndiv: u16,
    /// Input divider.
    pub idf: u8,
    /// Output divider.
    pub odf: u8,
    /// VCO range.
    pub vco_range: PllVcoRange,
    /// Charge pump band.
    pub charge_pump: PllBand,
    /// Loop filter band.
    pub loop_filter: PllBand,
}

/// Video-mode packet geometry.
///
/// Horizontal fields are in lane byte clock cycles; vertical fields are in
/// lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VideoModeConfig {
    /// Virtual channel ID.
    pub virtual_channel: u8,
    /// HSYNC polarity.
    pub hsync_polarity: Polarity,
    /// VSYNC polarity.
    pub vsync_polarity: Polarity,
    /// Data-enable polarity.
    pub data_enable_polarity: Polarity,
    /// Transmitted colour coding.
    pub color_coding: ColorCoding,
    /// Transmission scheme.
    pub mode: VideoMode,
    /// Pixels per video packet.
    pub packet_size: u16,
    /// Chunks per line (non-burst only).
    pub number_of_chunks: u16,
    /// Null packet size (non-burst only).
    pub null_packet_size: u16,
    /// HSA in byte clock cycles.
    pub horizontal_sync_active: u32,
    /// HBP in byte clock cycles.
    pub horizontal_back_porch: u32,
    /// Total line in byte clock cycles.
    pub horizontal_line: u32,
    /// VSA in lines.
    pub vertical_sync_active: u32,
    /// VBP in lines.
    pub vertical_back_porch: u32,
    /// VFP in lines.
    pub vertical_front_porch: u32,
    /// Active lines.
    pub vertical_active: u32,
    /// LP commands allowed during video mode.
    pub lp_command_enable: bool,
    /// Largest LP packet in the VSA/VBP/VFP regions, in bytes.
    pub lp_largest_packet_size: u8,
    /// Largest LP packet in the VACT region, in bytes.
    pub lp_vact_largest_packet_size: u8,
    /// Regions where LP transmission is allowed.
    pub lp_regions: LpRegions,
    /// Request a bus-turn-around acknowledge at the end of each frame.
    pub frame_bta_acknowledge: bool,
    /// Loosely packed 18-bit pixels.
    pub loosely_packed: bool,
}

/// D-PHY transition timers, in lane byte clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyTimerConfig {
    /// Clock lane HS → LP.
    pub clock_lane_hs2lp: u16,
    /// Clock lane LP → HS.
    pub clock_lane_lp2hs: u16,
    /// Data lane HS → LP.
    pub data_lane_hs2lp: u16,
    /// Data lane LP → HS.
    pub data_lane_lp2hs: u16,
    /// Maximum read time.
    pub data_lane_max_read: u16,
    /// Minimum wait before a HS clock request after stop state.
    pub stop_wait_time: u8,
}

/// Host timeout counters. Zero disables a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostTimeouts {
    /// Timeout clock divider applied to the lane byte clock.
    pub timeout_clock_div: u8,
    /// High-speed transmission timeout.
    pub high_speed_transmission: u16,
    /// Low-power reception timeout.
    pub low_power_reception: u16,
    /// High-speed read response timeout.
    pub high_speed_read: u16,
    /// Low-power read response timeout.
    pub low_power_read: u16,
    /// High-speed write response timeout.
    pub high_speed_write: u16,
    /// Presp mode for high-speed writes.
    pub high_speed_write_presp_mode: bool,
    /// Low-power write response timeout.
    pub low_power_write: u16,
    /// Bus-turn-around timeout.
    pub bta: u16,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// DSI host register layer.
///
/// `configure_*` calls mirror the vendor HAL and may reject a parameter set;
/// the plain setters are single register writes that cannot fail.
pub trait DsiHost {
    /// Pulse the RCC reset line of the DSI block.
    fn dsi_reset(&mut self);

    /// Gate the DSI bus clock.
    fn dsi_set_clock(&mut self, enabled: bool);

    /// Host enable bit (CR.EN).
    fn dsi_set_host_enabled(&mut self, enabled: bool);

    /// Wrapper-level D-PHY PLL enable.
    fn dsi_set_pll_enabled(&mut self, enabled: bool);

    /// Enable the clock lane and the digital section of the D-PHY
    /// (PCTLR.CKE | PCTLR.DEN).
    fn dsi_enable_phy_lanes(&mut self);

    /// Write the TX escape clock divider (CCR.TXECKDIV). Zero clears it.
    fn dsi_set_escape_divider(&mut self, divider: u8);

    /// Host and D-PHY PLL initialisation.
    fn dsi_configure_host(&mut self, host: &DsiHostInit, pll: &DsiPllInit)
        -> Result<(), HalError>;

    /// Virtual channel used for generic reads/writes.
    fn dsi_set_generic_vcid(&mut self, vcid: u8) -> Result<(), HalError>;

    /// Video-mode packet geometry.
    fn dsi_configure_video_mode(&mut self, config: &VideoModeConfig) -> Result<(), HalError>;

    /// D-PHY transition timers.
    fn dsi_configure_phy_timer(&mut self, config: &PhyTimerConfig) -> Result<(), HalError>;

    /// Host timeout counters.
    fn dsi_configure_host_timeouts(&mut self, config: &HostTimeouts) -> Result<(), HalError>;

    /// Flow-control features.
    fn dsi_configure_flow_control(&mut self, flow: FlowControl) -> Result<(), HalError>;

    /// Start continuous video-mode transmission.
    fn dsi_start(&mut self) -> Result<(), HalError>;

    /// Overwrite VVFPCR with a new vertical front porch.
    fn dsi_write_vertical_front_porch(&mut self, lines: u32);

    /// DCS / generic write used by panel command drivers.
    fn dsi_write_command(&mut self, channel: u8, command: u8, params: &[u8])
        -> Result<(), HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_coding_widths() {
        assert_eq!(ColorCoding::Rgb565.bits_per_pixel(), 16);
        assert_eq!(ColorCoding::Rgb666.bits_per_pixel(), 18);
        assert_eq!(ColorCoding::Rgb888.bits_per_pixel(), 24);
    }

    #[test]
    fn host_timeouts_default_is_all_disabled() {
        let t = HostTimeouts::default();
        assert_eq!(t.timeout_clock_div, 0);
        assert_eq!(t.bta, 0);
        assert!(!t.high_speed_write_presp_mode);
    }

    #[test]
    fn lp_regions_all_covers_every_blanking_region() {
        assert_eq!(LpRegions::all().bits(), 0x3F);
    }
}

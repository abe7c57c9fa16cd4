//! Display timing profiles.
//!
//! Each profile pairs a DSI lane configuration with a pixel clock and a
//! horizontal geometry. All profiles drive the same 520-line panel; the
//! vertical front porch picks the refresh rate at run time.
//!
//! Profiles are selected by [`DisplayProfile`] when the driver is built.
//! [`DisplayProfile::DEFAULT`] is the configuration fielded devices run.

use platform::dsi::{ColorCoding, PhyFrequencyRange};

// ---------------------------------------------------------------------------
// Refresh rates
// ---------------------------------------------------------------------------

/// Nominal refresh rates with a tabulated front porch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshRate {
    /// 10 Hz
    Hz10,
    /// 20 Hz
    Hz20,
    /// 30 Hz
    Hz30,
    /// 40 Hz
    Hz40,
    /// 50 Hz
    Hz50,
    /// 60 Hz
    Hz60,
}

impl RefreshRate {
    /// All rates, slowest first.
    pub const ALL: [Self; 6] = [
        Self::Hz10,
        Self::Hz20,
        Self::Hz30,
        Self::Hz40,
        Self::Hz50,
        Self::Hz60,
    ];

    /// Nominal rate in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz10 => 10,
            Self::Hz20 => 20,
            Self::Hz30 => 30,
            Self::Hz40 => 40,
            Self::Hz50 => 50,
            Self::Hz60 => 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile building blocks
// ---------------------------------------------------------------------------

/// DSI lane byte clock and the D-PHY settings that go with it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LaneTiming {
    /// Lane byte clock in Hz (lane bit rate / 8).
    pub byte_freq_hz: u32,
    /// DSI PLL loop multiplier at a 32 MHz HSE.
    pub pll_ndiv: u16,
    /// DSI PLL output divider.
    pub pll_odf: u8,
    /// D-PHY band.
    pub phy_frequency_range: PhyFrequencyRange,
    /// TX escape clock divider. Keeps the escape clock below 20 MHz.
    pub tx_escape_clock_div: u8,
    /// Clock lane HS → LP, byte clocks (RM0456 table 445).
    pub clock_hs2lp: u16,
    /// Clock lane LP → HS, byte clocks.
    pub clock_lp2hs: u16,
    /// Data lane HS → LP, byte clocks.
    pub data_hs2lp: u16,
    /// Data lane LP → HS, byte clocks.
    pub data_lp2hs: u16,
}

/// LTDC pixel clock and the PLL3 dividers producing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelClock {
    /// Nominal pixel clock in Hz.
    pub hz: u32,
    /// PLL3 VCO multiplier (4 MHz VCO input).
    pub pll3_n: u16,
    /// PLL3 R divider.
    pub pll3_r: u8,
}

/// Horizontal geometry in pixel clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HorizontalTiming {
    /// Active pixels per line.
    pub hact: u32,
    /// Horizontal front porch.
    pub hfp: u32,
    /// Pixels per DSI video packet.
    pub lcd_width: u16,
}

const LANE_62MHZ: LaneTiming = LaneTiming {
    byte_freq_hz: 62_000_000,
    pll_ndiv: 62,
    pll_odf: 2,
    phy_frequency_range: PhyFrequencyRange::Mhz450To510,
    tx_escape_clock_div: 4, // 15.5 MHz
    clock_hs2lp: 11,
    clock_lp2hs: 40,
    data_hs2lp: 12,
    data_lp2hs: 23,
};

const LANE_16MHZ: LaneTiming = LaneTiming {
    byte_freq_hz: 16_000_000,
    pll_ndiv: 48,
    pll_odf: 6,
    phy_frequency_range: PhyFrequencyRange::Mhz120To160,
    tx_escape_clock_div: 2, // 8 MHz
    clock_hs2lp: 5,
    clock_lp2hs: 14,
    data_hs2lp: 6,
    data_lp2hs: 11,
};

const LANE_28M5HZ: LaneTiming = LaneTiming {
    byte_freq_hz: 28_500_000,
    pll_ndiv: 57,
    pll_odf: 4,
    phy_frequency_range: PhyFrequencyRange::Mhz200To240,
    tx_escape_clock_div: 2, // 14.25 MHz
    clock_hs2lp: 7,
    clock_lp2hs: 21,
    data_hs2lp: 8,
    data_lp2hs: 15,
};

const LANE_56MHZ: LaneTiming = LaneTiming {
    byte_freq_hz: 56_000_000,
    pll_ndiv: 56,
    pll_odf: 2,
    phy_frequency_range: PhyFrequencyRange::Mhz450To510,
    tx_escape_clock_div: 4, // 14 MHz
    clock_hs2lp: 11,
    clock_lp2hs: 40,
    data_hs2lp: 12,
    data_lp2hs: 23,
};

const PCLK_18M52: PixelClock = PixelClock {
    hz: 18_518_519,
    pll3_n: 125,
    pll3_r: 27,
};

const PCLK_15M5: PixelClock = PixelClock {
    hz: 15_500_000,
    pll3_n: 124,
    pll3_r: 32,
};

const PCLK_18M67: PixelClock = PixelClock {
    hz: 18_666_667,
    pll3_n: 112,
    pll3_r: 24,
};

const HACT_480: HorizontalTiming = HorizontalTiming {
    hact: 480,
    hfp: 56,
    lcd_width: 480,
};

// Same line length as HACT_480 at the 18.5 MHz pixel clock.
const HACT_430_LONG_HFP: HorizontalTiming = HorizontalTiming {
    hact: 430,
    hfp: 106,
    lcd_width: 430,
};

const HACT_430: HorizontalTiming = HorizontalTiming {
    hact: 430,
    hfp: 20,
    lcd_width: 430,
};

/// Front porches for 10, 20, 30, 40, 50 and 60 Hz.
const VFP_VARIABLE: [u32; 6] = [2836, 1144, 580, 298, 129, 16];

/// Every slot pinned to the 60 Hz porch.
const VFP_FIXED_60HZ: [u32; 6] = [16; 6];

// ---------------------------------------------------------------------------
// Timing profile
// ---------------------------------------------------------------------------

/// One complete display timing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    /// DSI lane configuration.
    pub lane: LaneTiming,
    /// Pixel clock.
    pub pixel: PixelClock,
    /// `lane.byte_freq_hz / pixel.hz`, precomputed. Converts horizontal
    /// pixel counts into byte-clock cycles for the DSI video registers.
    pub byte_clk_to_pixel_clk_ratio: f32,
    /// Vertical front porch per [`RefreshRate`], slowest first.
    pub vfp_table: [u32; 6],
    /// Horizontal geometry.
    pub horizontal: HorizontalTiming,
    /// Colour coding on the link.
    pub color_coding: ColorCoding,
}

impl TimingProfile {
    /// Front porch giving `rate`.
    pub const fn vfp(&self, rate: RefreshRate) -> u32 {
        let [hz10, hz20, hz30, hz40, hz50, hz60] = self.vfp_table;
        match rate {
            RefreshRate::Hz10 => hz10,
            RefreshRate::Hz20 => hz20,
            RefreshRate::Hz30 => hz30,
            RefreshRate::Hz40 => hz40,
            RefreshRate::Hz50 => hz50,
            RefreshRate::Hz60 => hz60,
        }
    }

    /// Front porch programmed at bring-up (60 Hz).
    pub const fn default_vfp(&self) -> u32 {
        self.vfp(RefreshRate::Hz60)
    }
}

// The ratios are const-evaluated float divisions.
#[allow(clippy::arithmetic_side_effects)]
mod table {
    use super::*;

    pub(super) static LANE62_PCLK18_HACT480_RGB888: TimingProfile = TimingProfile {
        lane: LANE_62MHZ,
        pixel: PCLK_18M52,
        byte_clk_to_pixel_clk_ratio: 62.0 / 18.518_519,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_480,
        color_coding: ColorCoding::Rgb888,
    };

    pub(super) static LANE62_PCLK18_HACT430_RGB888: TimingProfile = TimingProfile {
        lane: LANE_62MHZ,
        pixel: PCLK_18M52,
        byte_clk_to_pixel_clk_ratio: 62.0 / 18.518_519,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_430_LONG_HFP,
        color_coding: ColorCoding::Rgb888,
    };

    pub(super) static LANE62_PCLK18_HACT480_RGB565: TimingProfile = TimingProfile {
        lane: LANE_62MHZ,
        pixel: PCLK_18M52,
        byte_clk_to_pixel_clk_ratio: 62.0 / 18.518_519,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_480,
        color_coding: ColorCoding::Rgb565,
    };

    pub(super) static LANE62_PCLK15_HACT430_RGB888: TimingProfile = TimingProfile {
        lane: LANE_62MHZ,
        pixel: PCLK_15M5,
        byte_clk_to_pixel_clk_ratio: 62.0 / 15.5,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_430,
        color_coding: ColorCoding::Rgb888,
    };

    pub(super) static LANE62_PCLK15_HACT430_RGB565: TimingProfile = TimingProfile {
        lane: LANE_62MHZ,
        pixel: PCLK_15M5,
        byte_clk_to_pixel_clk_ratio: 62.0 / 15.5,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_430,
        color_coding: ColorCoding::Rgb565,
    };

    pub(super) static LANE16_PCLK15_HACT430_RGB565: TimingProfile = TimingProfile {
        lane: LANE_16MHZ,
        pixel: PCLK_15M5,
        byte_clk_to_pixel_clk_ratio: 16.0 / 15.5,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_430,
        color_coding: ColorCoding::Rgb565,
    };

    pub(super) static LANE28_PCLK18_HACT480_RGB888: TimingProfile = TimingProfile {
        lane: LANE_28M5HZ,
        pixel: PCLK_18M52,
        byte_clk_to_pixel_clk_ratio: 28.5 / 18.518_519,
        vfp_table: VFP_VARIABLE,
        horizontal: HACT_480,
        color_coding: ColorCoding::Rgb888,
    };

    pub(super) static LANE56_PCLK18_HACT480_RGB888: TimingProfile = TimingProfile {
        lane: LANE_56MHZ,
        pixel: PCLK_18M67,
        byte_clk_to_pixel_clk_ratio: 56.0 / 18.666_667,
        vfp_table: VFP_FIXED_60HZ,
        horizontal: HACT_480,
        color_coding: ColorCoding::Rgb888,
    };
}

/// Supported timing configurations.
///
/// Variant names read lane byte clock (MHz), pixel clock (MHz), active
/// width and link colour coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayProfile {
    /// 62 MHz lanes, 18.518519 MHz pixels, 480 px, RGB888.
    Lane62Pclk18Hact480Rgb888,
    /// 62 MHz lanes, 18.518519 MHz pixels, 430 px, RGB888.
    Lane62Pclk18Hact430Rgb888,
    /// 62 MHz lanes, 18.518519 MHz pixels, 480 px, RGB565.
    Lane62Pclk18Hact480Rgb565,
    /// 62 MHz lanes, 15.5 MHz pixels, 430 px, RGB888.
    Lane62Pclk15Hact430Rgb888,
    /// 62 MHz lanes, 15.5 MHz pixels, 430 px, RGB565.
    Lane62Pclk15Hact430Rgb565,
    /// 16 MHz lanes, 15.5 MHz pixels, 430 px, RGB565.
    Lane16Pclk15Hact430Rgb565,
    /// 28.5 MHz lanes, 18.518519 MHz pixels, 480 px, RGB888.
    Lane28Pclk18Hact480Rgb888,
    /// 56 MHz lanes, 18.666667 MHz pixels, 480 px, RGB888. Fixed 60 Hz.
    Lane56Pclk18Hact480Rgb888,
}

impl DisplayProfile {
    /// Profile fielded devices run.
    pub const DEFAULT: Self = Self::Lane56Pclk18Hact480Rgb888;

    /// Every profile in legacy index order.
    pub const ALL: [Self; 8] = [
        Self::Lane62Pclk18Hact480Rgb888,
        Self::Lane62Pclk18Hact430Rgb888,
        Self::Lane62Pclk18Hact480Rgb565,
        Self::Lane62Pclk15Hact430Rgb888,
        Self::Lane62Pclk15Hact430Rgb565,
        Self::Lane16Pclk15Hact430Rgb565,
        Self::Lane28Pclk18Hact480Rgb888,
        Self::Lane56Pclk18Hact480Rgb888,
    ];

    /// Profile at position `index` of the legacy configuration table.
    pub const fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => Self::Lane62Pclk18Hact480Rgb888,
            1 => Self::Lane62Pclk18Hact430Rgb888,
            2 => Self::Lane62Pclk18Hact480Rgb565,
            3 => Self::Lane62Pclk15Hact430Rgb888,
            4 => Self::Lane62Pclk15Hact430Rgb565,
            5 => Self::Lane16Pclk15Hact430Rgb565,
            6 => Self::Lane28Pclk18Hact480Rgb888,
            7 => Self::Lane56Pclk18Hact480Rgb888,
            _ => return None,
        })
    }

    /// Position in the legacy configuration table.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Timing parameters of this profile.
    pub fn timing(self) -> &'static TimingProfile {
        match self {
            Self::Lane62Pclk18Hact480Rgb888 => &table::LANE62_PCLK18_HACT480_RGB888,
            Self::Lane62Pclk18Hact430Rgb888 => &table::LANE62_PCLK18_HACT430_RGB888,
            Self::Lane62Pclk18Hact480Rgb565 => &table::LANE62_PCLK18_HACT480_RGB565,
            Self::Lane62Pclk15Hact430Rgb888 => &table::LANE62_PCLK15_HACT430_RGB888,
            Self::Lane62Pclk15Hact430Rgb565 => &table::LANE62_PCLK15_HACT430_RGB565,
            Self::Lane16Pclk15Hact430Rgb565 => &table::LANE16_PCLK15_HACT430_RGB565,
            Self::Lane28Pclk18Hact480Rgb888 => &table::LANE28_PCLK18_HACT480_RGB888,
            Self::Lane56Pclk18Hact480Rgb888 => &table::LANE56_PCLK18_HACT480_RGB888,
        }
    }
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_index_round_trips() {
        for (i, profile) in DisplayProfile::ALL.iter().enumerate() {
            let index = u8::try_from(i).unwrap_or(u8::MAX);
            assert_eq!(DisplayProfile::from_index(index), Some(*profile));
            assert_eq!(profile.index(), index);
        }
        assert_eq!(DisplayProfile::from_index(8), None);
    }

    #[test]
    fn default_is_index_seven() {
        assert_eq!(DisplayProfile::default().index(), 7);
        let t = DisplayProfile::DEFAULT.timing();
        assert_eq!(t.lane.byte_freq_hz, 56_000_000);
        assert_eq!(t.pixel.hz, 18_666_667);
        assert_eq!(t.horizontal.hact, 480);
        assert_eq!(t.color_coding, ColorCoding::Rgb888);
    }

    /// The precomputed ratio must match the two clocks it is derived from.
    #[test]
    fn ratio_matches_clocks() {
        for profile in DisplayProfile::ALL {
            let t = profile.timing();
            let expected = f64::from(t.lane.byte_freq_hz) / f64::from(t.pixel.hz);
            let actual = f64::from(t.byte_clk_to_pixel_clk_ratio);
            assert!(
                (actual - expected).abs() / expected < 1e-5,
                "{profile:?}: ratio {actual} vs {expected}"
            );
        }
    }

    /// Faster refresh must never need a longer front porch.
    #[test]
    fn vfp_non_increasing_with_rate() {
        for profile in DisplayProfile::ALL {
            let t = profile.timing();
            for pair in RefreshRate::ALL.windows(2) {
                if let [slower, faster] = pair {
                    assert!(
                        t.vfp(*faster) <= t.vfp(*slower),
                        "{profile:?}: {}Hz porch above {}Hz porch",
                        faster.hz(),
                        slower.hz()
                    );
                }
            }
        }
    }

    #[test]
    fn sixty_hz_porch_is_sixteen_lines() {
        for profile in DisplayProfile::ALL {
            assert_eq!(profile.timing().default_vfp(), 16);
        }
    }

    #[test]
    fn packet_size_covers_active_width() {
        for profile in DisplayProfile::ALL {
            let h = profile.timing().horizontal;
            assert!(u32::from(h.lcd_width) >= h.hact);
        }
    }
}

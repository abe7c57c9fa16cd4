//! PLL3 and DSI PLL frequency arithmetic for the display clock domains.
//!
//! # Clock Tree
//!
//!   HSE (32 MHz) -> PLL3M (div 8) -> VCO_IN (4 MHz)
//!                                 -> VCO_OUT (x N)
//!                                   -> PLL3R (div R) = LTDC pixel clock
//!                                   -> PLL3P (div 8) = DSI kernel clock during bring-up
//!
//!   HSE (32 MHz) -> IDF (div 4) -> x2 x NDIV -> ODF -> lane bit rate
//!                                                    -> /8 = lane byte clock
//!
//! A 16 MHz crystal halves both references: PLL3M drops to 4 and NDIV is
//! doubled, so every output frequency stays the same.
//!
//! # Byte clock / pixel clock conversion
//!
//! The DSI host counts horizontal timing in lane byte clocks; the panel
//! timings are in pixel clocks. Each horizontal value is scaled by
//! `byte_clk / pixel_clk` and truncated.
//!
//! References:
//! - STM32U5 RM0456, RCC PLL configuration (VCO input range 0: 4-8 MHz)
//! - STM32U5 RM0456, DSI host wrapper PLL (NDIV / IDF / ODF)

use platform::clock_config::HseFrequency;

/// PLL3 P output divider (DSI bring-up clock).
pub const PLL3_P_DIV: u8 = 8;

/// PLL3 Q output divider (unused output, kept at reset-safe value).
pub const PLL3_Q_DIV: u8 = 8;

/// DSI PLL input divider.
pub const DSI_PLL_IDF: u8 = 4;

/// Lane bits per byte clock.
pub const DSI_BITS_PER_BYTE_CLOCK: u32 = 8;

/// PLL3 VCO input (`hse / m`), Hz.
pub const fn pll3_vco_input_hz(hse: HseFrequency) -> u32 {
    match hse.hz().checked_div(hse.pll3_m() as u32) {
        Some(hz) => hz,
        None => 0,
    }
}

/// PLL3 VCO output for multiplier `n`, Hz.
pub const fn pll3_vco_hz(hse: HseFrequency, n: u16) -> u32 {
    pll3_vco_input_hz(hse).saturating_mul(n as u32)
}

/// PLL3 output frequency for post-divider `div`, Hz. Integer mode only.
pub const fn pll3_output_hz(hse: HseFrequency, n: u16, div: u8) -> u32 {
    match pll3_vco_hz(hse, n).checked_div(div as u32) {
        Some(hz) => hz,
        None => 0,
    }
}

/// NDIV for `hse`, given the NDIV tabulated for a 32 MHz crystal.
pub const fn dsi_ndiv(hse: HseFrequency, ndiv_at_32mhz: u16) -> u16 {
    ndiv_at_32mhz.saturating_mul(hse.dsi_ndiv_multiplier())
}

/// DSI lane bit rate, Hz: `hse / idf * 2 * ndiv / odf`.
// u64 intermediates: hse < 2^26, 2 * ndiv < 2^10, so the product fits easily;
// the divisors are checked.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub const fn dsi_lane_bit_rate_hz(hse: HseFrequency, ndiv: u16, idf: u8, odf: u8) -> u32 {
    if idf == 0 || odf == 0 {
        return 0;
    }
    let hz = hse.hz() as u64 * 2 * ndiv as u64 / (idf as u64 * odf as u64);
    if hz > u32::MAX as u64 {
        u32::MAX
    } else {
        hz as u32
    }
}

/// DSI lane byte clock, Hz.
pub const fn dsi_lane_byte_clock_hz(hse: HseFrequency, ndiv: u16, idf: u8, odf: u8) -> u32 {
    match dsi_lane_bit_rate_hz(hse, ndiv, idf, odf).checked_div(DSI_BITS_PER_BYTE_CLOCK) {
        Some(hz) => hz,
        None => 0,
    }
}

/// Convert `pixels` pixel clocks into lane byte clocks, truncating.
// Pixel counts are < 2^12; the f32 product is exact enough and non-negative.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::arithmetic_side_effects
)]
pub fn pixels_to_byte_clocks(pixels: u32, byte_clk_to_pixel_clk_ratio: f32) -> u32 {
    (pixels as f32 * byte_clk_to_pixel_clk_ratio) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::profile::DisplayProfile;

    /// RM0456: PLL input range 0 covers 4-8 MHz.
    #[test]
    fn pll3_vco_input_is_4mhz_for_both_crystals() {
        assert_eq!(pll3_vco_input_hz(HseFrequency::Mhz32), 4_000_000);
        assert_eq!(pll3_vco_input_hz(HseFrequency::Mhz16), 4_000_000);
    }

    /// PLL3R must land within 2 Hz of the tabulated pixel clock.
    #[test]
    fn pll3r_produces_pixel_clock() {
        for profile in DisplayProfile::ALL {
            let t = profile.timing();
            let hz = pll3_output_hz(HseFrequency::Mhz32, t.pixel.pll3_n, t.pixel.pll3_r);
            let diff = i64::from(hz) - i64::from(t.pixel.hz);
            assert!(
                diff.unsigned_abs() <= 2,
                "{profile:?}: PLL3R {hz} Hz vs pixel clock {} Hz",
                t.pixel.hz
            );
        }
    }

    /// RM0456: PLL VCO output must stay within 128-544 MHz.
    #[test]
    fn pll3_vco_in_range() {
        for profile in DisplayProfile::ALL {
            let vco = pll3_vco_hz(HseFrequency::Mhz32, profile.timing().pixel.pll3_n);
            assert!((128_000_000..=544_000_000).contains(&vco), "{profile:?}: VCO {vco} Hz");
        }
    }

    /// The DSI PLL must reproduce the tabulated lane byte clock exactly.
    #[test]
    fn dsi_pll_produces_lane_byte_clock() {
        for hse in [HseFrequency::Mhz32, HseFrequency::Mhz16] {
            for profile in DisplayProfile::ALL {
                let lane = profile.timing().lane;
                let hz = dsi_lane_byte_clock_hz(
                    hse,
                    dsi_ndiv(hse, lane.pll_ndiv),
                    DSI_PLL_IDF,
                    lane.pll_odf,
                );
                assert_eq!(hz, lane.byte_freq_hz, "{profile:?} at {} Hz HSE", hse.hz());
            }
        }
    }

    #[test]
    fn default_profile_horizontal_timings_in_byte_clocks() {
        let ratio = DisplayProfile::DEFAULT.timing().byte_clk_to_pixel_clk_ratio;
        assert_eq!(pixels_to_byte_clocks(6, ratio), 17);
        assert_eq!(pixels_to_byte_clocks(2, ratio), 5);
        assert_eq!(pixels_to_byte_clocks(480 + 6 + 2 + 56, ratio), 1631);
    }

    #[test]
    fn zero_divider_yields_zero() {
        assert_eq!(pll3_output_hz(HseFrequency::Mhz32, 100, 0), 0);
        assert_eq!(dsi_lane_bit_rate_hz(HseFrequency::Mhz32, 56, 0, 2), 0);
    }
}

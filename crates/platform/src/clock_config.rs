//! Clock tree records for the LTDC / DSI display pipeline.
//!
//! Encodes which display peripherals need which clock sources, the PLL3
//! parameter block handed to the RCC, and the [`ClockControl`] seam the
//! clock-domain controller drives.
//!
//! # Background
//!
//! PLL3 is dedicated to the display. Its R output is the LTDC pixel clock and
//! its P output clocks the DSI host while the D-PHY is still unlocked. Once
//! the D-PHY PLL runs, the DSI kernel clock is switched to the PHY-generated
//! byte clock and PLL3P is no longer needed by the link.
//!
//! # Sources
//!
//! - STM32U5 Reference Manual (RM0456): RCC clock tree, PLL3 configuration
//! - RM0456 DSI host chapter: D-PHY clock selection during start-up

/// Clock sources that feed the display peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// External high-speed oscillator, PLL3 reference input.
    Hse,

    /// PLL3 P output.
    ///
    /// Used by: DSI host kernel clock during D-PHY bring-up.
    Pll3P,

    /// PLL3 R output.
    ///
    /// Used by: LTDC pixel clock.
    Pll3R,

    /// Byte clock generated by the DSI D-PHY PLL.
    ///
    /// Used by: DSI host kernel clock once the PHY is running.
    DsiPhy,
}

/// A display peripheral and its mandatory clock-source dependency.
pub struct ClockRequirement {
    /// Short identifier for the peripheral (e.g. `"LTDC"`).
    pub peripheral: &'static str,
    /// The clock source that must be active before this peripheral is init'd.
    pub required_source: ClockSource,
    /// Human-readable note explaining why this requirement exists.
    pub note: &'static str,
}

/// All clock requirements of the display pipeline.
pub const DISPLAY_CLOCK_REQUIREMENTS: &[ClockRequirement] = &[
    // ── PLL3 consumers ───────────────────────────────────────────────────────
    ClockRequirement {
        peripheral: "LTDC",
        required_source: ClockSource::Pll3R,
        note: "pixel clock = PLL3R; must equal the timing profile's pixel clock, \
               otherwise the DSI byte-to-pixel conversion no longer matches",
    },
    ClockRequirement {
        peripheral: "DSI (bring-up)",
        required_source: ClockSource::Pll3P,
        note: "the host register interface needs a kernel clock before the D-PHY \
               PLL is locked",
    },
    // ── D-PHY consumers ──────────────────────────────────────────────────────
    ClockRequirement {
        peripheral: "DSI",
        required_source: ClockSource::DsiPhy,
        note: "after the escape divider is programmed the host runs from the \
               PHY byte clock",
    },
];

// ---------------------------------------------------------------------------
// Source oscillator
// ---------------------------------------------------------------------------

/// Supported HSE crystal frequencies.
///
/// The PLL3 pre-divider and the DSI PLL multiplier both depend on it. The
/// default follows the `hse-16mhz` Cargo feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HseFrequency {
    /// 16 MHz crystal.
    Mhz16,
    /// 32 MHz crystal.
    Mhz32,
}

impl HseFrequency {
    /// Oscillator frequency in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Mhz16 => 16_000_000,
            Self::Mhz32 => 32_000_000,
        }
    }

    /// PLL3 M divider that brings the reference down to the 4 MHz VCO input.
    pub const fn pll3_m(self) -> u8 {
        match self {
            Self::Mhz16 => 4,
            Self::Mhz32 => 8,
        }
    }

    /// Multiplier applied to a profile's DSI PLL N divider.
    ///
    /// The profile table is written for a 32 MHz reference; a 16 MHz crystal
    /// halves the PLL input so N is doubled.
    pub const fn dsi_ndiv_multiplier(self) -> u16 {
        match self {
            Self::Mhz16 => 2,
            Self::Mhz32 => 1,
        }
    }
}

impl Default for HseFrequency {
    fn default() -> Self {
        if cfg!(feature = "hse-16mhz") {
            Self::Mhz16
        } else {
            Self::Mhz32
        }
    }
}

// ---------------------------------------------------------------------------
// PLL3
// ---------------------------------------------------------------------------

/// PLL input frequency range selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllInputRange {
    /// 4 – 8 MHz reference after the M divider.
    Range0,
    /// 8 – 16 MHz reference after the M divider.
    Range1,
}

bitflags::bitflags! {
    /// PLL3 outputs to enable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pll3Outputs: u8 {
        /// P output (DSI bring-up clock).
        const P = 1 << 0;
        /// Q output (unused by the display).
        const Q = 1 << 1;
        /// R output (LTDC pixel clock).
        const R = 1 << 2;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Pll3Outputs {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "Pll3Outputs({=u8:#x})", self.bits());
    }
}

/// Complete PLL3 parameter block.
///
/// `vco = hse / m * n`, `out_x = vco / x` for x in {p, q, r}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pll3Config {
    /// Reference clock. Always [`ClockSource::Hse`] for the display.
    pub source: ClockSource,
    /// Reference pre-divider.
    pub m: u8,
    /// VCO multiplier.
    pub n: u16,
    /// P post-divider.
    pub p: u8,
    /// Q post-divider.
    pub q: u8,
    /// R post-divider.
    pub r: u8,
    /// Input range matching `hse / m`.
    pub input_range: PllInputRange,
    /// Outputs switched on after configuration.
    pub outputs: Pll3Outputs,
    /// Fractional-N mode. The display only uses integer mode.
    pub fractional: bool,
}

// ---------------------------------------------------------------------------
// Kernel clock muxes
// ---------------------------------------------------------------------------

/// DSI host kernel clock selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DsiClockSource {
    /// PLL3 P output.
    Pll3,
    /// D-PHY byte clock.
    DsiPhy,
}

/// LTDC kernel clock selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LtdcClockSource {
    /// PLL3 R output.
    Pll3,
}

/// RCC operations used by the display clock-domain controller.
///
/// Implementations are thin register writes; sequencing and waiting belong
/// to the caller.
pub trait ClockControl {
    /// Clear PLL3ON.
    fn pll3_disable(&mut self);

    /// Read the PLL3RDY flag.
    fn pll3_is_ready(&mut self) -> bool;

    /// Program PLL3 dividers, input range, output enables and FRACN mode.
    /// Only valid while PLL3 is off.
    fn pll3_configure(&mut self, config: &Pll3Config);

    /// Set PLL3ON.
    fn pll3_enable(&mut self);

    /// Route the DSI kernel clock.
    fn set_dsi_clock_source(&mut self, source: DsiClockSource);

    /// Route the LTDC kernel clock.
    fn set_ltdc_clock_source(&mut self, source: LtdcClockSource);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

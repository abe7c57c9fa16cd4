//! LTDC (LCD-TFT display controller) abstraction.
//!
//! The timing generator counts in pixel clocks using the "accumulated"
//! register convention: each field holds the running total of the previous
//! regions minus one. See RM0456 LTDC chapter, SSCR / BPCR / AWCR / TWCR.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::HalError;
use crate::dsi::Polarity;

/// Pixel clock polarity (GCR.PCPOL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelClockPolarity {
    /// Input pixel clock.
    Normal,
    /// Inverted input pixel clock.
    Inverted,
}

/// Layer pixel formats (LxPFCR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 32 bpp with alpha.
    Argb8888,
    /// 24 bpp.
    Rgb888,
    /// 16 bpp.
    Rgb565,
    /// 16 bpp, 1-bit alpha.
    Argb1555,
    /// 16 bpp, 4-bit alpha.
    Argb4444,
    /// 8-bit luminance.
    L8,
}

impl PixelFormat {
    /// Bytes per pixel in memory.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Argb8888 => 4,
            Self::Rgb888 => 3,
            Self::Rgb565 | Self::Argb1555 | Self::Argb4444 => 2,
            Self::L8 => 1,
        }
    }
}

/// Layer blending factor (LxBFCR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlendFactor {
    /// Constant alpha.
    ConstantAlpha,
    /// Pixel alpha × constant alpha.
    PixelAlphaTimesConstantAlpha,
}

/// Layer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LtdcLayer {
    /// First layer (bottom).
    Layer1,
    /// Second layer.
    Layer2,
}

bitflags::bitflags! {
    /// LTDC interrupt sources (IER / ISR / ICR bit layout).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LtdcInterrupts: u32 {
        /// Line event.
        const LINE = 1 << 0;
        /// FIFO underrun.
        const FIFO_UNDERRUN = 1 << 1;
        /// AHB transfer error.
        const TRANSFER_ERROR = 1 << 2;
        /// Shadow register reload.
        const REGISTER_RELOAD = 1 << 3;
        /// FIFO underrun warning.
        const FIFO_UNDERRUN_WARNING = 1 << 4;
        /// CRC error.
        const CRC_ERROR = 1 << 5;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LtdcInterrupts {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "LtdcInterrupts({=u32:#x})", self.bits());
    }
}

/// Timing generator and global configuration.
///
/// Horizontal values are pixel clocks, vertical values are lines, all in the
/// accumulated-minus-one register convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LtdcInit {
    /// HSYNC polarity.
    pub hsync_polarity: Polarity,
    /// VSYNC polarity.
    pub vsync_polarity: Polarity,
    /// Data-enable polarity.
    pub data_enable_polarity: Polarity,
    /// Pixel clock polarity.
    pub pixel_clock_polarity: PixelClockPolarity,
    /// HSW - 1.
    pub horizontal_sync: u32,
    /// HSW + HBP - 1.
    pub accumulated_hbp: u32,
    /// HSW + HBP + active width - 1.
    pub accumulated_active_width: u32,
    /// HSW + HBP + active width + HFP - 1.
    pub total_width: u32,
    /// VSH - 1.
    pub vertical_sync: u32,
    /// VSH + VBP - 1.
    pub accumulated_vbp: u32,
    /// VSH + VBP + active height - 1.
    pub accumulated_active_height: u32,
    /// VSH + VBP + active height + VFP - 1.
    pub total_height: u32,
    /// Background colour behind all layers.
    pub background: Rgb888,
}

/// Configuration of one layer.
///
/// Window coordinates follow the vendor HAL: `x1` / `y1` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerConfig {
    /// First visible column.
    pub window_x0: u32,
    /// One past the last visible column.
    pub window_x1: u32,
    /// First visible line.
    pub window_y0: u32,
    /// One past the last visible line.
    pub window_y1: u32,
    /// Pixel format of the frame buffer.
    pub pixel_format: PixelFormat,
    /// Constant alpha.
    pub constant_alpha: u8,
    /// Alpha of the default colour.
    pub default_alpha: u8,
    /// Blending factor 1.
    pub blend_factor1: BlendFactor,
    /// Blending factor 2.
    pub blend_factor2: BlendFactor,
    /// Frame buffer base address.
    pub frame_buffer: u32,
    /// Line pitch in pixels.
    pub image_width: u32,
    /// Lines in the frame buffer.
    pub image_height: u32,
    /// Colour shown outside the layer window.
    pub default_color: Rgb888,
}

impl LayerConfig {
    /// Visible window as a rectangle in panel coordinates.
    #[allow(clippy::cast_possible_wrap)] // panel coordinates are < 2^16
    pub fn window(&self) -> Rectangle {
        Rectangle::with_corners(
            Point::new(self.window_x0 as i32, self.window_y0 as i32),
            Point::new(
                self.window_x1.saturating_sub(1) as i32,
                self.window_y1.saturating_sub(1) as i32,
            ),
        )
    }

    /// Bytes between the starts of two consecutive lines.
    pub const fn line_pitch_bytes(&self) -> u32 {
        self.image_width
            .saturating_mul(self.pixel_format.bytes_per_pixel())
    }
}

/// LTDC register layer.
pub trait Ltdc {
    /// Pulse the RCC reset line of the LTDC.
    fn ltdc_reset(&mut self);

    /// Gate the LTDC bus/kernel clock.
    fn ltdc_set_clock(&mut self, enabled: bool);

    /// Program the timing generator and enable the controller.
    fn ltdc_configure(&mut self, init: &LtdcInit) -> Result<(), HalError>;

    /// Program one layer and reload its shadow registers.
    fn ltdc_configure_layer(&mut self, layer: LtdcLayer, config: &LayerConfig)
        -> Result<(), HalError>;

    /// Raise the line interrupt when the scan reaches `line`.
    fn ltdc_program_line_event(&mut self, line: u32) -> Result<(), HalError>;

    /// Set bits in IER.
    fn ltdc_enable_interrupts(&mut self, interrupts: LtdcInterrupts);

    /// Clear bits in IER.
    fn ltdc_disable_interrupts(&mut self, interrupts: LtdcInterrupts);

    /// CDSR.VSYNCS: the generator is inside the VSYNC pulse.
    fn ltdc_vsync_active(&mut self) -> bool;

    /// GCR.LTDCEN.
    fn ltdc_set_enabled(&mut self, enabled: bool);

    /// Overwrite the total-height half of TWCR.
    fn ltdc_write_total_height(&mut self, total_height: u32);

    /// Run the vendor interrupt service routine against the initialised
    /// handle. Returns the flags that were pending.
    fn ltdc_service_interrupts(&mut self) -> LtdcInterrupts;

    /// Write ICR directly.
    fn ltdc_clear_interrupts(&mut self, interrupts: LtdcInterrupts);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> LayerConfig {
        LayerConfig {
            window_x0: 50,
            window_x1: 430,
            window_y0: 0,
            window_y1: 520,
            pixel_format: PixelFormat::Argb8888,
            constant_alpha: 0xFF,
            default_alpha: 0,
            blend_factor1: BlendFactor::PixelAlphaTimesConstantAlpha,
            blend_factor2: BlendFactor::PixelAlphaTimesConstantAlpha,
            frame_buffer: 0x2000_0000,
            image_width: 768,
            image_height: 520,
            default_color: Rgb888::BLUE,
        }
    }

    #[test]
    fn window_rectangle_uses_exclusive_corners() {
        let w = layer().window();
        assert_eq!(w.top_left, Point::new(50, 0));
        assert_eq!(w.size, Size::new(380, 520));
    }

    #[test]
    fn line_pitch_uses_virtual_stride() {
        assert_eq!(layer().line_pitch_bytes(), 768 * 4);
    }

    #[test]
    fn all_interrupt_flags_match_icr_mask() {
        assert_eq!(LtdcInterrupts::all().bits(), 0x3F);
    }
}

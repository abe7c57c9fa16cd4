//! Frame compositor: LTDC timing generator and the single frame-buffer layer.
//!
//! Vertical timing is not computed here. It is taken from the DSI video-mode
//! configuration so both blocks describe the same frame.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use platform::dsi::{Polarity, VideoModeConfig};
use platform::ltdc::{
    BlendFactor, LayerConfig, Ltdc, LtdcInit, LtdcLayer, PixelClockPolarity, PixelFormat,
};
use platform::HalError;

use super::panel::{
    DISPLAY_RESX, DISPLAY_RESY, FRAME_BUFFER_PIXELS_PER_LINE, HBP, HSYNC, LCD_HEIGHT,
    LCD_X_OFFSET, LCD_Y_OFFSET,
};
use super::profile::TimingProfile;

/// Compositor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompositorState {
    /// Held in reset. Interrupt status must be cleared by hand.
    Reset,
    /// Timing generator and layer programmed.
    Ready,
}

/// DE is inverted between the DSI wrapper and the LTDC; HSYNC and VSYNC
/// pass through.
const fn inverted(p: Polarity) -> Polarity {
    match p {
        Polarity::ActiveHigh => Polarity::ActiveLow,
        Polarity::ActiveLow => Polarity::ActiveHigh,
    }
}

/// Timing generator setup for `profile`, with the vertical half and the
/// polarities derived from `video`.
pub fn ltdc_init(profile: &TimingProfile, video: &VideoModeConfig) -> LtdcInit {
    let h = &profile.horizontal;
    let vsa = video.vertical_sync_active;
    let vbp = vsa.saturating_add(video.vertical_back_porch);
    let vact = vbp.saturating_add(video.vertical_active);
    let total = vact.saturating_add(video.vertical_front_porch);

    LtdcInit {
        hsync_polarity: video.hsync_polarity,
        vsync_polarity: video.vsync_polarity,
        data_enable_polarity: inverted(video.data_enable_polarity),
        pixel_clock_polarity: PixelClockPolarity::Normal,
        horizontal_sync: HSYNC.saturating_sub(1),
        accumulated_hbp: HSYNC.saturating_add(HBP).saturating_sub(1),
        accumulated_active_width: h
            .hact
            .saturating_add(HBP)
            .saturating_add(HSYNC)
            .saturating_sub(1),
        total_width: h
            .hact
            .saturating_add(HBP)
            .saturating_add(HSYNC)
            .saturating_add(h.hfp)
            .saturating_sub(1),
        vertical_sync: vsa.saturating_sub(1),
        accumulated_vbp: vbp.saturating_sub(1),
        accumulated_active_height: vact.saturating_sub(1),
        total_height: total.saturating_sub(1),
        background: Rgb888::RED,
    }
}

/// Layer 1 showing the visible window of the frame buffer at `frame_buffer`.
pub fn layer_config(frame_buffer: u32) -> LayerConfig {
    LayerConfig {
        window_x0: LCD_X_OFFSET,
        window_x1: LCD_X_OFFSET.saturating_add(DISPLAY_RESX),
        window_y0: LCD_Y_OFFSET,
        window_y1: LCD_Y_OFFSET.saturating_add(DISPLAY_RESY),
        pixel_format: PixelFormat::Argb8888,
        constant_alpha: 0xFF,
        default_alpha: 0,
        blend_factor1: BlendFactor::PixelAlphaTimesConstantAlpha,
        blend_factor2: BlendFactor::PixelAlphaTimesConstantAlpha,
        frame_buffer,
        image_width: FRAME_BUFFER_PIXELS_PER_LINE,
        image_height: LCD_HEIGHT,
        default_color: Rgb888::BLUE,
    }
}

/// LTDC owner.
#[derive(Debug)]
pub struct FrameCompositor {
    state: CompositorState,
    init: Option<LtdcInit>,
    layer: Option<LayerConfig>,
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCompositor {
    /// Compositor in reset.
    pub const fn new() -> Self {
        Self {
            state: CompositorState::Reset,
            init: None,
            layer: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> CompositorState {
        self.state
    }

    /// `true` once the timing generator and layer are programmed.
    pub fn is_ready(&self) -> bool {
        self.state == CompositorState::Ready
    }

    /// Timing generator setup, as last written.
    pub fn timing(&self) -> Option<&LtdcInit> {
        self.init.as_ref()
    }

    /// Layer 1 setup, as last written.
    pub fn layer(&self) -> Option<&LayerConfig> {
        self.layer.as_ref()
    }

    /// Accumulated active height, the base of the total-height register.
    pub fn accumulated_active_height(&self) -> Option<u32> {
        self.init.map(|i| i.accumulated_active_height)
    }

    /// Record a new total height. The register write is the caller's.
    pub(crate) fn set_total_height(&mut self, total_height: u32) {
        if let Some(init) = self.init.as_mut() {
            init.total_height = total_height;
        }
    }

    /// Program the timing generator and layer 1.
    ///
    /// On failure the LTDC is put back in reset before returning.
    pub fn init<H: Ltdc + ?Sized>(
        &mut self,
        hal: &mut H,
        profile: &TimingProfile,
        video: &VideoModeConfig,
        frame_buffer: u32,
    ) -> Result<(), HalError> {
        hal.ltdc_reset();
        hal.ltdc_set_clock(true);

        let init = ltdc_init(profile, video);
        let layer = layer_config(frame_buffer);
        let result = hal
            .ltdc_configure(&init)
            .and_then(|()| hal.ltdc_configure_layer(LtdcLayer::Layer1, &layer));

        if let Err(e) = result {
            warn!("LTDC bring-up failed");
            self.deinit(hal);
            return Err(e);
        }

        debug!(
            "LTDC: total {}x{}",
            init.total_width,
            init.total_height
        );
        self.init = Some(init);
        self.layer = Some(layer);
        self.state = CompositorState::Ready;
        Ok(())
    }

    /// Point layer 1 at `frame_buffer`. Timing is left alone.
    pub fn set_frame_buffer<H: Ltdc + ?Sized>(
        &mut self,
        hal: &mut H,
        frame_buffer: u32,
    ) -> Result<(), HalError> {
        let layer = LayerConfig {
            frame_buffer,
            ..self.layer.unwrap_or_else(|| layer_config(frame_buffer))
        };
        hal.ltdc_configure_layer(LtdcLayer::Layer1, &layer)?;
        self.layer = Some(layer);
        Ok(())
    }

    /// Gate the clock and reset. Safe in any state.
    pub fn deinit<H: Ltdc + ?Sized>(&mut self, hal: &mut H) {
        hal.ltdc_set_clock(false);
        hal.ltdc_reset();
        self.state = CompositorState::Reset;
        self.init = None;
        self.layer = None;
    }
}

//! LX250A2401A panel geometry.
//!
//! The glass is 520 lines tall. The visible area is a 380 px wide window
//! starting 50 px into the scanned line.

/// VSYNC pulse width, lines.
pub const VSYNC: u32 = 2;
/// Vertical back porch, lines.
pub const VBP: u32 = 26;
/// Active lines.
pub const VACT: u32 = 520;
/// HSYNC pulse width, pixel clocks.
pub const HSYNC: u32 = 6;
/// Horizontal back porch, pixel clocks.
pub const HBP: u32 = 2;
/// Scanned lines. Also the line the end-of-frame interrupt fires on.
pub const LCD_HEIGHT: u32 = 520;

/// First visible column of the scanned line.
pub const LCD_X_OFFSET: u32 = 50;
/// First visible line.
pub const LCD_Y_OFFSET: u32 = 0;

/// Visible width in pixels.
pub const DISPLAY_RESX: u32 = 380;
/// Visible height in pixels.
pub const DISPLAY_RESY: u32 = 520;

/// Pitch of the virtual frame buffer, pixels. Wider than any active line so
/// the GFXMMU can pack lines into physical memory.
pub const FRAME_BUFFER_PIXELS_PER_LINE: u32 = 768;

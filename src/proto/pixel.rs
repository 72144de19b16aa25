//! RGB888 to RGB565 packing.
//!
//! The panel takes 16-bit pixels: 5 bits red, 6 bits green, 5 bits blue,
//! little-endian on the wire. Conversion truncates; no rounding or
//! dithering. The mapping is lossy and not invertible.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;

/// Pack an 8-bit-per-channel color into the panel's native 16-bit format.
pub fn pack(color: Rgb888) -> u16 {
    let r5 = u16::from(color.r() >> 3);
    let g6 = u16::from(color.g() >> 2);
    let b5 = u16::from(color.b() >> 3);
    (r5 << 11) | (g6 << 5) | b5
}

/// Append a packed pixel to a wire buffer, low byte first.
pub fn push_le(buf: &mut Vec<u8>, color: Rgb888) {
    let packed = pack(color);
    buf.push((packed & 0xFF) as u8);
    buf.push((packed >> 8) as u8);
}

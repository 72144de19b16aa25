//! Wire protocol for the Turing Smart Screen (revision A).
//!
//! Every exchange is fire-and-forget: a fixed 6-byte frame, optionally
//! followed by an RGB565 pixel payload for `DisplayBitmap`. There is no
//! acknowledgement, checksum, or sequencing on the wire.

pub mod pixel;

use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Command frames are always 6 bytes: 5 data bytes plus the opcode.
pub const FRAME_LEN: usize = 6;

/// Device opcodes, carried in the last byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Reset = 101,
    Clear = 102,
    ScreenOff = 108,
    ScreenOn = 109,
    SetBrightness = 110,
    DisplayBitmap = 197,
}

/// Build a simple command frame: zero-filled data bytes, opcode last.
pub fn command_frame(opcode: Opcode) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[5] = opcode as u8;
    frame
}

/// Build a SET_BRIGHTNESS frame. Levels above 100 are clamped.
pub fn brightness_frame(level: u8) -> [u8; FRAME_LEN] {
    let mut frame = command_frame(Opcode::SetBrightness);
    frame[0] = level.min(100);
    frame
}

/// Build the bitmap-blit header for the region from `(x, y)` to the
/// inclusive bottom-right corner `(ex, ey)`.
///
/// Packs the four 9-bit coordinates into 5 bytes; this layout is the wire
/// geometry contract and must stay bit-exact.
///
/// Panics if the region is outside the display; callers validate bounds
/// before reaching the encoder, so a violation here is a programming error.
pub fn bitmap_header(x: u16, y: u16, ex: u16, ey: u16) -> [u8; FRAME_LEN] {
    assert!(x <= ex && y <= ey, "inverted region ({x},{y})-({ex},{ey})");
    assert!(
        ex < DISPLAY_WIDTH && ey < DISPLAY_HEIGHT,
        "region ({x},{y})-({ex},{ey}) exceeds {DISPLAY_WIDTH}x{DISPLAY_HEIGHT}"
    );

    [
        (x >> 2) as u8,
        (((x & 0b11) << 6) | (y >> 4)) as u8,
        (((y & 0b1111) << 4) | (ex >> 6)) as u8,
        (((ex & 0b11_1111) << 2) | (ey >> 8)) as u8,
        (ey & 0xFF) as u8,
        Opcode::DisplayBitmap as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bitmap_header(h: &[u8; FRAME_LEN]) -> (u16, u16, u16, u16) {
        let h = h.map(u16::from);
        let x = (h[0] << 2) | (h[1] >> 6);
        let y = ((h[1] & 0b11_1111) << 4) | (h[2] >> 4);
        let ex = ((h[2] & 0b1111) << 6) | (h[3] >> 2);
        let ey = ((h[3] & 0b11) << 8) | h[4];
        (x, y, ex, ey)
    }

    #[test]
    fn simple_frames_are_zero_filled() {
        assert_eq!(command_frame(Opcode::Reset), [0, 0, 0, 0, 0, 101]);
        assert_eq!(command_frame(Opcode::Clear), [0, 0, 0, 0, 0, 102]);
        assert_eq!(command_frame(Opcode::ScreenOff), [0, 0, 0, 0, 0, 108]);
        assert_eq!(command_frame(Opcode::ScreenOn), [0, 0, 0, 0, 0, 109]);
    }

    #[test]
    fn brightness_frame_carries_clamped_level() {
        assert_eq!(brightness_frame(50), [50, 0, 0, 0, 0, 110]);
        assert_eq!(brightness_frame(100), [100, 0, 0, 0, 0, 110]);
        assert_eq!(brightness_frame(255), [100, 0, 0, 0, 0, 110]);
    }

    #[test]
    fn golden_bitmap_header() {
        // x=10, y=100, 300x30 region => ex=309, ey=129.
        let header = bitmap_header(10, 100, 309, 129);
        assert_eq!(header, [2, 134, 68, 212, 129, 197]);
    }

    #[test]
    fn full_frame_header() {
        let header = bitmap_header(0, 0, DISPLAY_WIDTH - 1, DISPLAY_HEIGHT - 1);
        assert_eq!(header[5], 197);
        assert_eq!(
            decode_bitmap_header(&header),
            (0, 0, DISPLAY_WIDTH - 1, DISPLAY_HEIGHT - 1)
        );
    }

    #[test]
    fn header_round_trips_across_bounds() {
        for &(x, y, ex, ey) in &[
            (0u16, 0u16, 0u16, 0u16),
            (0, 0, 319, 479),
            (10, 100, 309, 129),
            (1, 1, 2, 2),
            (63, 15, 64, 16),
            (255, 255, 256, 256),
            (319, 479, 319, 479),
            (100, 400, 319, 479),
        ] {
            let header = bitmap_header(x, y, ex, ey);
            assert_eq!(decode_bitmap_header(&header), (x, y, ex, ey));
        }
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_region_panics() {
        bitmap_header(0, 0, DISPLAY_WIDTH, 10);
    }
}

//! Drawing commands and their byte encoding
//!
//! Every command encodes to an opcode, a short fixed-layout header and a
//! (possibly empty) payload. All multi-byte fields are little-endian.
//!
//! | Command | Opcode | Header                                             | Payload          |
//! |---------|--------|----------------------------------------------------|------------------|
//! | Fill    | 1      | -                                                  | color (2B)       |
//! | Image   | 2      | x, y, width, height (u16 each), blend op (1B)      | 2B per pixel     |
//! | Rect    | 3      | left, top, right, bottom (u16 each), color, op     | -                |

use alloc::vec;
use alloc::vec::Vec;
use core::str::FromStr;

use heapless::Vec as HVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorMode};

/// Largest header any command produces (Rect: 8 + 2 + 1)
pub const MAX_HEADER_SIZE: usize = 11;

// Opcode wire values
const OPCODE_FILL: u8 = 1;
const OPCODE_IMAGE: u8 = 2;
const OPCODE_RECT: u8 = 3;
// 4 is the device's screen-to-screen copy; the host never emits it

/// Command opcode, the low six bits of every control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Fill the whole screen with one color
    Fill,
    /// Blit a block of pixels
    Image,
    /// Fill a rectangle
    Rect,
}

impl Opcode {
    /// Parse an opcode from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OPCODE_FILL => Some(Opcode::Fill),
            OPCODE_IMAGE => Some(Opcode::Image),
            OPCODE_RECT => Some(Opcode::Rect),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Fill => OPCODE_FILL,
            Opcode::Image => OPCODE_IMAGE,
            Opcode::Rect => OPCODE_RECT,
        }
    }
}

/// Compositing rule applied against pixels already on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BlendOp {
    /// Replace
    #[default]
    Copy,
    Xor,
    Or,
    And,
}

impl BlendOp {
    /// Parse a blend op from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(BlendOp::Copy),
            1 => Some(BlendOp::Xor),
            2 => Some(BlendOp::Or),
            3 => Some(BlendOp::And),
            _ => None,
        }
    }

    /// Lowercase name, as accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            BlendOp::Copy => "copy",
            BlendOp::Xor => "xor",
            BlendOp::Or => "or",
            BlendOp::And => "and",
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            BlendOp::Copy => 0,
            BlendOp::Xor => 1,
            BlendOp::Or => 2,
            BlendOp::And => 3,
        }
    }
}

/// Error returned when parsing a [`BlendOp`] name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownBlendOp;

impl core::fmt::Display for UnknownBlendOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("expected one of copy, xor, or, and")
    }
}

impl FromStr for BlendOp {
    type Err = UnknownBlendOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [BlendOp::Copy, BlendOp::Xor, BlendOp::Or, BlendOp::And]
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownBlendOp)
    }
}

/// Filled rectangle
///
/// Geometry is sent half-open: `right = left + width`, `bottom = top + height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub color: Color,
    pub op: BlendOp,
}

impl Rect {
    /// Exclusive right edge, saturating at the coordinate limit
    pub fn right(&self) -> u16 {
        self.left.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at the coordinate limit
    pub fn bottom(&self) -> u16 {
        self.top.saturating_add(self.height)
    }
}

/// Pixel block placed at (x, y)
///
/// `pixels` is row-major and is expected to hold `width * height` entries.
/// A mismatched length is forwarded untouched; use [`ImageBuffer`] to get
/// a correctly sized buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub op: BlendOp,
    pub pixels: Vec<Color>,
}

/// A drawing command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fill the whole screen
    Fill(Color),
    /// Fill a rectangle
    Rect(Rect),
    /// Blit a pixel block
    Image(Image),
}

/// A command split into the parts the framer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub opcode: Opcode,
    pub header: HVec<u8, MAX_HEADER_SIZE>,
    pub payload: Vec<u8>,
}

impl EncodedCommand {
    /// Header followed by payload, as the device sees it after reassembly
    pub fn body(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.header.len() + self.payload.len());
        body.extend_from_slice(&self.header);
        body.extend_from_slice(&self.payload);
        body
    }
}

impl Command {
    /// Opcode for this command kind
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Fill(_) => Opcode::Fill,
            Command::Rect(_) => Opcode::Rect,
            Command::Image(_) => Opcode::Image,
        }
    }

    /// Encode this command
    ///
    /// Never fails: geometry and pixel counts are passed through as given.
    pub fn encode(&self) -> EncodedCommand {
        let mut header = HVec::new();
        let payload = match self {
            Command::Fill(color) => color.to_le_bytes().to_vec(),
            Command::Rect(rect) => {
                // Everything fits in the header; the payload stays empty
                put_u16s(
                    &mut header,
                    &[rect.left, rect.top, rect.right(), rect.bottom()],
                );
                put(&mut header, &rect.color.to_le_bytes());
                put(&mut header, &[rect.op.to_byte()]);
                Vec::new()
            }
            Command::Image(image) => {
                put_u16s(&mut header, &[image.x, image.y, image.width, image.height]);
                put(&mut header, &[image.op.to_byte()]);

                let mut payload = Vec::with_capacity(image.pixels.len() * 2);
                for pixel in &image.pixels {
                    payload.extend_from_slice(&pixel.to_le_bytes());
                }
                payload
            }
        };

        EncodedCommand {
            opcode: self.opcode(),
            header,
            payload,
        }
    }
}

fn put(header: &mut HVec<u8, MAX_HEADER_SIZE>, bytes: &[u8]) {
    // Layouts above are fixed and never exceed MAX_HEADER_SIZE
    let _ = header.extend_from_slice(bytes);
}

fn put_u16s(header: &mut HVec<u8, MAX_HEADER_SIZE>, values: &[u16]) {
    for value in values {
        put(header, &value.to_le_bytes());
    }
}

/// Owned, pre-sized pixel buffer
///
/// Starts black and is consumed by [`ImageBuffer::into_command`], so no
/// pixel state is shared between commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u16,
    height: u16,
    pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a black buffer
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; usize::from(width) * usize::from(height)],
        }
    }

    /// Build a buffer from packed RGB triples (3 bytes per pixel, row-major)
    ///
    /// Channel values are quantized with `mode`. Missing trailing pixels stay
    /// black and surplus bytes are ignored.
    pub fn from_rgb(width: u16, height: u16, rgb: &[u8], mode: ColorMode) -> Self {
        let mut buffer = Self::new(width, height);
        for (pixel, chunk) in buffer.pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *pixel = mode.pack(
                u32::from(chunk[0]),
                u32::from(chunk[1]),
                u32::from(chunk[2]),
            );
        }
        buffer
    }

    /// Build a buffer from full-range 8-bit RGB triples
    pub fn from_rgb888(width: u16, height: u16, rgb: &[u8]) -> Self {
        let mut buffer = Self::new(width, height);
        for (pixel, chunk) in buffer.pixels.iter_mut().zip(rgb.chunks_exact(3)) {
            *pixel = Color::from_rgb888(chunk[0], chunk[1], chunk[2]);
        }
        buffer
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Set a pixel by row-major index
    ///
    /// Returns false if the index is outside the buffer.
    pub fn set(&mut self, index: usize, color: Color) -> bool {
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => false,
        }
    }

    /// Set a pixel by coordinates
    ///
    /// Returns false if (x, y) is outside the buffer.
    pub fn set_xy(&mut self, x: u16, y: u16, color: Color) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.set(usize::from(y) * usize::from(self.width) + usize::from(x), color)
    }

    /// Get a pixel by coordinates
    pub fn get_xy(&self, x: u16, y: u16) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    /// Fill every pixel with one color
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Turn this buffer into an image command placed at (x, y)
    pub fn into_command(self, x: u16, y: u16, op: BlendOp) -> Command {
        Command::Image(Image {
            x,
            y,
            width: self.width,
            height: self.height,
            op,
            pixels: self.pixels,
        })
    }
}

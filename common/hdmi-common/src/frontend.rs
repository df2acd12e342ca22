use bincode::{Decode, Encode};
use std::convert::Infallible;
use thiserror::Error;

#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable, Encode, Decode,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[must_use]
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Bytes in TMDS channel order: channel 0 carries blue, 1 green, 2 red.
    #[must_use]
    #[inline]
    pub const fn to_channel_bytes(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

impl From<u32> for Color {
    /// Convert from `0xRRGGBB`; the top byte is ignored.
    #[inline]
    fn from(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[must_use]
    pub const fn len(self) -> usize {
        self.width as usize * self.height as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Supplies the RGB value for each visible pixel.
pub trait PixelSource {
    type Err;

    /// Return the color of the pixel at (x, y), relative to the top-left corner of the visible
    /// screen area.
    ///
    /// # Errors
    ///
    /// This method will return an error if the source cannot produce the pixel, e.g. because a
    /// capture device disconnected.
    fn pixel(&mut self, x: u16, y: u16) -> Result<Color, Self::Err>;
}

impl<F> PixelSource for F
where
    F: FnMut(u16, u16) -> Color,
{
    type Err = Infallible;

    #[inline]
    fn pixel(&mut self, x: u16, y: u16) -> Result<Color, Self::Err> {
        Ok(self(x, y))
    }
}

#[derive(Debug, Error)]
pub enum FrameBufferError {
    #[error("frame buffer holds {actual} pixels, {width}x{height} needs at least {expected}")]
    TooSmall { expected: usize, actual: usize, width: u32, height: u32 },
    #[error("raw RGB buffer length {0} is not a multiple of 3")]
    RawLength(usize),
}

/// A borrowed, row-major frame buffer used as a [`PixelSource`].
///
/// Pixels outside of the buffer's frame size read as black.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuffer<'a> {
    pixels: &'a [Color],
    size: FrameSize,
}

impl<'a> FrameBuffer<'a> {
    /// # Errors
    ///
    /// Returns an error if `pixels` is shorter than `size.width * size.height`.
    pub fn new(pixels: &'a [Color], size: FrameSize) -> Result<Self, FrameBufferError> {
        if pixels.len() < size.len() {
            return Err(FrameBufferError::TooSmall {
                expected: size.len(),
                actual: pixels.len(),
                width: size.width,
                height: size.height,
            });
        }

        Ok(Self { pixels, size })
    }

    /// View a packed `RGBRGB...` byte buffer as a frame buffer without copying.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte length is not a multiple of 3 or the buffer is too small.
    pub fn from_rgb_bytes(bytes: &'a [u8], size: FrameSize) -> Result<Self, FrameBufferError> {
        let pixels: &[Color] = bytemuck::try_cast_slice(bytes)
            .map_err(|_| FrameBufferError::RawLength(bytes.len()))?;
        Self::new(pixels, size)
    }

    #[must_use]
    pub fn size(&self) -> FrameSize {
        self.size
    }
}

impl PixelSource for FrameBuffer<'_> {
    type Err = Infallible;

    #[inline]
    fn pixel(&mut self, x: u16, y: u16) -> Result<Color, Self::Err> {
        let (x, y) = (u32::from(x), u32::from(y));
        if x >= self.size.width || y >= self.size.height {
            return Ok(Color::BLACK);
        }

        Ok(self.pixels[(y * self.size.width + x) as usize])
    }
}

/// Bits driven onto the four differential pairs during one serial clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct SerialBits {
    pub data: [bool; 3],
    pub clock: bool,
}

/// Consumer of the serialized bit stream, typically a platform-specific differential output
/// driver.
pub trait SerialSink {
    type Err;

    /// Push the bits for a single serial clock tick.
    ///
    /// # Errors
    ///
    /// This method will return an error if the output device rejects the bits.
    fn push_bits(&mut self, bits: SerialBits) -> Result<(), Self::Err>;
}

impl SerialSink for Vec<SerialBits> {
    type Err = Infallible;

    #[inline]
    fn push_bits(&mut self, bits: SerialBits) -> Result<(), Self::Err> {
        self.push(bits);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    None,
    FrameComplete,
}

pub type TickResult<Err> = Result<TickEffect, Err>;

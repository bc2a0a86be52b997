//! Borrowed CPU image views and the pixel layouts the filter understands.
//!
//! All buffers are tightly packed, row-major, 8-bit per channel (RGB565 is one native-endian u16
//! per pixel). Row 0 is the first row in memory.

use std::fmt;
use std::str::FromStr;

use crate::FilterError;

/// Destination pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelKind {
    /// Packed 5-6-5 RGB, 2 bytes per pixel. Suitable for direct display/USB transport.
    Rgb565,
    /// 4 × 8-bit RGBA, 4 bytes per pixel.
    Rgba8,
}

impl PixelKind {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelKind::Rgb565 => 2,
            PixelKind::Rgba8 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelKind::Rgb565 => "rgb565",
            PixelKind::Rgba8 => "rgba8",
        }
    }

    /// Maps a V4L2-style fourcc of a host image to a destination kind.
    pub fn from_fourcc(code: &[u8; 4]) -> Result<Self, FilterError> {
        match code {
            b"RGBP" => Ok(PixelKind::Rgb565),
            b"AB24" | b"RGBA" => Ok(PixelKind::Rgba8),
            other => Err(FilterError::UnsupportedPixelKind(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

impl fmt::Display for PixelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb565" => Ok(PixelKind::Rgb565),
            "rgba8" | "rgba" => Ok(PixelKind::Rgba8),
            _ => Err(FilterError::UnsupportedPixelKind(s.to_string())),
        }
    }
}

/// Shape of an uploaded source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceFormat {
    pub width: u32,
    pub height: u32,
    /// 1 = luminance, 4 = RGBA.
    pub channels: u8,
}

impl SourceFormat {
    pub fn is_luminance(&self) -> bool {
        self.channels == 1
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Reciprocal width/height, bound to the `texelsize` uniform.
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width.max(1) as f32, 1.0 / self.height.max(1) as f32]
    }
}

/// Off-screen render target shape. Changing any field reallocates the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetDesc {
    pub width: u32,
    pub height: u32,
    pub kind: PixelKind,
}

impl RenderTargetDesc {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.kind.bytes_per_pixel()
    }
}

/// Read-only view of an input frame.
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    format: SourceFormat,
    data: &'a [u8],
}

impl<'a> SourceImage<'a> {
    pub fn new(width: u32, height: u32, channels: u8, data: &'a [u8]) -> Result<Self, FilterError> {
        let img = Self {
            format: SourceFormat {
                width,
                height,
                channels,
            },
            data,
        };
        img.validate()?;
        Ok(img)
    }

    /// Single-channel luminance image.
    pub fn luminance(width: u32, height: u32, data: &'a [u8]) -> Result<Self, FilterError> {
        Self::new(width, height, 1, data)
    }

    pub fn rgba(width: u32, height: u32, data: &'a [u8]) -> Result<Self, FilterError> {
        Self::new(width, height, 4, data)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if !matches!(self.format.channels, 1 | 4) {
            return Err(FilterError::UnsupportedChannels(self.format.channels));
        }
        let expected = self.format.byte_len();
        if expected == 0 || self.data.len() != expected {
            return Err(FilterError::BufferSize {
                what: "source",
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn channels(&self) -> u8 {
        self.format.channels
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Mutable view of caller-owned destination memory.
///
/// The filter writes exactly `width * height * bytes_per_pixel` bytes and never resizes the
/// buffer, so it may be a transport-owned buffer handed straight to the output.
#[derive(Debug)]
pub struct DestImage<'a> {
    desc: RenderTargetDesc,
    data: &'a mut [u8],
}

impl<'a> DestImage<'a> {
    pub fn new(
        width: u32,
        height: u32,
        kind: PixelKind,
        data: &'a mut [u8],
    ) -> Result<Self, FilterError> {
        let img = Self {
            desc: RenderTargetDesc {
                width,
                height,
                kind,
            },
            data,
        };
        img.validate()?;
        Ok(img)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        let expected = self.desc.byte_len();
        if expected == 0 || self.data.len() != expected {
            return Err(FilterError::BufferSize {
                what: "destination",
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn desc(&self) -> RenderTargetDesc {
        self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn kind(&self) -> PixelKind {
        self.desc.kind
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data
    }
}

/// Packs 8-bit RGB into a 5-6-5 pixel.
#[inline]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expands a 5-6-5 pixel to 8-bit RGB (bit replication).
#[inline]
pub fn unpack_rgb565(px: u16) -> [u8; 3] {
    let r = ((px >> 11) & 0x1f) as u8;
    let g = ((px >> 5) & 0x3f) as u8;
    let b = (px & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

use crate::Error;

/// Passing this as the row stride means "rows are tightly packed".
pub const DEFAULT_ROW_STRIDE: usize = 0;

/// Channel layout of a pixel. The order and values are stable and index [`COLOR_NAMES`].
///
/// Apart from `PALETTE`, the discriminant is also the number of channels.
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ColorType {
    /// palette indices: 1, 2, 4, 8 bit. Only ever a source format.
    PALETTE = 0,
    /// greyscale: 1, 2, 4, 8, 16 bit
    GREY = 1,
    /// greyscale with alpha: 8, 16 bit
    GREY_ALPHA = 2,
    /// RGB: 8, 16 bit
    RGB = 3,
    /// RGB with alpha: 8, 16 bit
    RGBA = 4,
}

// NUL-terminated for the C API
static NAMES: [&str; ColorType::COUNT] = ["Palette\0", "G\0", "GA\0", "RGB\0", "RGBA\0"];

/// Short names of the color types, indexable by `ColorType as usize`
pub static COLOR_NAMES: [&str; ColorType::COUNT] = ["Palette", "G", "GA", "RGB", "RGBA"];

impl ColorType {
    pub const COUNT: usize = 5;

    /// Inverse of `as usize`
    pub fn from_index(index: usize) -> Option<Self> {
        Some(match index {
            0 => ColorType::PALETTE,
            1 => ColorType::GREY,
            2 => ColorType::GREY_ALPHA,
            3 => ColorType::RGB,
            4 => ColorType::RGBA,
            _ => return None,
        })
    }

    /// Color type code used in the PNG `IHDR` chunk
    pub fn png_code(self) -> u8 {
        match self {
            ColorType::GREY => 0,
            ColorType::RGB => 2,
            ColorType::PALETTE => 3,
            ColorType::GREY_ALPHA => 4,
            ColorType::RGBA => 6,
        }
    }

    /// `None` for codes PNG doesn't define
    pub fn from_png_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => ColorType::GREY,
            2 => ColorType::RGB,
            3 => ColorType::PALETTE,
            4 => ColorType::GREY_ALPHA,
            6 => ColorType::RGBA,
            _ => return None,
        })
    }

    /// Samples per pixel. A palette index is one sample.
    #[inline]
    pub fn channels(self) -> u8 {
        match self {
            ColorType::PALETTE | ColorType::GREY => 1,
            ColorType::GREY_ALPHA => 2,
            ColorType::RGB => 3,
            ColorType::RGBA => 4,
        }
    }

    #[inline]
    pub fn is_alpha_type(self) -> bool {
        matches!(self, ColorType::GREY_ALPHA | ColorType::RGBA)
    }

    #[inline]
    pub fn is_greyscale_type(self) -> bool {
        matches!(self, ColorType::GREY | ColorType::GREY_ALPHA)
    }

    #[inline]
    pub fn is_palette_type(self) -> bool {
        self == ColorType::PALETTE
    }

    /// RGB or RGBA
    #[inline]
    pub fn is_color_type(self) -> bool {
        matches!(self, ColorType::RGB | ColorType::RGBA)
    }

    pub(crate) fn with_alpha(self) -> Self {
        match self {
            ColorType::GREY => ColorType::GREY_ALPHA,
            ColorType::RGB => ColorType::RGBA,
            other => other,
        }
    }

    pub(crate) fn without_alpha(self) -> Self {
        match self {
            ColorType::GREY_ALPHA => ColorType::GREY,
            ColorType::RGBA => ColorType::RGB,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        COLOR_NAMES[self as usize]
    }

    #[cfg_attr(not(feature = "c_ffi"), allow(dead_code))]
    pub(crate) fn c_name(self) -> &'static [u8] {
        NAMES[self as usize].as_bytes()
    }
}

/// Color type and bit depth of either a PNG file or of a pixel buffer
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PixelFormat {
    pub colortype: ColorType,
    /// bits per sample: 1, 2, 4, 8 or 16
    pub bitdepth: u32,
}

impl PixelFormat {
    #[inline]
    pub fn new(colortype: ColorType, bitdepth: u32) -> Self {
        Self { colortype, bitdepth }
    }

    /// Checks that this can describe an in-memory buffer:
    /// not a palette, and 8 or 16 bits per sample.
    pub fn check_buffer_format(&self) -> Result<(), Error> {
        if self.colortype.is_palette_type() {
            return Err(Error::InvalidColor);
        }
        if self.bitdepth != 8 && self.bitdepth != 16 {
            return Err(Error::InvalidDepth);
        }
        Ok(())
    }

    /// Only meaningful for buffer formats (depth 8 or 16)
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.colortype.channels() as usize * (self.bitdepth as usize / 8)
    }

    /// Bytes taken by one packed row, rounding partial bytes of low bit depths up
    pub fn row_bytes(&self, width: usize) -> Option<usize> {
        let bits = width.checked_mul(self.colortype.channels() as usize)?.checked_mul(self.bitdepth as usize)?;
        Some((bits + 7) / 8)
    }
}

/// What's known about a PNG file without decoding its pixels
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ImageDescriptor {
    pub width: usize,
    pub height: usize,
    /// native format of the file, palette included
    pub format: PixelFormat,
    /// the file has a `tRNS` chunk (color key or palette alpha)
    pub transparency: bool,
    pub interlaced: bool,
}

impl ImageDescriptor {
    /// Fails with `InvalidDimensions` if either dimension is zero
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions);
        }
        Ok(Self {
            width,
            height,
            format,
            transparency: false,
            interlaced: false,
        })
    }

    #[inline]
    pub fn colortype(&self) -> ColorType {
        self.format.colortype
    }

    #[inline]
    pub fn bitdepth(&self) -> u32 {
        self.format.bitdepth
    }
}

/// Size in bytes of a tightly packed buffer. Depth must be 8 or 16 and the color type can't be a palette.
pub fn compute_buffer_size(width: usize, height: usize, bitdepth: u32, colortype: ColorType) -> Result<usize, Error> {
    let format = PixelFormat::new(colortype, bitdepth);
    format.check_buffer_format()?;
    check_dimensions(width, height)?;
    width.checked_mul(height)
        .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
        .ok_or(Error::InvalidDimensions)
}

/// Byte distance between rows. `DEFAULT_ROW_STRIDE` picks the packed row size, anything else is returned as-is.
pub fn row_stride(width: usize, colortype: ColorType, bitdepth: u32, stride: usize) -> Result<usize, Error> {
    if stride != DEFAULT_ROW_STRIDE {
        return Ok(stride);
    }
    width.checked_mul(colortype.channels() as usize)
        .and_then(|n| n.checked_mul(bitdepth as usize / 8))
        .ok_or(Error::InvalidDimensions)
}

#[inline]
pub(crate) fn check_dimensions(width: usize, height: usize) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions);
    }
    Ok(())
}

/// Validated geometry of a caller's buffer
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct BufferLayout {
    pub stride: usize,
    pub row_bytes: usize,
    pub height: usize,
    /// minimum length of the buffer
    pub len: usize,
}

impl BufferLayout {
    /// The last row doesn't need to be followed by stride padding
    pub fn new(width: usize, height: usize, format: &PixelFormat, stride: usize) -> Result<Self, Error> {
        format.check_buffer_format()?;
        check_dimensions(width, height)?;
        let row_bytes = row_stride(width, format.colortype, format.bitdepth, DEFAULT_ROW_STRIDE)?;
        let stride = row_stride(width, format.colortype, format.bitdepth, stride)?;
        if stride < row_bytes {
            return Err(Error::InvalidDimensions);
        }
        let len = (height - 1).checked_mul(stride)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or(Error::InvalidDimensions)?;
        Ok(Self { stride, row_bytes, height, len })
    }

    pub fn check_len(&self, len: usize) -> Result<(), Error> {
        if len < self.len {
            return Err(Error::InvalidDimensions);
        }
        Ok(())
    }
}

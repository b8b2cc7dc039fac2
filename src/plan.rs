//! Decides which conversions turn a file's native format into the format of the caller's buffer.
//!
//! Planning looks only at the formats, never at pixel values, so a plan is complete
//! before the first row is decoded.
use crate::format::{check_dimensions, ColorType, ImageDescriptor, PixelFormat};
use crate::Error;
use std::fmt;
use std::slice;

/// Value of the alpha channel added by [`ConversionStep::AddOpaqueAlpha`]. 8-bit output keeps the low byte.
pub const OPAQUE_FILLER: u16 = 0xFFFF;

/// One elementary pixel format change
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConversionStep {
    /// drop the alpha channel
    StripAlpha,
    /// append a fully opaque alpha channel to pixels that have none
    AddOpaqueAlpha,
    /// one sample per byte for 1, 2 and 4-bit images
    Unpack1248To8,
    /// linear rescale of 16-bit samples to 8 bits
    Scale16To8,
    /// widen anything below 16 bits to 16 bits
    Expand8To16,
    /// rescale 1, 2 and 4-bit grey to the full 8-bit range
    ExpandGray124To8,
    /// look palette indices up as RGB colors
    PaletteToRGB,
    /// turn a `tRNS` color key or palette alpha into an alpha channel
    TransparencyToAlpha,
    /// weighted sum of R, G and B, see [`gray_from_rgb8`](crate::gray_from_rgb8)
    RGBToGray,
    /// copy grey into R, G and B
    GrayToRGB,
}

impl ConversionStep {
    pub(crate) const ALL: [ConversionStep; 10] = [
        ConversionStep::StripAlpha,
        ConversionStep::AddOpaqueAlpha,
        ConversionStep::Unpack1248To8,
        ConversionStep::Scale16To8,
        ConversionStep::Expand8To16,
        ConversionStep::ExpandGray124To8,
        ConversionStep::PaletteToRGB,
        ConversionStep::TransparencyToAlpha,
        ConversionStep::RGBToGray,
        ConversionStep::GrayToRGB,
    ];

    #[inline]
    pub(crate) fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Ordered list of conversions for one read
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConversionPlan {
    steps: Vec<ConversionStep>,
}

impl ConversionPlan {
    #[inline]
    pub fn steps(&self) -> &[ConversionStep] {
        &self.steps
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, ConversionStep> {
        self.steps.iter()
    }

    #[inline]
    pub fn contains(&self, step: ConversionStep) -> bool {
        self.steps.contains(&step)
    }

    /// Nothing to convert, rows are copied verbatim
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Position in the plan, for checking order
    pub fn position(&self, step: ConversionStep) -> Option<usize> {
        self.steps.iter().position(|&s| s == step)
    }

    fn push_if(&mut self, cond: bool, step: ConversionStep) {
        if cond {
            self.steps.push(step);
        }
    }
}

impl<'a> IntoIterator for &'a ConversionPlan {
    type Item = &'a ConversionStep;
    type IntoIter = slice::Iter<'a, ConversionStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Debug for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.steps).finish()
    }
}

/// Conversions needed to read `source` into a buffer of `target` format.
///
/// The target must be a buffer format (8 or 16 bit, not palette).
pub fn build_read_plan(source: &ImageDescriptor, target: &PixelFormat) -> Result<ConversionPlan, Error> {
    target.check_buffer_format()?;
    check_dimensions(source.width, source.height)?;

    let src = source.colortype();
    let dst = target.colortype;
    let src_depth = source.bitdepth();
    let dst_depth = target.bitdepth;

    let mut plan = ConversionPlan::default();
    plan.push_if(src.is_alpha_type() && !dst.is_alpha_type(), ConversionStep::StripAlpha);
    plan.push_if(dst.is_alpha_type() && matches!(src, ColorType::GREY | ColorType::RGB | ColorType::PALETTE), ConversionStep::AddOpaqueAlpha);
    plan.push_if(src_depth < 8 && dst_depth == 8, ConversionStep::Unpack1248To8);
    plan.push_if(src_depth == 16 && dst_depth == 8, ConversionStep::Scale16To8);
    plan.push_if(src_depth < 16 && dst_depth == 16, ConversionStep::Expand8To16);
    plan.push_if(src.is_greyscale_type() && src_depth < 8, ConversionStep::ExpandGray124To8);
    plan.push_if(src.is_palette_type(), ConversionStep::PaletteToRGB);
    plan.push_if(source.transparency, ConversionStep::TransparencyToAlpha);
    plan.push_if(dst.is_greyscale_type() && (src.is_color_type() || src.is_palette_type()), ConversionStep::RGBToGray);
    plan.push_if(dst.is_color_type() && src.is_greyscale_type(), ConversionStep::GrayToRGB);

    log::debug!("read plan {:?}/{} -> {:?}/{}: {:?}", src, src_depth, dst, dst_depth, plan);
    Ok(plan)
}

/// Rejects a read whose caller-supplied dimensions don't fit the file.
///
/// Width must match exactly. A smaller height reads only the top rows.
pub fn check_read_dimensions(source: &ImageDescriptor, width: usize, height: usize) -> Result<(), Error> {
    check_dimensions(width, height)?;
    if source.width != width || source.height == 0 || height > source.height {
        return Err(Error::InvalidDimensions);
    }
    Ok(())
}

/// `IHDR` fields for writing a buffer as-is
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WriteHeader {
    pub width: u32,
    pub height: u32,
    /// PNG color type code
    pub color_code: u8,
    pub bitdepth: u8,
}

/// Writing never converts, so this only validates and translates the buffer's format.
pub fn build_write_plan(width: usize, height: usize, format: &PixelFormat) -> Result<WriteHeader, Error> {
    format.check_buffer_format()?;
    check_dimensions(width, height)?;
    let width = u32::try_from(width).map_err(|_| Error::InvalidDimensions)?;
    let height = u32::try_from(height).map_err(|_| Error::InvalidDimensions)?;
    Ok(WriteHeader {
        width,
        height,
        color_code: format.colortype.png_code(),
        bitdepth: format.bitdepth as u8,
    })
}

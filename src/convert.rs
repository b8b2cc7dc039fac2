//! Executes conversion steps on decoded rows.
//!
//! Steps are registered in any order, then compiled into a fixed sequence of stages
//! that respects data dependencies: samples are unpacked and palettes expanded before
//! depth changes, and depth changes happen before RGB/grey conversion.
use crate::format::{ColorType, ImageDescriptor, PixelFormat};
use crate::plan::{ConversionPlan, ConversionStep, OPAQUE_FILLER};
use crate::Error;
use fallible_collections::FallibleVec;
use rgb::{FromSlice, RGB, RGB8};
use std::fmt;
use std::mem;

/// Convert an 8-bit RGB color to grey, with libpng's default weights
/// `(6969 * R + 23434 * G + 2365 * B) / 32768`.
#[inline]
pub fn gray_from_rgb8(r: u8, g: u8, b: u8) -> u8 {
    ((6969 * u32::from(r) + 23434 * u32::from(g) + 2365 * u32::from(b)) / 32768) as u8
}

/// 16-bit version of [`gray_from_rgb8`]. Same weights, 64-bit intermediate.
#[inline]
pub fn gray_from_rgb16(r: u16, g: u16, b: u16) -> u16 {
    ((6969 * u64::from(r) + 23434 * u64::from(g) + 2365 * u64::from(b)) / 32768) as u16
}

/// Set of registered steps. Adding a step twice has no effect.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct StepSet(u16);

impl StepSet {
    #[inline]
    pub fn insert(&mut self, step: ConversionStep) {
        self.0 |= step.bit();
    }

    #[inline]
    pub fn contains(self, step: ConversionStep) -> bool {
        self.0 & step.bit() != 0
    }

    #[cfg(test)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<&ConversionPlan> for StepSet {
    fn from(plan: &ConversionPlan) -> Self {
        let mut set = StepSet::default();
        for &step in plan {
            set.insert(step);
        }
        set
    }
}

impl fmt::Debug for StepSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(ConversionStep::ALL.iter().filter(|&&s| self.contains(s))).finish()
    }
}

/// Contents of the `tRNS` chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transparency {
    None,
    /// grey uses only the first value. Same bit depth as the image.
    Key([u16; 3]),
    /// alpha of the first N palette entries, the rest are opaque
    PaletteAlpha(Vec<u8>),
}

impl Transparency {
    /// Interprets raw `tRNS` chunk data for the given color type
    pub fn from_chunk(colortype: ColorType, data: &[u8]) -> Self {
        let be = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
        match colortype {
            ColorType::GREY if data.len() >= 2 => Transparency::Key([be(0); 3]),
            ColorType::RGB if data.len() >= 6 => Transparency::Key([be(0), be(2), be(4)]),
            ColorType::PALETTE => Transparency::PaletteAlpha(data.to_vec()),
            _ => {
                log::warn!("ignoring tRNS of {} bytes in {:?} image", data.len(), colortype);
                Transparency::None
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Stage {
    Palette { alpha: bool },
    KeyToAlpha,
    /// 1, 2 or 4-bit samples to the full 8-bit range
    RescaleLow { from: u32 },
    Narrow16To8,
    Widen8To16,
    StripAlpha,
    RgbToGrey,
    GreyToRgb,
    Fill,
}

/// Turns rows in the file's format into rows in the buffer's format
pub struct RowConverter {
    width: usize,
    source: PixelFormat,
    output: PixelFormat,
    stages: Vec<Stage>,
    palette: Vec<RGB8>,
    transparency: Transparency,
    work: Vec<u16>,
    next: Vec<u16>,
}

impl RowConverter {
    /// `palette` is the raw `PLTE` data (RGB triplets), empty for non-palette images.
    pub fn new(source: &ImageDescriptor, steps: StepSet, palette: &[u8], transparency: Transparency) -> Result<Self, Error> {
        let (stages, output) = compile(source, steps, &transparency);
        log::trace!("{:?} compiled to {:?}, output {:?}", steps, stages, output);

        // no stage produces more than 4 samples per pixel
        let cap = source.width.checked_mul(4).ok_or(Error::InvalidDimensions)?;
        Ok(Self {
            width: source.width,
            source: source.format,
            output,
            stages,
            palette: palette.as_rgb().to_vec(),
            transparency,
            work: scratch(cap)?,
            next: scratch(cap)?,
        })
    }

    #[cfg(test)]
    pub fn output_format(&self) -> PixelFormat {
        self.output
    }

    /// Converts one row. `out` must hold exactly one row of the output format.
    pub fn convert(&mut self, raw: &[u8], out: &mut [u8]) -> Result<(), Error> {
        let out_len = self.output.row_bytes(self.width).ok_or(Error::InvalidDimensions)?;
        if out.len() != out_len {
            return Err(Error::InvalidDimensions);
        }
        if self.stages.is_empty() && self.output == self.source {
            out.copy_from_slice(raw.get(..out_len).ok_or(Error::CodecFault)?);
            return Ok(());
        }
        if self.output.bitdepth < 8 {
            // nothing unpacked the samples, so they can't be written one per byte
            return Err(Error::CodecFault);
        }

        self.unpack(raw)?;
        let mut color = self.source.colortype;
        let mut bits = self.source.bitdepth;
        for i in 0..self.stages.len() {
            let stage = self.stages[i];
            match stage {
                Stage::Palette { alpha } => {
                    self.expand_palette(alpha);
                    color = if alpha { ColorType::RGBA } else { ColorType::RGB };
                    bits = 8;
                },
                Stage::KeyToAlpha => {
                    self.key_to_alpha(color, bits);
                    color = color.with_alpha();
                },
                Stage::RescaleLow { from } => {
                    let max_in = (1u32 << from) - 1;
                    for v in &mut self.work {
                        *v = (u32::from(*v) * 255 / max_in) as u16;
                    }
                    bits = 8;
                },
                Stage::Narrow16To8 => {
                    for v in &mut self.work {
                        *v = ((u32::from(*v) * 255 + 32767) / 65535) as u16;
                    }
                    bits = 8;
                },
                Stage::Widen8To16 => {
                    for v in &mut self.work {
                        *v *= 257;
                    }
                    bits = 16;
                },
                Stage::StripAlpha => {
                    let ch = color.channels() as usize;
                    self.map_pixels(ch, ch - 1, |src, dst| dst.copy_from_slice(&src[..dst.len()]));
                    color = color.without_alpha();
                },
                Stage::RgbToGrey => {
                    self.rgb_to_grey(color.is_alpha_type(), bits);
                    color = if color.is_alpha_type() { ColorType::GREY_ALPHA } else { ColorType::GREY };
                },
                Stage::GreyToRgb => {
                    if color.is_alpha_type() {
                        self.map_pixels(2, 4, |src, dst| dst.copy_from_slice(&[src[0], src[0], src[0], src[1]]));
                    } else {
                        self.map_pixels(1, 3, |src, dst| dst.copy_from_slice(&[src[0], src[0], src[0]]));
                    }
                    color = if color.is_alpha_type() { ColorType::RGBA } else { ColorType::RGB };
                },
                Stage::Fill => {
                    let ch = color.channels() as usize;
                    let filler = OPAQUE_FILLER >> (16 - bits);
                    self.map_pixels(ch, ch + 1, |src, dst| {
                        dst[..ch].copy_from_slice(src);
                        dst[ch] = filler;
                    });
                    color = color.with_alpha();
                },
            }
        }
        debug_assert_eq!(PixelFormat::new(color, bits), self.output);
        self.emit(out)
    }

    fn unpack(&mut self, raw: &[u8]) -> Result<(), Error> {
        let bits = self.source.bitdepth as usize;
        let samples = self.width * self.source.colortype.channels() as usize;
        let raw = raw.get(..(samples * bits + 7) / 8).ok_or(Error::CodecFault)?;
        self.work.clear();
        match bits {
            16 => self.work.extend(raw.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]))),
            8 => self.work.extend(raw.iter().map(|&b| u16::from(b))),
            1 | 2 | 4 => {
                let per_byte = 8 / bits;
                let mask = (1u8 << bits) - 1;
                self.work.extend((0..samples).map(|i| {
                    let shift = 8 - bits * (i % per_byte + 1);
                    u16::from((raw[i / per_byte] >> shift) & mask)
                }));
            },
            _ => return Err(Error::CodecFault),
        }
        Ok(())
    }

    fn expand_palette(&mut self, alpha: bool) {
        let palette = &self.palette;
        let trns: &[u8] = match &self.transparency {
            Transparency::PaletteAlpha(a) => a,
            _ => &[],
        };
        self.next.clear();
        for &index in &self.work {
            let i = usize::from(index);
            // out-of-range indices decode as opaque black
            let px = palette.get(i).copied().unwrap_or_default();
            self.next.extend_from_slice(&[px.r.into(), px.g.into(), px.b.into()]);
            if alpha {
                self.next.push(trns.get(i).copied().unwrap_or(255).into());
            }
        }
        mem::swap(&mut self.work, &mut self.next);
    }

    fn key_to_alpha(&mut self, color: ColorType, bits: u32) {
        let key = match self.transparency {
            Transparency::Key(key) => key,
            _ => return,
        };
        let ch = color.channels() as usize;
        let opaque = u16::MAX >> (16 - bits);
        self.map_pixels(ch, ch + 1, |src, dst| {
            dst[..ch].copy_from_slice(src);
            dst[ch] = if src == &key[..ch] { 0 } else { opaque };
        });
    }

    fn rgb_to_grey(&mut self, alpha: bool, bits: u32) {
        let luma = |px: RGB<u16>| if bits == 16 {
            gray_from_rgb16(px.r, px.g, px.b)
        } else {
            u16::from(gray_from_rgb8(px.r as u8, px.g as u8, px.b as u8))
        };
        self.next.clear();
        if alpha {
            self.next.extend(self.work.as_rgba().iter().flat_map(|px| [luma(px.rgb()), px.a]));
        } else {
            self.next.extend(self.work.as_rgb().iter().map(|&px| luma(px)));
        }
        mem::swap(&mut self.work, &mut self.next);
    }

    fn map_pixels(&mut self, in_ch: usize, out_ch: usize, mut f: impl FnMut(&[u16], &mut [u16])) {
        self.next.clear();
        self.next.resize(self.width * out_ch, 0);
        for (src, dst) in self.work.chunks_exact(in_ch).zip(self.next.chunks_exact_mut(out_ch)) {
            f(src, dst);
        }
        mem::swap(&mut self.work, &mut self.next);
    }

    fn emit(&self, out: &mut [u8]) -> Result<(), Error> {
        if self.output.bitdepth == 16 {
            if out.len() != self.work.len() * 2 {
                return Err(Error::CodecFault);
            }
            for (o, &v) in out.chunks_exact_mut(2).zip(&self.work) {
                o.copy_from_slice(&v.to_be_bytes());
            }
        } else {
            if out.len() != self.work.len() {
                return Err(Error::CodecFault);
            }
            for (o, &v) in out.iter_mut().zip(&self.work) {
                *o = v as u8;
            }
        }
        Ok(())
    }
}

/// Format that `steps` turn `source` into, without building a converter
pub fn converted_format(source: &ImageDescriptor, steps: StepSet, transparency: &Transparency) -> PixelFormat {
    compile(source, steps, transparency).1
}

fn scratch(cap: usize) -> Result<Vec<u16>, Error> {
    Ok(<Vec<u16> as FallibleVec<u16>>::try_with_capacity(cap)?)
}

/// Orders the registered steps into stages and works out the resulting format
fn compile(source: &ImageDescriptor, steps: StepSet, transparency: &Transparency) -> (Vec<Stage>, PixelFormat) {
    use ConversionStep::*;

    let mut stages = Vec::new();
    let mut color = source.colortype();
    let mut bits = source.bitdepth();
    // tRNS only turns into alpha if the output keeps an alpha channel
    let trns_alpha = steps.contains(TransparencyToAlpha) && steps.contains(AddOpaqueAlpha);

    if color.is_palette_type() && steps.contains(PaletteToRGB) {
        let alpha = trns_alpha && matches!(transparency, Transparency::PaletteAlpha(_));
        stages.push(Stage::Palette { alpha });
        color = if alpha { ColorType::RGBA } else { ColorType::RGB };
        bits = 8;
    }
    if trns_alpha && matches!(transparency, Transparency::Key(_)) && matches!(color, ColorType::GREY | ColorType::RGB) {
        stages.push(Stage::KeyToAlpha);
        color = color.with_alpha();
    }
    if bits < 8 && !color.is_palette_type() {
        if steps.contains(ExpandGray124To8) || steps.contains(Expand8To16) {
            stages.push(Stage::RescaleLow { from: bits });
            bits = 8;
        } else if steps.contains(Unpack1248To8) {
            bits = 8;
        }
    }
    if bits == 16 && steps.contains(Scale16To8) {
        stages.push(Stage::Narrow16To8);
        bits = 8;
    }
    if bits == 8 && steps.contains(Expand8To16) {
        stages.push(Stage::Widen8To16);
        bits = 16;
    }
    if color.is_alpha_type() && steps.contains(StripAlpha) {
        stages.push(Stage::StripAlpha);
        color = color.without_alpha();
    }
    if color.is_color_type() && steps.contains(RGBToGray) {
        stages.push(Stage::RgbToGrey);
        color = if color.is_alpha_type() { ColorType::GREY_ALPHA } else { ColorType::GREY };
    }
    if color.is_greyscale_type() && steps.contains(GrayToRGB) {
        stages.push(Stage::GreyToRgb);
        color = if color.is_alpha_type() { ColorType::RGBA } else { ColorType::RGB };
    }
    if steps.contains(AddOpaqueAlpha) && !color.is_alpha_type() && !color.is_palette_type() {
        stages.push(Stage::Fill);
        color = color.with_alpha();
    }
    (stages, PixelFormat::new(color, bits))
}

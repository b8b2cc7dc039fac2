//! Read and write PNG files straight into pixel buffers of the format you ask for.
//!
//! The file's own format (palette, 1 to 16 bits, with or without `tRNS`) is converted
//! on the fly to 8 or 16-bit grey, grey+alpha, RGB or RGBA. 16-bit samples are big-endian
//! in memory, the same as in the file.
//!
//! ```rust,no_run
//! let info = pngw::inspect("in.png")?;
//! let size = pngw::compute_buffer_size(info.width, info.height, 8, pngw::ColorType::RGBA)?;
//! let mut pixels = vec![0; size];
//! pngw::read_image("in.png", &mut pixels, info.width, info.height, 8, pngw::ColorType::RGBA, pngw::DEFAULT_ROW_STRIDE)?;
//! pngw::write_image("out.png", &pixels, info.width, info.height, 8, pngw::ColorType::RGBA, pngw::DEFAULT_ROW_STRIDE)?;
//! # Ok::<_, pngw::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::too_many_arguments)]

mod codec;
mod convert;
mod error;
mod format;
mod iter;
mod plan;
mod settings;

#[cfg(feature = "c_ffi")]
#[cfg_attr(docsrs, doc(cfg(feature = "c_ffi")))]
pub mod ffi;

pub use crate::codec::{PngRowDecoder, PngRowEncoder, RowDecoder, RowEncoder, PNG_SIGNATURE};
pub use crate::convert::{gray_from_rgb16, gray_from_rgb8};
pub use crate::error::{error_text, Error, ErrorCode};
pub use crate::format::{compute_buffer_size, row_stride, ColorType, ImageDescriptor, PixelFormat, COLOR_NAMES, DEFAULT_ROW_STRIDE};
pub use crate::plan::{build_read_plan, build_write_plan, check_read_dimensions, ConversionPlan, ConversionStep, WriteHeader, OPAQUE_FILLER};
pub use crate::settings::{DecoderSettings, EncoderSettings, FilterStrategy};
pub use rgb::RGB8 as RGB;
pub use rgb::RGBA8 as RGBA;

use crate::format::BufferLayout;
use crate::iter::{Rows, RowsMut};
use fallible_collections::FallibleVec;
use rgb::ComponentBytes;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Decoded image with typed pixels
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bitmap<PixelType> {
    /// Pixels, row by row, without padding
    pub buffer: Vec<PixelType>,
    pub width: usize,
    pub height: usize,
}

/// Reads PNG files with the given settings
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    pub settings: DecoderSettings,
}

impl Decoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Header of the file, without decoding pixels
    pub fn inspect_file<P: AsRef<Path>>(&self, filepath: P) -> Result<ImageDescriptor, Error> {
        log::trace!("inspect {}", filepath.as_ref().display());
        Ok(*self.open(open_file(filepath.as_ref())?)?.descriptor())
    }

    /// Header of a PNG file in memory
    pub fn inspect(&self, data: &[u8]) -> Result<ImageDescriptor, Error> {
        Ok(*self.open(data)?.descriptor())
    }

    /// Decodes the file into `buffer`, converting to `format`.
    ///
    /// `width` must be the image's width. `height` may be smaller than the image's, then only the top rows are read.
    /// Rows are `stride` bytes apart, or tightly packed if it's `DEFAULT_ROW_STRIDE`.
    pub fn read_file<P: AsRef<Path>>(&self, filepath: P, buffer: &mut [u8], width: usize, height: usize, format: PixelFormat, stride: usize) -> Result<(), Error> {
        let filepath = filepath.as_ref();
        log::trace!("read {} as {}x{} {:?}", filepath.display(), width, height, format);
        // bad arguments are reported before touching the file
        let layout = BufferLayout::new(width, height, &format, stride)?;
        layout.check_len(buffer.len())?;
        let mut decoder = self.open(open_file(filepath)?)?;
        read_rows(&mut decoder, buffer, &layout, width, &format)
    }

    /// Same as [`read_file`](Self::read_file), for PNG data in memory
    pub fn read(&self, data: &[u8], buffer: &mut [u8], width: usize, height: usize, format: PixelFormat, stride: usize) -> Result<(), Error> {
        let layout = BufferLayout::new(width, height, &format, stride)?;
        layout.check_len(buffer.len())?;
        let mut decoder = self.open(data)?;
        read_rows(&mut decoder, buffer, &layout, width, &format)
    }

    /// Decodes the whole image into a new, tightly packed buffer
    pub fn decode_file<P: AsRef<Path>>(&self, filepath: P, format: PixelFormat) -> Result<(ImageDescriptor, Vec<u8>), Error> {
        format.check_buffer_format()?;
        let decoder = self.open(open_file(filepath.as_ref())?)?;
        decode_vec(decoder, format)
    }

    /// Same as [`decode_file`](Self::decode_file), for PNG data in memory
    pub fn decode(&self, data: &[u8], format: PixelFormat) -> Result<(ImageDescriptor, Vec<u8>), Error> {
        format.check_buffer_format()?;
        decode_vec(self.open(data)?, format)
    }

    fn open<R: Read>(&self, r: R) -> Result<PngRowDecoder<R>, Error> {
        PngRowDecoder::new(r, &self.settings)
    }
}

/// Writes PNG files with the given settings
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    pub settings: EncoderSettings,
}

impl Encoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `buffer` as-is. The file gets the buffer's color type and bit depth.
    ///
    /// The image is encoded before the file is created, so a failed encode leaves any existing file untouched.
    pub fn encode_file<P: AsRef<Path>>(&self, filepath: P, buffer: &[u8], width: usize, height: usize, format: PixelFormat, stride: usize) -> Result<(), Error> {
        let filepath = filepath.as_ref();
        log::trace!("write {} from {}x{} {:?}", filepath.display(), width, height, format);
        let data = self.encode(buffer, width, height, format, stride)?;
        let mut file = File::create(filepath).map_err(|_| Error::FileCreationFailure)?;
        if let Err(err) = file.write_all(&data).and_then(|_| file.flush()) {
            log::warn!("writing {} failed: {}", filepath.display(), err);
            // don't leave a truncated image behind, but never unlink a device or pipe
            let is_file = file.metadata().map(|m| m.is_file()).unwrap_or(false);
            drop(file);
            if is_file {
                let _ = std::fs::remove_file(filepath);
            }
            return Err(Error::FileCreationFailure);
        }
        Ok(())
    }

    /// Same as [`encode_file`](Self::encode_file), but returns the file's bytes
    pub fn encode(&self, buffer: &[u8], width: usize, height: usize, format: PixelFormat, stride: usize) -> Result<Vec<u8>, Error> {
        let header = build_write_plan(width, height, &format)?;
        let layout = BufferLayout::new(width, height, &format, stride)?;
        layout.check_len(buffer.len())?;
        let mut out = Vec::new();
        self.write_rows(&mut out, &header, buffer, &layout)?;
        Ok(out)
    }

    fn write_rows<W: Write>(&self, out: W, header: &WriteHeader, buffer: &[u8], layout: &BufferLayout) -> Result<(), Error> {
        let mut encoder = PngRowEncoder::new(out, header, &self.settings)?;
        for row in Rows::new(buffer, layout) {
            encoder.write_row(row)?;
        }
        encoder.finish()
    }
}

fn open_file(filepath: &Path) -> Result<BufReader<File>, Error> {
    let file = File::open(filepath).map_err(|_| Error::NotFound)?;
    Ok(BufReader::new(file))
}

/// Converts and copies every row of the caller's buffer. The plan is built and checked before the first row.
fn read_rows<D: RowDecoder>(decoder: &mut D, buffer: &mut [u8], layout: &BufferLayout, width: usize, target: &PixelFormat) -> Result<(), Error> {
    let source = *decoder.descriptor();
    check_read_dimensions(&source, width, layout.height)?;
    let plan = build_read_plan(&source, target)?;
    for &step in &plan {
        decoder.apply_conversion(step);
    }
    let output = decoder.output_format();
    if output != *target {
        log::error!("conversion plan {:?} produced {:?}, not {:?}", plan, output, target);
        return Err(Error::CodecFault);
    }
    for row in RowsMut::new(buffer, layout) {
        decoder.read_row(row)?;
    }
    Ok(())
}

fn decode_vec<D: RowDecoder>(mut decoder: D, format: PixelFormat) -> Result<(ImageDescriptor, Vec<u8>), Error> {
    let info = *decoder.descriptor();
    let size = compute_buffer_size(info.width, info.height, format.bitdepth, format.colortype)?;
    let mut buffer: Vec<u8> = Vec::new();
    buffer.try_resize(size, 0)?;
    let layout = BufferLayout::new(info.width, info.height, &format, DEFAULT_ROW_STRIDE)?;
    read_rows(&mut decoder, &mut buffer, &layout, info.width, &format)?;
    Ok((info, buffer))
}

fn decode_bitmap<T: Copy + Default>(filepath: &Path, colortype: ColorType) -> Result<Bitmap<T>, Error>
where
    [T]: ComponentBytes<u8>,
{
    let format = PixelFormat::new(colortype, 8);
    let mut decoder = Decoder::new().open(open_file(filepath)?)?;
    let info = *decoder.descriptor();
    let len = info.width.checked_mul(info.height).ok_or(Error::InvalidDimensions)?;
    let mut buffer: Vec<T> = Vec::new();
    buffer.try_resize(len, T::default())?;
    let layout = BufferLayout::new(info.width, info.height, &format, DEFAULT_ROW_STRIDE)?;
    read_rows(&mut decoder, buffer.as_bytes_mut(), &layout, info.width, &format)?;
    Ok(Bitmap {
        buffer,
        width: info.width,
        height: info.height,
    })
}

/// Reads the header of a PNG file: dimensions, native format, transparency and interlacing.
pub fn inspect<P: AsRef<Path>>(filepath: P) -> Result<ImageDescriptor, Error> {
    Decoder::new().inspect_file(filepath)
}

/// Header of PNG data in memory
pub fn inspect_memory(data: &[u8]) -> Result<ImageDescriptor, Error> {
    Decoder::new().inspect(data)
}

/// Reads a PNG file into `buffer` in the given format, see [`Decoder::read_file`].
pub fn read_image<P: AsRef<Path>>(filepath: P, buffer: &mut [u8], width: usize, height: usize, bitdepth: u32, colortype: ColorType, stride: usize) -> Result<(), Error> {
    Decoder::new().read_file(filepath, buffer, width, height, PixelFormat::new(colortype, bitdepth), stride)
}

/// Decodes PNG data in memory into `buffer`
pub fn read_image_memory(data: &[u8], buffer: &mut [u8], width: usize, height: usize, bitdepth: u32, colortype: ColorType, stride: usize) -> Result<(), Error> {
    Decoder::new().read(data, buffer, width, height, PixelFormat::new(colortype, bitdepth), stride)
}

/// Reads a whole PNG file into a newly allocated, tightly packed buffer
pub fn read_image_vec<P: AsRef<Path>>(filepath: P, colortype: ColorType, bitdepth: u32) -> Result<(ImageDescriptor, Vec<u8>), Error> {
    Decoder::new().decode_file(filepath, PixelFormat::new(colortype, bitdepth))
}

/// Writes `buffer` to a new PNG file, replacing any existing one
pub fn write_image<P: AsRef<Path>>(filepath: P, buffer: &[u8], width: usize, height: usize, bitdepth: u32, colortype: ColorType, stride: usize) -> Result<(), Error> {
    Encoder::new().encode_file(filepath, buffer, width, height, PixelFormat::new(colortype, bitdepth), stride)
}

/// Encodes `buffer` to PNG in memory
pub fn write_image_memory(buffer: &[u8], width: usize, height: usize, bitdepth: u32, colortype: ColorType, stride: usize) -> Result<Vec<u8>, Error> {
    Encoder::new().encode(buffer, width, height, PixelFormat::new(colortype, bitdepth), stride)
}

/// Converts PNG file to 8-bit RGBA pixels
pub fn decode32_file<P: AsRef<Path>>(filepath: P) -> Result<Bitmap<RGBA>, Error> {
    decode_bitmap(filepath.as_ref(), ColorType::RGBA)
}

/// Converts PNG file to 8-bit RGB pixels. Alpha is dropped.
pub fn decode24_file<P: AsRef<Path>>(filepath: P) -> Result<Bitmap<RGB>, Error> {
    decode_bitmap(filepath.as_ref(), ColorType::RGB)
}

//! Row-at-a-time access to the `png` crate.
//!
//! The rest of the library only talks to the [`RowDecoder`] and [`RowEncoder`] traits.
use crate::convert::{converted_format, RowConverter, StepSet, Transparency};
use crate::format::{ColorType, ImageDescriptor, PixelFormat};
use crate::plan::{ConversionStep, WriteHeader};
use crate::settings::{DecoderSettings, EncoderSettings};
use crate::Error;
use fallible_collections::FallibleVec;
use std::io::{self, Cursor, Read, Write};

/// First 8 bytes of every PNG file
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Decoder positioned after the image header
pub trait RowDecoder {
    /// Header of the opened file
    fn descriptor(&self) -> &ImageDescriptor;

    /// Registers a conversion. Registering the same step twice has no effect.
    fn apply_conversion(&mut self, step: ConversionStep);

    /// Format of the rows `read_row` will produce with the registered conversions
    fn output_format(&self) -> PixelFormat;

    /// Decodes the next row into `out`, which must hold exactly one row of `output_format()`.
    fn read_row(&mut self, out: &mut [u8]) -> Result<(), Error>;
}

pub trait RowEncoder {
    /// Row in the format given by the header, 16-bit samples big-endian
    fn write_row(&mut self, row: &[u8]) -> Result<(), Error>;

    /// Writes the remaining data and the end of the file
    fn finish(self) -> Result<(), Error>;
}

/// Signature, `IHDR` length and type, width and height
const HEADER_LEN: usize = 24;

type HeadedReader<R> = io::Chain<Cursor<[u8; HEADER_LEN]>, R>;

pub struct PngRowDecoder<R: Read> {
    reader: png::Reader<HeadedReader<R>>,
    descriptor: ImageDescriptor,
    palette: Vec<u8>,
    transparency: Transparency,
    steps: StepSet,
    converter: Option<RowConverter>,
}

impl<R: Read> PngRowDecoder<R> {
    /// Checks the signature and reads chunks up to the first `IDAT`.
    pub fn new(mut r: R, settings: &DecoderSettings) -> Result<Self, Error> {
        let mut head = [0; HEADER_LEN];
        r.read_exact(&mut head[..8]).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::InvalidSignature,
            _ => Error::from(e),
        })?;
        if head[..8] != PNG_SIGNATURE {
            return Err(Error::InvalidSignature);
        }
        r.read_exact(&mut head[8..]).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::CodecFault,
            _ => Error::from(e),
        })?;
        // png refuses a zero-sized header as corrupt
        if &head[12..16] == b"IHDR" {
            let width = u32::from_be_bytes([head[16], head[17], head[18], head[19]]);
            let height = u32::from_be_bytes([head[20], head[21], head[22], head[23]]);
            if width == 0 || height == 0 {
                log::debug!("zero-sized header {}x{}", width, height);
                return Err(Error::InvalidDimensions);
            }
        }

        let mut decoder = png::Decoder::new_with_limits(Cursor::new(head).chain(r), settings.limits());
        decoder.set_transformations(png::Transformations::IDENTITY);
        let reader = decoder.read_info()?;

        let info = reader.info();
        let colortype = ColorType::from_png_code(info.color_type as u8).ok_or(Error::CodecFault)?;
        let width = usize::try_from(info.width).map_err(|_| Error::InvalidDimensions)?;
        let height = usize::try_from(info.height).map_err(|_| Error::InvalidDimensions)?;
        let mut descriptor = ImageDescriptor::new(width, height, PixelFormat::new(colortype, info.bit_depth as u32))?;
        descriptor.transparency = info.trns.is_some();
        descriptor.interlaced = info.interlaced;

        let transparency = match &info.trns {
            Some(trns) => Transparency::from_chunk(colortype, trns),
            None => Transparency::None,
        };
        let palette = info.palette.as_deref().unwrap_or_default().to_vec();
        log::debug!("opened {}x{} {:?}/{} trns={} interlaced={}", width, height, colortype, descriptor.bitdepth(), descriptor.transparency, descriptor.interlaced);

        Ok(Self {
            reader,
            descriptor,
            palette,
            transparency,
            steps: StepSet::default(),
            converter: None,
        })
    }

    fn converter(&mut self) -> Result<&mut RowConverter, Error> {
        if self.converter.is_none() {
            if self.descriptor.interlaced {
                log::warn!("interlaced images can't be read row by row");
                return Err(Error::CodecFault);
            }
            let converter = RowConverter::new(&self.descriptor, self.steps, &self.palette, self.transparency.clone())?;
            self.converter = Some(converter);
        }
        self.converter.as_mut().ok_or(Error::CodecFault)
    }
}

impl<R: Read> RowDecoder for PngRowDecoder<R> {
    fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    fn apply_conversion(&mut self, step: ConversionStep) {
        if !self.steps.contains(step) {
            self.steps.insert(step);
            // rebuilt on the next row
            self.converter = None;
        }
    }

    fn output_format(&self) -> PixelFormat {
        converted_format(&self.descriptor, self.steps, &self.transparency)
    }

    fn read_row(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.converter()?;
        let row = self.reader.next_row()?.ok_or(Error::CodecFault)?;
        match self.converter.as_mut() {
            Some(converter) => converter.convert(row.data(), out),
            None => Err(Error::CodecFault),
        }
    }
}

/// Collects rows and compresses them on `finish`
pub struct PngRowEncoder<W: Write> {
    writer: png::Writer<W>,
    row_bytes: usize,
    total: usize,
    data: Vec<u8>,
}

impl<W: Write> PngRowEncoder<W> {
    /// Writes the signature and the header chunk
    pub fn new(w: W, header: &WriteHeader, settings: &EncoderSettings) -> Result<Self, Error> {
        let color = png::ColorType::from_u8(header.color_code).ok_or(Error::InvalidColor)?;
        let depth = png::BitDepth::from_u8(header.bitdepth).ok_or(Error::InvalidDepth)?;
        let colortype = ColorType::from_png_code(header.color_code).ok_or(Error::InvalidColor)?;
        let row_bytes = PixelFormat::new(colortype, header.bitdepth.into())
            .row_bytes(header.width as usize)
            .ok_or(Error::InvalidDimensions)?;
        let total = row_bytes.checked_mul(header.height as usize).ok_or(Error::InvalidDimensions)?;

        let mut encoder = png::Encoder::new(w, header.width, header.height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        encoder.set_compression(settings.compression());
        let (filter, adaptive) = settings.filter_strategy.to_png();
        encoder.set_filter(filter);
        encoder.set_adaptive_filter(adaptive);
        let writer = encoder.write_header()?;
        log::debug!("writing {}x{} color {} depth {}", header.width, header.height, header.color_code, header.bitdepth);

        Ok(Self {
            writer,
            row_bytes,
            total,
            data: <Vec<u8> as FallibleVec<u8>>::try_with_capacity(total)?,
        })
    }
}

impl<W: Write> RowEncoder for PngRowEncoder<W> {
    fn write_row(&mut self, row: &[u8]) -> Result<(), Error> {
        if row.len() != self.row_bytes || self.data.len() + row.len() > self.total {
            return Err(Error::InvalidDimensions);
        }
        self.data.try_extend_from_slice_no_copy(row)?;
        Ok(())
    }

    fn finish(mut self) -> Result<(), Error> {
        if self.data.len() != self.total {
            // the header promised more rows
            return Err(Error::CodecFault);
        }
        self.writer.write_image_data(&self.data)?;
        self.writer.finish()?;
        Ok(())
    }
}

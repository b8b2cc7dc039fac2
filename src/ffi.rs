//! C API with the same contract as the Rust one.
//!
//! Every function returns an [`ErrorCode`]; `0` is success. Color types are passed as
//! `int` indices of [`ColorType`] and are validated before use.
#![allow(clippy::missing_safety_doc)]

use crate::format::BufferLayout;
use crate::{ColorType, Error, ErrorCode, PixelFormat};
use libc::{c_char, c_int, size_t};
use std::ffi::CStr;
use std::path::*;
use std::slice;

macro_rules! pngw_try {
    ($e:expr) => {{
        match $e {
            Err(e) => return ErrorCode::from(e),
            Ok(o) => o,
        }
    }};
}

macro_rules! pngw_error {
    ($e:expr) => {
        if let Err(e) = $e {
            ErrorCode::from(e)
        } else {
            ErrorCode::NONE
        }
    };
}

fn color_arg(color: c_int) -> Result<ColorType, Error> {
    usize::try_from(color).ok().and_then(ColorType::from_index).ok_or(Error::InvalidColor)
}

fn format_arg(depth: size_t, color: c_int) -> Result<PixelFormat, Error> {
    let colortype = color_arg(color)?;
    let bitdepth = u32::try_from(depth).map_err(|_| Error::InvalidDepth)?;
    let format = PixelFormat::new(colortype, bitdepth);
    format.check_buffer_format()?;
    Ok(format)
}

/// Header of a PNG file. Any of the output pointers may be null.
#[no_mangle]
pub unsafe extern "C" fn pngw_file_info(path: *const c_char, width: *mut size_t, height: *mut size_t, depth: *mut size_t, color: *mut c_int) -> ErrorCode {
    if path.is_null() {
        return Error::NullArgument.into();
    }
    let info = pngw_try!(crate::inspect(c_path(path)));
    if let Some(width) = width.as_mut() {
        *width = info.width;
    }
    if let Some(height) = height.as_mut() {
        *height = info.height;
    }
    if let Some(depth) = depth.as_mut() {
        *depth = info.bitdepth() as size_t;
    }
    if let Some(color) = color.as_mut() {
        *color = info.colortype() as c_int;
    }
    ErrorCode::NONE
}

/// Size of a tightly packed buffer. `size` may be null, then only the arguments are checked.
#[no_mangle]
pub unsafe extern "C" fn pngw_data_size(width: size_t, height: size_t, depth: size_t, color: c_int, size: *mut size_t) -> ErrorCode {
    let colortype = pngw_try!(color_arg(color));
    let bitdepth = pngw_try!(u32::try_from(depth).map_err(|_| Error::InvalidDepth));
    let len = pngw_try!(crate::compute_buffer_size(width, height, bitdepth, colortype));
    if let Some(size) = size.as_mut() {
        *size = len;
    }
    ErrorCode::NONE
}

/// `data` must hold `(height - 1) * stride + width * bytes_per_pixel` bytes.
/// `row_offset` 0 means tightly packed rows.
#[no_mangle]
pub unsafe extern "C" fn pngw_read_file(path: *const c_char, data: *mut u8, row_offset: size_t, width: size_t, height: size_t, depth: size_t, color: c_int) -> ErrorCode {
    if path.is_null() || data.is_null() {
        return Error::NullArgument.into();
    }
    let format = pngw_try!(format_arg(depth, color));
    let layout = pngw_try!(BufferLayout::new(width, height, &format, row_offset));
    let buffer = slice::from_raw_parts_mut(data, layout.len);
    pngw_error!(crate::read_image(c_path(path), buffer, width, height, format.bitdepth, format.colortype, row_offset))
}

/// Writes `data`, laid out as for [`pngw_read_file`], as a PNG file of the same format
#[no_mangle]
pub unsafe extern "C" fn pngw_write_file(path: *const c_char, data: *const u8, row_offset: size_t, width: size_t, height: size_t, depth: size_t, color: c_int) -> ErrorCode {
    if path.is_null() || data.is_null() {
        return Error::NullArgument.into();
    }
    let format = pngw_try!(format_arg(depth, color));
    let layout = pngw_try!(BufferLayout::new(width, height, &format, row_offset));
    let buffer = slice::from_raw_parts(data, layout.len);
    pngw_error!(crate::write_image(c_path(path), buffer, width, height, format.bitdepth, format.colortype, row_offset))
}

#[no_mangle]
pub extern "C" fn pngw_gray_from_color8(r: u8, g: u8, b: u8) -> u8 {
    crate::gray_from_rgb8(r, g, b)
}

#[no_mangle]
pub extern "C" fn pngw_gray_from_color16(r: u16, g: u16, b: u16) -> u16 {
    crate::gray_from_rgb16(r, g, b)
}

/// Static, NUL-terminated. Unknown codes get a generic description.
#[no_mangle]
pub extern "C" fn pngw_error_text(code: ErrorCode) -> *const c_char {
    code.c_description().as_ptr().cast()
}

/// Static, NUL-terminated name of the color type, or null if it's out of range
#[no_mangle]
pub extern "C" fn pngw_color_name(color: c_int) -> *const c_char {
    match color_arg(color) {
        Ok(c) => c.c_name().as_ptr().cast(),
        Err(_) => std::ptr::null(),
    }
}

/// PNG color type code. Out-of-range values map to grey.
#[no_mangle]
pub extern "C" fn pngw_color_to_png_color(color: c_int) -> c_int {
    color_arg(color).unwrap_or(ColorType::GREY).png_code().into()
}

/// Index of the PNG color type code. Unknown codes map to grey.
#[no_mangle]
pub extern "C" fn pngw_png_color_to_color(png_color: c_int) -> c_int {
    u8::try_from(png_color).ok()
        .and_then(ColorType::from_png_code)
        .unwrap_or(ColorType::GREY) as c_int
}

#[cfg(unix)]
unsafe fn c_path<'a>(filename: *const c_char) -> &'a Path {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    let tmp = CStr::from_ptr(filename);
    Path::new(OsStr::from_bytes(tmp.to_bytes()))
}

#[cfg(not(unix))]
unsafe fn c_path(filename: *const c_char) -> PathBuf {
    let tmp = CStr::from_ptr(filename);
    tmp.to_string_lossy().to_string().into()
}

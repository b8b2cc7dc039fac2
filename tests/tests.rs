use pngw::*;
use std::path::{Path, PathBuf};

// top-level files create new executables, which is slower
mod roundtrip {
    mod roundtrip_test;
}

fn temp_png(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pngw-{}-{}.png", name, std::process::id()))
}

/// Writes a file with the `png` crate directly, for formats the library never writes
fn write_fixture(name: &str, width: u32, height: u32, color: png::ColorType, depth: png::BitDepth, palette: Option<&[u8]>, trns: Option<&[u8]>, data: &[u8]) -> PathBuf {
    let mut out = Vec::new();
    {
        let mut enc = png::Encoder::new(&mut out, width, height);
        enc.set_color(color);
        enc.set_depth(depth);
        if let Some(p) = palette {
            enc.set_palette(p.to_vec());
        }
        if let Some(t) = trns {
            enc.set_trns(t.to_vec());
        }
        let mut w = enc.write_header().unwrap();
        w.write_image_data(data).unwrap();
    }
    let path = temp_png(name);
    std::fs::write(&path, out).unwrap();
    path
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in data {
        crc ^= u32::from(b);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// Sets the interlace byte of `IHDR` and fixes its CRC. The pixel data is left as it was.
fn mark_interlaced(path: &Path) {
    let mut data = std::fs::read(path).unwrap();
    assert_eq!(b"IHDR", &data[12..16]);
    data[28] = 1;
    fix_ihdr_crc(&mut data);
    std::fs::write(path, data).unwrap();
}

fn fix_ihdr_crc(data: &mut [u8]) {
    let crc = crc32(&data[12..29]);
    data[29..33].copy_from_slice(&crc.to_be_bytes());
}

#[test]
fn buffer_sizes() {
    assert_eq!(Ok(10 * 10 * 4), compute_buffer_size(10, 10, 8, ColorType::RGBA));
    assert_eq!(Ok(3 * 2 * 2 * 2), compute_buffer_size(3, 2, 16, ColorType::GREY_ALPHA));
    assert_eq!(Err(Error::InvalidDepth), compute_buffer_size(10, 10, 4, ColorType::RGBA));
    assert_eq!(Err(Error::InvalidColor), compute_buffer_size(10, 10, 8, ColorType::PALETTE));
    assert_eq!(Err(Error::InvalidDimensions), compute_buffer_size(0, 10, 8, ColorType::GREY));
    assert_eq!(Err(Error::InvalidDimensions), compute_buffer_size(usize::MAX, 2, 8, ColorType::GREY));
}

#[test]
fn write_then_inspect() {
    let path = temp_png("inspect");
    let pixels = vec![0x55u8; compute_buffer_size(5, 4, 16, ColorType::RGB).unwrap()];
    write_image(&path, &pixels, 5, 4, 16, ColorType::RGB, DEFAULT_ROW_STRIDE).unwrap();
    let info = inspect(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(5, info.width);
    assert_eq!(4, info.height);
    assert_eq!(16, info.bitdepth());
    assert_eq!(ColorType::RGB, info.colortype());
    assert!(!info.transparency);
}

#[test]
fn missing_file() {
    let path = temp_png("does-not-exist");
    assert_eq!(Err(Error::NotFound), inspect(&path));
    let mut buf = [0; 4];
    assert_eq!(Err(Error::NotFound), read_image(&path, &mut buf, 1, 1, 8, ColorType::RGBA, DEFAULT_ROW_STRIDE));
    assert_eq!("file not found at path", Error::NotFound.as_str());
}

#[test]
fn not_a_png() {
    let path = temp_png("not-a-png");
    std::fs::write(&path, b"GIF89a, definitely not a PNG").unwrap();
    assert_eq!(Err(Error::InvalidSignature), inspect(&path));
    std::fs::write(&path, b"\x89PNG").unwrap();
    assert_eq!(Err(Error::InvalidSignature), inspect(&path));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn cant_create() {
    let dir = std::env::temp_dir().join("pngw-no-such-dir").join("sub");
    let pixels = [0u8; 3];
    assert_eq!(Err(Error::FileCreationFailure), write_image(dir.join("x.png"), &pixels, 1, 1, 8, ColorType::RGB, 0));
    assert_eq!(Err(Error::InvalidColor), write_image(dir.join("x.png"), &pixels, 1, 1, 8, ColorType::PALETTE, 0));
}

#[test]
fn failed_write_keeps_old_file() {
    let path = temp_png("keep-old");
    write_image(&path, &[9u8; 3], 1, 1, 8, ColorType::RGB, 0).unwrap();
    let before = std::fs::read(&path).unwrap();
    assert_eq!(Err(Error::InvalidDimensions), write_image(&path, &[0u8; 5], 2, 1, 8, ColorType::RGB, 0));
    let after = std::fs::read(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(before, after);
}

#[test]
#[cfg(target_os = "linux")]
fn write_error_after_create() {
    // opens fine, every write fails with ENOSPC
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    assert_eq!(Err(Error::FileCreationFailure), write_image(full, &[0u8; 3], 1, 1, 8, ColorType::RGB, 0));
    assert!(full.exists());
}

#[test]
fn width_mismatch() {
    let path = temp_png("width-mismatch");
    write_image(&path, &[1u8; 12], 4, 1, 8, ColorType::RGB, 0).unwrap();
    let mut buf = [0u8; 100];
    let res = read_image(&path, &mut buf, 5, 1, 8, ColorType::RGB, 0);
    let _ = std::fs::remove_file(&path);
    assert_eq!(Err(Error::InvalidDimensions), res);
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn palette_with_alpha() {
    let palette = [255, 0, 0, 0, 255, 0, 0, 0, 255];
    let path = write_fixture("palette", 3, 1, png::ColorType::Indexed, png::BitDepth::Eight, Some(&palette), Some(&[0, 128]), &[0, 1, 2]);
    let info = inspect(&path).unwrap();
    assert_eq!(ColorType::PALETTE, info.colortype());
    assert!(info.transparency);

    let mut rgba = [0u8; 12];
    read_image(&path, &mut rgba, 3, 1, 8, ColorType::RGBA, 0).unwrap();
    let mut ga = [0u8; 6];
    read_image(&path, &mut ga, 3, 1, 8, ColorType::GREY_ALPHA, 0).unwrap();
    let mut rgb16 = [0u8; 18];
    read_image(&path, &mut rgb16, 3, 1, 16, ColorType::RGB, 0).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!([255, 0, 0, 0, 0, 255, 0, 128, 0, 0, 255, 255], rgba);
    assert_eq!([54, 0, 182, 128, 18, 255], ga);
    assert_eq!([255, 255, 0, 0, 0, 0, 0, 0, 255, 255, 0, 0, 0, 0, 0, 0, 255, 255], rgb16);
}

#[test]
fn one_bit_grey() {
    let path = write_fixture("1bit", 10, 2, png::ColorType::Grayscale, png::BitDepth::One, None, None, &[0b1010_0000, 0, 0b1111_1111, 0b1100_0000]);
    let (info, grey) = read_image_vec(&path, ColorType::GREY, 8).unwrap();
    let (_, rgba16) = read_image_vec(&path, ColorType::RGBA, 16).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(1, info.bitdepth());
    assert_eq!(&[255, 0, 255, 0, 0, 0, 0, 0, 0, 0], &grey[..10]);
    assert_eq!(&[255; 10], &grey[10..]);
    assert_eq!(10 * 2 * 8, rgba16.len());
    assert_eq!(&[0xFF; 8], &rgba16[..8]);
    assert_eq!(&[0, 0, 0, 0, 0, 0, 0xFF, 0xFF], &rgba16[8..16]);
}

#[test]
fn grey_color_key() {
    let path = write_fixture("key", 3, 1, png::ColorType::Grayscale, png::BitDepth::Eight, None, Some(&[0, 7]), &[7, 8, 7]);
    let mut ga = [0u8; 6];
    read_image(&path, &mut ga, 3, 1, 8, ColorType::GREY_ALPHA, 0).unwrap();
    let mut grey = [0u8; 3];
    read_image(&path, &mut grey, 3, 1, 8, ColorType::GREY, 0).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!([7, 0, 8, 255, 7, 0], ga);
    assert_eq!([7, 8, 7], grey);
}

#[test]
fn interlaced_is_inspected_but_not_read() {
    let path = write_fixture("adam7", 4, 4, png::ColorType::Rgb, png::BitDepth::Eight, None, None, &[9; 48]);
    mark_interlaced(&path);
    let info = inspect(&path);
    let mut buf = [0; 48];
    let res = read_image(&path, &mut buf, 4, 4, 8, ColorType::RGB, 0);
    let _ = std::fs::remove_file(&path);

    assert!(info.unwrap().interlaced);
    assert_eq!(Err(Error::CodecFault), res);
}

#[test]
fn zero_sized_header() {
    let file = write_image_memory(&[1, 2, 3], 1, 1, 8, ColorType::RGB, 0).unwrap();
    assert_eq!(b"IHDR", &file[12..16]);

    let mut zero_width = file.clone();
    zero_width[16..20].copy_from_slice(&0u32.to_be_bytes());
    fix_ihdr_crc(&mut zero_width);
    assert_eq!(Err(Error::InvalidDimensions), inspect_memory(&zero_width));
    let mut buf = [0; 3];
    assert_eq!(Err(Error::InvalidDimensions), read_image_memory(&zero_width, &mut buf, 1, 1, 8, ColorType::RGB, 0));

    let mut zero_height = file;
    zero_height[20..24].copy_from_slice(&0u32.to_be_bytes());
    fix_ihdr_crc(&mut zero_height);
    assert_eq!(Err(Error::InvalidDimensions), inspect_memory(&zero_height));

    // too short to hold a header
    assert_eq!(Err(Error::CodecFault), inspect_memory(&zero_height[..20]));
}

#[test]
fn truncated() {
    let path = temp_png("truncated");
    let mut pixels = vec![0u8; 64 * 64 * 3];
    for (i, px) in pixels.iter_mut().enumerate() {
        *px = ((i ^ (13 + i * 17) ^ (i * 13) ^ (i / 113 * 11)) >> 5) as u8;
    }
    write_image(&path, &pixels, 64, 64, 8, ColorType::RGB, 0).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    data.truncate(data.len() / 2);
    std::fs::write(&path, &data).unwrap();
    let mut buf = vec![0; 64 * 64 * 3];
    let res = read_image(&path, &mut buf, 64, 64, 8, ColorType::RGB, 0);
    let _ = std::fs::remove_file(&path);
    assert_eq!(Err(Error::CodecFault), res);
}

#[test]
fn stride_into_atlas() {
    // two 2x2 RGB images side by side in a 4x2 atlas
    let left = [1u8, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
    let right = [5u8, 5, 5, 6, 6, 6, 7, 7, 7, 8, 8, 8];
    let lp = temp_png("atlas-left");
    let rp = temp_png("atlas-right");
    write_image(&lp, &left, 2, 2, 8, ColorType::RGB, DEFAULT_ROW_STRIDE).unwrap();
    write_image(&rp, &right, 2, 2, 8, ColorType::RGB, DEFAULT_ROW_STRIDE).unwrap();

    let stride = row_stride(4, ColorType::RGB, 8, DEFAULT_ROW_STRIDE).unwrap();
    assert_eq!(12, row_stride(2, ColorType::RGB, 8, stride).unwrap());
    let mut atlas = [0u8; 24];
    read_image(&lp, &mut atlas, 2, 2, 8, ColorType::RGB, stride).unwrap();
    read_image(&rp, &mut atlas[6..], 2, 2, 8, ColorType::RGB, stride).unwrap();
    let _ = std::fs::remove_file(&lp);
    let _ = std::fs::remove_file(&rp);

    assert_eq!([1, 1, 1, 2, 2, 2, 5, 5, 5, 6, 6, 6, 3, 3, 3, 4, 4, 4, 7, 7, 7, 8, 8, 8], atlas);
}

#[test]
fn strided_write() {
    let path = temp_png("strided-write");
    let padded = [10u8, 20, 99, 99, 30, 40];
    write_image(&path, &padded, 2, 2, 8, ColorType::GREY, 4).unwrap();
    let (_, packed) = read_image_vec(&path, ColorType::GREY, 8).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(vec![10, 20, 30, 40], packed);
}

#[test]
fn typed_bitmaps() {
    let path = temp_png("typed");
    write_image(&path, &[10u8, 20, 30, 40, 50, 60, 70, 80], 2, 1, 8, ColorType::RGBA, 0).unwrap();
    let rgba = decode32_file(&path).unwrap();
    let rgb = decode24_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!((2, 1), (rgba.width, rgba.height));
    assert_eq!(vec![RGBA::new(10, 20, 30, 40), RGBA::new(50, 60, 70, 80)], rgba.buffer);
    assert_eq!(vec![RGB::new(10, 20, 30), RGB::new(50, 60, 70)], rgb.buffer);
}

#[test]
fn error_table() {
    assert_eq!(10, ErrorCode::COUNT);
    assert_eq!("no error has occurred", error_text(ErrorCode::NONE));
    assert_eq!("codec reported an internal error", error_text(Error::CodecFault.code()));
    assert_eq!(ErrorCode(9), ErrorCode::from(Error::InvalidDimensions));
    assert_eq!(["Palette", "G", "GA", "RGB", "RGBA"], COLOR_NAMES);
    assert_eq!("GA", ColorType::GREY_ALPHA.name());
}

#[test]
fn grey_helpers() {
    assert_eq!(255, gray_from_rgb8(255, 255, 255));
    assert_eq!(0, gray_from_rgb8(0, 0, 0));
    assert_eq!(54, gray_from_rgb8(255, 0, 0));
    assert_eq!(65535, gray_from_rgb16(65535, 65535, 65535));
}

use pngw::*;

#[test]
fn roundtrip_grey() {
    roundtrip_color(ColorType::GREY, &[8, 16]);
}

#[test]
fn roundtrip_rgb() {
    roundtrip_color(ColorType::RGB, &[8, 16]);
}

#[test]
fn roundtrip_rgba() {
    roundtrip_color(ColorType::RGBA, &[8, 16]);
}

#[test]
fn roundtrip_grey_alpha() {
    roundtrip_color(ColorType::GREY_ALPHA, &[8, 16]);
}

#[track_caller]
fn roundtrip_color(colortype: ColorType, bitdepths: &[u32]) {
    let filter_strategies = [FilterStrategy::ZERO, FilterStrategy::SUB, FilterStrategy::UP, FilterStrategy::AVG, FilterStrategy::PAETH, FilterStrategy::ADAPTIVE];
    let mut n = 0;
    let mut data = vec![0; 64 * 64 * 8 + 64 * 7];
    for &bitdepth in bitdepths {
        for width in [1, 2, 3, 7, 16, 17, 64] {
            randomize(&mut data);
            for height in [1, 2, 5, 16, 64] {
                for padding in [0, 1, 7] {
                    n += 1;
                    roundtrip_data(&data, width, height, padding, colortype, bitdepth, filter_strategies[n % filter_strategies.len()]);
                }
            }
        }
    }
}

fn randomize(data: &mut [u8]) {
    let mut seed = u32::from(data[0]);
    for b in data {
        seed = 1103515245u32.wrapping_mul(seed).wrapping_add(12345);
        *b ^= (seed >> 17) as u8;
    }
}

#[track_caller]
fn roundtrip_data(data: &[u8], width: usize, height: usize, padding: usize, colortype: ColorType, bitdepth: u32, filter_strategy: FilterStrategy) {
    let row_bytes = row_stride(width, colortype, bitdepth, DEFAULT_ROW_STRIDE).unwrap();
    let stride = if padding == 0 { DEFAULT_ROW_STRIDE } else { row_bytes + padding };
    let len = (height - 1) * row_stride(width, colortype, bitdepth, stride).unwrap() + row_bytes;
    let data = &data[..len];
    let format = PixelFormat::new(colortype, bitdepth);

    let mut encoder = Encoder::new();
    encoder.settings.filter_strategy = filter_strategy;
    let file = encoder.encode(data, width, height, format, stride).unwrap();

    let info = inspect_memory(&file).unwrap();
    assert_eq!((width, height), (info.width, info.height));
    assert_eq!(format, info.format);

    let mut out = vec![0; len];
    read_image_memory(&file, &mut out, width, height, bitdepth, colortype, stride).unwrap();
    let stride = row_stride(width, colortype, bitdepth, stride).unwrap();
    for (y, (a, b)) in data.chunks(stride).zip(out.chunks(stride)).enumerate() {
        assert_eq!(&a[..row_bytes], &b[..row_bytes], "row {} of {}x{} {:?}/{}", y, width, height, colortype, bitdepth);
    }
}

#[test]
fn rgb_gains_opaque_alpha() {
    let rgb: Vec<u8> = (0..5 * 3 * 3).map(|i| (i * 7) as u8).collect();
    let file = write_image_memory(&rgb, 5, 3, 8, ColorType::RGB, 0).unwrap();
    let mut rgba = vec![0; 5 * 3 * 4];
    read_image_memory(&file, &mut rgba, 5, 3, 8, ColorType::RGBA, 0).unwrap();
    for (src, dst) in rgb.chunks(3).zip(rgba.chunks(4)) {
        assert_eq!(src, &dst[..3]);
        assert_eq!(255, dst[3]);
    }
}

#[test]
fn rgba16_to_grey8() {
    let rgba: Vec<u8> = (0..4 * 2 * 8).map(|i| (i * 37 + 11) as u8).collect();
    let file = write_image_memory(&rgba, 4, 2, 16, ColorType::RGBA, 0).unwrap();
    let mut grey = vec![0; 4 * 2];
    read_image_memory(&file, &mut grey, 4, 2, 8, ColorType::GREY, 0).unwrap();
    for (px, &g) in rgba.chunks(8).zip(&grey) {
        let narrow = |hi: u8, lo: u8| ((u32::from(u16::from_be_bytes([hi, lo])) * 255 + 32767) / 65535) as u8;
        assert_eq!(gray_from_rgb8(narrow(px[0], px[1]), narrow(px[2], px[3]), narrow(px[4], px[5])), g);
    }
}

#[test]
fn grey_widens_to_16() {
    let grey = [0u8, 1, 128, 255];
    let file = write_image_memory(&grey, 4, 1, 8, ColorType::GREY, 0).unwrap();
    let mut wide = [0u8; 4 * 6];
    read_image_memory(&file, &mut wide, 4, 1, 16, ColorType::RGB, 0).unwrap();
    for (&g, px) in grey.iter().zip(wide.chunks(6)) {
        assert_eq!(&[g, g, g, g, g, g], px);
    }
}

#![feature(test)]
use pngw::{ColorType, Encoder, FilterStrategy, PixelFormat};

extern crate test;

#[bench]
fn roundtrip(bencher: &mut test::Bencher) {
    let mut data = vec![0u8; 640*480*3];
    for (i, px) in data.iter_mut().enumerate() {
        *px = ((i ^ (13 + i * 17) ^ (i * 13) ^ (i/113 * 11)) >> 5) as u8;
    }
    let mut out = vec![0u8; 640*480*4];
    bencher.bytes = data.len() as _;
    bencher.iter(|| {
        let res = pngw::write_image_memory(&data, 640, 480, 8, ColorType::RGB, 0).unwrap();
        pngw::read_image_memory(&res, &mut out, 640, 480, 8, ColorType::RGBA, 0)
    });
}

#[bench]
fn decode_filter_0(bencher: &mut test::Bencher) {
    decode_rgb(bencher, FilterStrategy::ZERO);
}

#[bench]
fn decode_filter_1(bencher: &mut test::Bencher) {
    decode_rgb(bencher, FilterStrategy::SUB);
}

#[bench]
fn decode_filter_3(bencher: &mut test::Bencher) {
    decode_rgb(bencher, FilterStrategy::AVG);
}

#[bench]
fn decode_filter_4(bencher: &mut test::Bencher) {
    decode_rgb(bencher, FilterStrategy::PAETH);
}

#[bench]
fn decode_to_grey16(bencher: &mut test::Bencher) {
    let res = test_png_with_filter(FilterStrategy::ADAPTIVE);
    let mut out = vec![0u8; 640*480*2];
    bencher.bytes = res.len() as _;
    bencher.iter(|| {
        pngw::read_image_memory(&res, &mut out, 640, 480, 16, ColorType::GREY, 0)
    });
}

fn decode_rgb(bencher: &mut test::Bencher, filter: FilterStrategy) {
    let res = test_png_with_filter(filter);
    let mut out = vec![0u8; 640*480*3];
    bencher.bytes = res.len() as _;
    bencher.iter(|| {
        pngw::read_image_memory(&res, &mut out, 640, 480, 8, ColorType::RGB, 0)
    });
}

fn test_png_with_filter(filter: FilterStrategy) -> Vec<u8> {
    let mut data = vec![0u8; 640*480*3];
    for (i, px) in data.iter_mut().enumerate() {
        *px = ((i ^ (13 + i * 81) ^ (i * 3) ^ (i/113 * 11)) >> 7) as u8;
    }
    let mut encoder = Encoder::new();
    encoder.settings.filter_strategy = filter;
    encoder.encode(&data, 640, 480, PixelFormat::new(ColorType::RGB, 8), 0).unwrap()
}

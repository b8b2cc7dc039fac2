#![no_main]
#[macro_use] extern crate libfuzzer_sys;

use pngw::ColorType;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let (seed, data) = data.split_at(3);
    let colortype = match seed[1] % 4 {
        0 => ColorType::GREY,
        1 => ColorType::GREY_ALPHA,
        2 => ColorType::RGB,
        _ => ColorType::RGBA,
    };
    let bitdepth = if seed[1] & 4 != 0 { 16 } else { 8 };
    let padding = usize::from(seed[2] % 8);
    let bytes_per_pixel = colortype.channels() as usize * bitdepth as usize / 8;

    let width = (seed[0] as usize).max(1).min(data.len() / bytes_per_pixel);
    if width < 1 {
        return;
    }
    let row_bytes = width * bytes_per_pixel;
    let stride = if padding == 0 { 0 } else { row_bytes + padding };
    let height = (data.len() + padding) / (row_bytes + padding);
    let len = (height - 1) * (row_bytes + padding) + row_bytes;
    let data = &data[..len];

    let file = pngw::write_image_memory(data, width, height, bitdepth, colortype, stride).unwrap();
    let info = pngw::inspect_memory(&file).unwrap();
    assert_eq!((width, height), (info.width, info.height));

    let mut out = vec![0; len];
    pngw::read_image_memory(&file, &mut out, width, height, bitdepth, colortype, stride).unwrap();
    for (a, b) in data.chunks(row_bytes + padding).zip(out.chunks(row_bytes + padding)) {
        assert_eq!(&a[..row_bytes], &b[..row_bytes]);
    }
});

#![no_main]
#[macro_use] extern crate libfuzzer_sys;

use pngw::{ColorType, Decoder};

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new();
    decoder.settings.max_alloc = 16 << 20;
    let info = match decoder.inspect(data) {
        Ok(info) => info,
        Err(_) => return,
    };
    for colortype in [ColorType::GREY, ColorType::GREY_ALPHA, ColorType::RGB, ColorType::RGBA] {
        for bitdepth in [8, 16] {
            let size = match pngw::compute_buffer_size(info.width, info.height, bitdepth, colortype) {
                Ok(size) if size <= 16 << 20 => size,
                _ => return,
            };
            let mut buf = vec![0; size];
            let _ = pngw::read_image_memory(data, &mut buf, info.width, info.height, bitdepth, colortype, 0);
        }
    }
});

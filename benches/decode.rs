use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gifread::Decoder;
use std::io::Cursor;

/// Build a three-frame 2x2 animation in memory
fn animation() -> Vec<u8> {
    let screen = [
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00, 0x81,
        0x00, 0x00, // 2x2, 4-entry global color table
        0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00,
        0xFF,
    ];
    let control = [0x21, 0xF9, 0x04, 0x04, 0x0A, 0x00, 0x00, 0x00];
    let image = [
        0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00, 0x02,
        0x03, 0x44, 0x34, 0x05, 0x00,
    ];
    let mut gif = screen.to_vec();
    for _ in 0..3 {
        gif.extend_from_slice(&control);
        gif.extend_from_slice(&image);
    }
    gif.push(0x3B);
    gif
}

fn decode_frames(c: &mut Criterion) {
    let gif = animation();
    c.bench_function("decode_frames", |b| {
        b.iter(|| {
            let decoder = Decoder::new(Cursor::new(black_box(&gif)));
            let mut reader = decoder.open().unwrap();
            while let Ok(Some(frame)) = reader.next_frame() {
                black_box(frame);
            }
        })
    });
}

fn decode_rendered(c: &mut Criterion) {
    let gif = animation();
    c.bench_function("decode_rendered", |b| {
        b.iter(|| {
            let decoder =
                Decoder::new(Cursor::new(black_box(&gif))).rendered(true);
            let mut reader = decoder.open().unwrap();
            while let Ok(Some(frame)) = reader.next_frame() {
                black_box(frame);
            }
        })
    });
}

criterion_group!(benches, decode_frames, decode_rendered);
criterion_main!(benches);

//! Benchmarks for the frame diff and ANSI encoding paths.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use weft_core::segment::WidthMethod;
use weft_core::style::Attributes;
use weft_core::terminal::ColorSupport;
use weft_core::{CellBuffer, Renderer, Rgba};

fn filled_buffer(width: u16, height: u16, seed: u16) -> CellBuffer {
    let mut buf = CellBuffer::new(width, height, Rgba::BLACK, WidthMethod::WcWidth);
    for y in 0..height {
        let shade = f32::from((y + seed) % 8) / 8.0;
        let fg = Rgba::rgb(1.0 - shade, shade, 0.5);
        let line: String = (0..width)
            .map(|x| char::from(b'a' + ((x + y + seed) % 26) as u8))
            .collect();
        buf.draw_text(&line, 0, i32::from(y), fg, None, Attributes::empty());
    }
    buf
}

fn bench_diff(c: &mut Criterion) {
    let current = filled_buffer(120, 40, 1);
    let previous = filled_buffer(120, 40, 0);
    c.bench_function("diff_120x40_full_change", |b| {
        b.iter(|| black_box(current.diff(black_box(&previous))));
    });

    let same = current.clone();
    c.bench_function("diff_120x40_no_change", |b| {
        b.iter(|| black_box(current.diff(black_box(&same))));
    });
}

fn bench_encode(c: &mut Criterion) {
    let current = filled_buffer(120, 40, 1);
    let previous = filled_buffer(120, 40, 0);
    let changes = current.diff(&previous);
    let renderer = Renderer::new(ColorSupport::TrueColor, false);
    c.bench_function("encode_120x40_truecolor", |b| {
        b.iter(|| black_box(renderer.render(black_box(&changes))));
    });

    let renderer256 = Renderer::new(ColorSupport::Extended256, false);
    c.bench_function("encode_120x40_256color", |b| {
        b.iter(|| black_box(renderer256.render(black_box(&changes))));
    });
}

criterion_group!(benches, bench_diff, bench_encode);
criterion_main!(benches);

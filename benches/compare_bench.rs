//! Benchmarks for the image comparison routines
//!
//! Run with: cargo bench --bench compare_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use std::hint::black_box;
use the_ark::capture::crop_and_stitch;
use the_ark::compare::{compare_image, image_difference};

fn capture(width: u32, height: u32, shift: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([((x + shift) % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn bench_compare_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_image");

    for (width, height) in [(320, 240), (1280, 800), (1280, 3000)].iter() {
        let baseline = capture(*width, *height, 0);
        let candidate = capture(*width, *height, 1);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(baseline, candidate),
            |b, (baseline, candidate)| {
                b.iter(|| compare_image(black_box(baseline), black_box(candidate)).expect("Compare failed"));
            },
        );
    }

    group.finish();
}

fn bench_image_difference(c: &mut Criterion) {
    let baseline = capture(1280, 800, 0);
    let candidate = capture(1280, 800, 3);

    c.bench_function("image_difference_1280x800", |b| {
        b.iter(|| image_difference(black_box(&baseline), black_box(&candidate)));
    });
}

fn bench_stitch(c: &mut Criterion) {
    let page = capture(1280, 1400, 0);
    let header = page.crop_imm(0, 0, 1280, 800);
    let footer = page.crop_imm(0, 600, 1280, 800);

    c.bench_function("crop_and_stitch_1280x1400", |b| {
        b.iter(|| crop_and_stitch(black_box(&header), black_box(&footer)).expect("Stitch failed"));
    });
}

criterion_group!(benches, bench_compare_image, bench_image_difference, bench_stitch);
criterion_main!(benches);

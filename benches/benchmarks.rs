use std::fmt;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zoomscale::{
    resample, zoom_resample, zoom_resample_parallel, AlphaMode, Filter, FloatRect, Image,
    ResamplePool, Res,
};

#[derive(Clone, Copy)]
struct Remap(Res, Res);

impl fmt::Display for Remap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.0, self.1)
    }
}

static REMAPS: &[Remap] = &[
    Remap(Res { w: 3840, h: 2160 }, Res { w: 1920, h: 1080 }),
    Remap(Res { w: 1000, h: 500 }, Res { w: 1920, h: 1080 }),
    Remap(Res { w: 900, h: 900 }, Res { w: 600, h: 600 }),
];

static FILTERS: &[Filter] = &[
    Filter::Box,
    Filter::Linear,
    Filter::Bicubic,
    Filter::Mine,
    Filter::Lanczos,
    Filter::BSpline,
];

fn noise(res: Res) -> Image {
    let mut rng = StdRng::seed_from_u64(0xbe9c);
    let mut img = Image::new(res);
    for y in 0..res.h {
        for x in 0..res.w {
            img.put_pixel(x, y, [rng.gen(), rng.gen(), rng.gen(), rng.gen()]);
        }
    }
    img
}

fn benchmark_filters(c: &mut Criterion) {
    // RUST_LOG=trace surfaces the per-call timing traces.
    let _ = env_logger::try_init();

    let mut group = c.benchmark_group("filters_serial");
    group.sample_size(20);

    let remap = REMAPS[0];
    let src = noise(remap.0);
    let mut dst = Image::new(remap.1);

    for filter in FILTERS {
        group.bench_with_input(BenchmarkId::from_parameter(filter), filter, |b, &filter| {
            b.iter_custom(|iters| {
                let mut total = Duration::from_secs(0);

                for _i in 0..iters {
                    let start = Instant::now();
                    resample(
                        remap.1.w as i32,
                        remap.1.h as i32,
                        &src,
                        &mut dst,
                        filter,
                        0.0,
                        false,
                        AlphaMode::Ignore,
                    )
                    .unwrap();

                    total += start.elapsed();
                }
                total
            })
        });
    }
}

fn benchmark_serial_vs_parallel(c: &mut Criterion) {
    let pool = ResamplePool::new(0);

    for (name, parallel) in [("serial", false), ("parallel", true)] {
        let mut group = c.benchmark_group(format!("lanczos_{name}"));
        group.sample_size(20);
        group.sampling_mode(SamplingMode::Flat);

        for remap in REMAPS {
            let src = noise(remap.0);
            let mut dst = Image::new(remap.1);

            group.bench_with_input(BenchmarkId::from_parameter(*remap), remap, |b, remap| {
                b.iter_custom(|iters| {
                    let mut total = Duration::from_secs(0);

                    for _i in 0..iters {
                        let start = Instant::now();
                        if parallel {
                            zoom_resample_parallel(
                                remap.1.w as i32,
                                remap.1.h as i32,
                                &src,
                                &mut dst,
                                FloatRect::full(remap.0),
                                Filter::Lanczos,
                                0.0,
                                AlphaMode::Ignore,
                                Some(&pool),
                            )
                            .unwrap();
                        } else {
                            zoom_resample(
                                remap.1.w as i32,
                                remap.1.h as i32,
                                &src,
                                &mut dst,
                                FloatRect::full(remap.0),
                                Filter::Lanczos,
                                0.0,
                                AlphaMode::Ignore,
                            )
                            .unwrap();
                        }

                        total += start.elapsed();
                    }
                    total
                })
            });
        }
    }
}

fn benchmark_alpha_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("alpha_modes");
    group.sample_size(20);

    let remap = REMAPS[2];
    let src = noise(remap.0);
    let mut dst = Image::new(remap.1);

    for mode in [AlphaMode::Independent, AlphaMode::PreMultiply, AlphaMode::Ignore] {
        group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |b, &mode| {
            b.iter_custom(|iters| {
                let mut total = Duration::from_secs(0);

                for _i in 0..iters {
                    let start = Instant::now();
                    resample(
                        remap.1.w as i32,
                        remap.1.h as i32,
                        &src,
                        &mut dst,
                        Filter::Bicubic,
                        0.0,
                        false,
                        mode,
                    )
                    .unwrap();

                    total += start.elapsed();
                }
                total
            })
        });
    }
}

fn benchmark_zoom_pan_frames(c: &mut Criterion) {
    // One frame of an animated zoom at a sub-pixel rectangle, the hot loop of
    // an interactive viewer. The rectangle advances between iterations so no
    // two frames hit identical weight tables; only the resample is timed.
    let mut group = c.benchmark_group("zoom_pan_frame");
    group.sample_size(30);

    let src = noise(Res { w: 1000, h: 500 });
    let mut dst = Image::new(Res { w: 1280, h: 720 });
    let start_rect = FloatRect::full(src.res());
    let end_rect = FloatRect::new(300.5, 150.25, 600.5, 300.25);
    let pool = ResamplePool::new(0);

    let mut t = 0.0;
    group.bench_function("lanczos_parallel", |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::from_secs(0);

            for _i in 0..iters {
                t += 1.0 / 240.0;
                if t > 1.0 {
                    t = 0.0;
                }
                let rect = start_rect.lerp(end_rect, t);

                let start = Instant::now();
                zoom_resample_parallel(
                    1280,
                    720,
                    &src,
                    &mut dst,
                    rect,
                    Filter::Lanczos,
                    0.0,
                    AlphaMode::Ignore,
                    Some(&pool),
                )
                .unwrap();

                total += start.elapsed();
            }
            total
        })
    });
}

criterion_group!(
    benches,
    benchmark_filters,
    benchmark_serial_vs_parallel,
    benchmark_alpha_modes,
    benchmark_zoom_pan_frames
);
criterion_main!(benches);

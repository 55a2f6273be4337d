//! Separable BGRA resampling with floating-point zoom/pan rectangles.
//!
//! The resampler maps a sub-rectangle of the source (which may start and end
//! between pixels) onto the whole target. Weight tables are built once per
//! call, rows are produced by a two-pass fixed-point accumulator, and the
//! parallel entry point fans tiles of the target out over a
//! [`ResamplePool`](crate::ResamplePool).

use std::time::Instant;

use derive_more::Display;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

pub use self::filters::Filter;
use self::contrib::{make_contributors, Contributor};
use self::rows::{process_row, AlphaPolicy, Cell};
use crate::com::image::BYTES_PER_PIXEL;
use crate::pools::default_pool;
use crate::{Error, FloatRect, Image, ResamplePool, Res, Result};

mod contrib;
mod filters;
mod rows;

/// Targets wider than this are split into vertical tile columns when enough
/// workers are available.
const CHUNK_WIDTH: usize = 720;
/// Minimum rows per horizontal band.
const CHUNK_HEIGHT: usize = 8;

/// How the alpha channel participates in resampling.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    /// All four channels are filtered independently. Correct for opaque
    /// images and for alpha-as-data.
    Independent,

    /// RGB is weighted by alpha while accumulating, so fully transparent
    /// pixels cannot bleed color into their neighbors. Required for correct
    /// blending of translucent sources.
    PreMultiply,

    /// Alpha is not read at all and the target is written fully opaque.
    /// The cheapest mode.
    Ignore,
}

impl AlphaMode {
    const fn precision(self) -> i32 {
        match self {
            Self::Independent | Self::Ignore => rows::PREC_HIGH,
            Self::PreMultiply => rows::PREC_LOW,
        }
    }
}

/// Remaps the full source image onto a `new_w`/`new_h` target.
///
/// `radius` overrides the filter's support in source pixels; 0 selects the
/// filter's default. The target is (re)sized before writing. With `parallel`
/// the work runs on the default [`ResamplePool`](crate::ResamplePool).
#[allow(clippy::too_many_arguments)]
pub fn resample(
    new_w: i32,
    new_h: i32,
    src: &Image,
    dst: &mut Image,
    filter: Filter,
    radius: f32,
    parallel: bool,
    alpha: AlphaMode,
) -> Result<()> {
    let rect = FloatRect::full(src.res());
    if parallel {
        zoom_resample_parallel(new_w, new_h, src, dst, rect, filter, radius, alpha, None)
    } else {
        zoom_resample(new_w, new_h, src, dst, rect, filter, radius, alpha)
    }
}

/// Resamples `src_rect` (in source pixel coordinates, fractional edges
/// allowed) onto the whole target, on the calling thread.
///
/// Parts of the rectangle outside the source repeat the edge pixels; only a
/// rectangle entirely outside is an error. The target is (re)sized to
/// `new_w`/`new_h` before writing and every target pixel is written exactly
/// once. On error the target contents are unspecified.
#[allow(clippy::too_many_arguments)]
pub fn zoom_resample(
    new_w: i32,
    new_h: i32,
    src: &Image,
    dst: &mut Image,
    src_rect: FloatRect,
    filter: Filter,
    radius: f32,
    alpha: AlphaMode,
) -> Result<()> {
    let target = validate(new_w, new_h, src, src_rect)?;
    let start = Instant::now();

    let plan = Plan::build(src.res(), target, src_rect, filter, radius, alpha);
    dst.ensure_size(target);

    match alpha {
        AlphaMode::Independent => run_serial::<rows::Independent>(src, &plan, dst),
        AlphaMode::PreMultiply => run_serial::<rows::PreMultiply>(src, &plan, dst),
        AlphaMode::Ignore => run_serial::<rows::Ignore>(src, &plan, dst),
    }

    trace!("Resampled {:?} -> {target:?} serially in {:?}", src.res(), start.elapsed());
    Ok(())
}

/// [`zoom_resample`], fanned out over a worker pool.
///
/// `None` uses the lazily-initialized process-wide default pool. Output is
/// bit-identical to the serial entry point. Must not be called from a job
/// already running on the same pool; see
/// [`ResamplePool`](crate::ResamplePool).
#[allow(clippy::too_many_arguments)]
pub fn zoom_resample_parallel(
    new_w: i32,
    new_h: i32,
    src: &Image,
    dst: &mut Image,
    src_rect: FloatRect,
    filter: Filter,
    radius: f32,
    alpha: AlphaMode,
    pool: Option<&ResamplePool>,
) -> Result<()> {
    let target = validate(new_w, new_h, src, src_rect)?;
    let start = Instant::now();

    let plan = Plan::build(src.res(), target, src_rect, filter, radius, alpha);
    dst.ensure_size(target);

    let pool = pool.unwrap_or(default_pool());
    match alpha {
        AlphaMode::Independent => run_parallel::<rows::Independent>(src, &plan, dst, pool),
        AlphaMode::PreMultiply => run_parallel::<rows::PreMultiply>(src, &plan, dst, pool),
        AlphaMode::Ignore => run_parallel::<rows::Ignore>(src, &plan, dst, pool),
    }

    trace!(
        "Resampled {:?} -> {target:?} on {} workers in {:?}",
        src.res(),
        pool.threads(),
        start.elapsed()
    );
    Ok(())
}

fn validate(new_w: i32, new_h: i32, src: &Image, rect: FloatRect) -> Result<Res> {
    if new_w <= 0 || new_h <= 0 {
        return Err(Error::InvalidTargetSize { w: new_w, h: new_h });
    }
    if src.res().is_zero_area() {
        return Err(Error::EmptySource);
    }
    if rect.is_degenerate() || !rect.overlaps(src.res()) {
        return Err(Error::InvalidSourceRect(rect));
    }

    Ok(Res { w: new_w as u32, h: new_h as u32 })
}

/// The per-call immutable state: one contributor table per axis, shared
/// read-only by every tile job.
struct Plan {
    x: Vec<Contributor>,
    y: Vec<Contributor>,
}

impl Plan {
    fn build(
        source: Res,
        target: Res,
        rect: FloatRect,
        filter: Filter,
        radius: f32,
        alpha: AlphaMode,
    ) -> Self {
        let radius = if radius <= 0.0 { filter.default_radius() } else { radius as f64 };
        let prec = alpha.precision();

        Self {
            x: make_contributors(
                radius,
                source.w as i32,
                target.w as i32,
                rect.left,
                rect.width(),
                filter,
                prec,
            ),
            y: make_contributors(
                radius,
                source.h as i32,
                target.h as i32,
                rect.top,
                rect.height(),
                filter,
                prec,
            ),
        }
    }
}

/// One rectangular region of the target assigned to a single job, with
/// inclusive bounds.
#[derive(Debug, Clone, Copy)]
struct Band {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

fn run_serial<A: AlphaPolicy>(src: &Image, plan: &Plan, dst: &mut Image) {
    let target = dst.res();
    let band = Band { x0: 0, x1: target.w as usize - 1, y0: 0, y1: target.h as usize - 1 };
    let rows: Vec<&mut [u8]> = dst.rows_mut().collect();

    process_band::<A>(src, plan, band, rows);
}

fn run_parallel<A: AlphaPolicy>(src: &Image, plan: &Plan, dst: &mut Image, pool: &ResamplePool) {
    let (x_ranges, y_ranges) = partition(dst.res(), pool.threads());
    if x_ranges.len() * y_ranges.len() == 1 {
        return run_serial::<A>(src, plan, dst);
    }

    let jobs = split_target(dst, &x_ranges, &y_ranges);

    pool.install(|| {
        jobs.into_par_iter().for_each(|(band, rows)| process_band::<A>(src, plan, band, rows));
    });
}

/// Processes one band: a private accumulator cache sized to the band's source
/// column span, reused across its rows.
fn process_band<A: AlphaPolicy>(src: &Image, plan: &Plan, band: Band, mut rows: Vec<&mut [u8]>) {
    let xcontribs = &plan.x[band.x0..=band.x1];

    // Contributor edges are monotonic, so the extremal contributors bound the
    // band's source span.
    let xmin_source = xcontribs[0].min;
    let last = &xcontribs[xcontribs.len() - 1];
    let span = (last.min + last.high - xmin_source + 1) as usize;
    let mut cache = vec![Cell::default(); span];

    for (y, out_row) in (band.y0..=band.y1).zip(rows.iter_mut()) {
        process_row::<A>(src, &plan.y[y], xcontribs, xmin_source, &mut cache, out_row);
    }
}

/// Splits the target into a grid of tile jobs for `workers` workers.
///
/// Wide targets get up to `workers / 4` tile columns (at least 720 output
/// pixels each); rows are then banded over the workers left over. Small
/// targets still get two bands so a pool of hot workers overlaps with the
/// driver.
fn partition(target: Res, workers: usize) -> (Vec<(usize, usize)>, Vec<(usize, usize)>) {
    let (w, h) = (target.w as usize, target.h as usize);

    // The validated target always has w >= 1, so x_chunks <= w holds already;
    // only the band count needs clamping to the row count (a 1-pixel-tall
    // target cannot carry the two-band minimum).
    let x_chunks = (w / CHUNK_WIDTH).min(workers / 4).max(1);
    let y_chunks = (h / CHUNK_HEIGHT).min(workers / x_chunks).max(2).min(h);

    (ranges(w, x_chunks), ranges(h, y_chunks))
}

/// Divides `[0, len)` into `chunks` contiguous inclusive ranges, the remainder
/// spread over the leading ranges. `chunks` must not exceed `len`.
fn ranges(len: usize, chunks: usize) -> Vec<(usize, usize)> {
    let base = len / chunks;
    let extra = len % chunks;

    let mut out = Vec::with_capacity(chunks);
    let mut start = 0;
    for i in 0..chunks {
        let size = base + usize::from(i < extra);
        out.push((start, start + size - 1));
        start += size;
    }

    out
}

/// Carves the target into per-tile row segments.
///
/// Every returned byte slice is disjoint, so tile jobs can run on any threads
/// without synchronizing; together they cover every target pixel exactly once.
fn split_target<'a>(
    dst: &'a mut Image,
    x_ranges: &[(usize, usize)],
    y_ranges: &[(usize, usize)],
) -> Vec<(Band, Vec<&'a mut [u8]>)> {
    let mut jobs: Vec<(Band, Vec<&'a mut [u8]>)> = y_ranges
        .iter()
        .flat_map(|&(y0, y1)| {
            x_ranges.iter().map(move |&(x0, x1)| {
                (Band { x0, x1, y0, y1 }, Vec::with_capacity(y1 - y0 + 1))
            })
        })
        .collect();

    let x_chunks = x_ranges.len();
    let mut yi = 0;
    for (y, row) in dst.rows_mut().enumerate() {
        if y > y_ranges[yi].1 {
            yi += 1;
        }

        let mut rest = row;
        for (xi, &(x0, x1)) in x_ranges.iter().enumerate() {
            let (seg, tail) = std::mem::take(&mut rest).split_at_mut((x1 - x0 + 1) * BYTES_PER_PIXEL);
            jobs[yi * x_chunks + xi].1.push(seg);
            rest = tail;
        }
    }

    jobs
}

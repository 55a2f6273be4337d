// The separable two-pass accumulator.
//
// For one target row, the vertical pass collapses the filter's row footprint
// into a cache of per-column fixed-point sums, then the horizontal pass folds
// each output pixel's column footprint out of that cache. Everything stays in
// i32: weights are at most 11 bits, channels 8 bits, so two weighted passes
// peak below 2^30.
//
// The alpha-channel semantics differ per mode in every step, so each mode is a
// zero-sized policy type and the row loops are monomorphized over it. The
// dispatch happens once per tile, never per pixel.

use super::contrib::Contributor;
use crate::com::image::BYTES_PER_PIXEL;
use crate::Image;

/// Precision unit for Independent and Ignore.
pub(crate) const PREC_HIGH: i32 = 0x800;
/// Precision unit for PreMultiply; see that policy for why it is smaller.
pub(crate) const PREC_LOW: i32 = 0x100;

/// Reserves headroom for the alpha multiplication in [`PreMultiply`].
const PREMULT_DIV: i32 = 4;

/// Wide per-column accumulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cell {
    pub b: i32,
    pub g: i32,
    pub r: i32,
    pub a: i32,
}

/// One alpha-channel policy: how source pixels enter the vertical cache, how
/// cache cells enter the horizontal total, and how the total becomes an 8-bit
/// pixel.
pub(crate) trait AlphaPolicy {
    const PRECISION: i32;

    /// Overwrites `cell` with the first vertical contribution.
    fn combine(px: &[u8], w: i32, cell: &mut Cell);

    /// Adds a further vertical contribution to `cell`.
    fn increase(px: &[u8], w: i32, cell: &mut Cell);

    /// Overwrites `total` with the first horizontal contribution.
    fn init_total(cell: &Cell, w: i32, total: &mut Cell);

    /// Adds a further horizontal contribution to `total`.
    fn increase_total(cell: &Cell, w: i32, total: &mut Cell);

    /// Clamps `total` to 8 bits and writes one BGRA pixel.
    fn write(total: &Cell, out: &mut [u8]);
}

/// Normalize a doubly-weighted channel: divide by precision squared with
/// half-unit rounding, then saturate. Negative lobes can push a total below
/// zero and rounding error slightly past 255.
#[inline]
fn clamp22(total: i32) -> u8 {
    (((total.max(0) + 0x1F_FFFF) >> 22) as u32).min(255) as u8
}

/// All four channels resampled independently of each other.
pub(crate) struct Independent;

impl AlphaPolicy for Independent {
    const PRECISION: i32 = PREC_HIGH;

    #[inline]
    fn combine(px: &[u8], w: i32, cell: &mut Cell) {
        cell.b = w * px[0] as i32;
        cell.g = w * px[1] as i32;
        cell.r = w * px[2] as i32;
        cell.a = w * px[3] as i32;
    }

    #[inline]
    fn increase(px: &[u8], w: i32, cell: &mut Cell) {
        cell.b += w * px[0] as i32;
        cell.g += w * px[1] as i32;
        cell.r += w * px[2] as i32;
        cell.a += w * px[3] as i32;
    }

    #[inline]
    fn init_total(cell: &Cell, w: i32, total: &mut Cell) {
        total.b = w * cell.b;
        total.g = w * cell.g;
        total.r = w * cell.r;
        total.a = w * cell.a;
    }

    #[inline]
    fn increase_total(cell: &Cell, w: i32, total: &mut Cell) {
        total.b += w * cell.b;
        total.g += w * cell.g;
        total.r += w * cell.r;
        total.a += w * cell.a;
    }

    #[inline]
    fn write(total: &Cell, out: &mut [u8]) {
        out[0] = clamp22(total.b);
        out[1] = clamp22(total.g);
        out[2] = clamp22(total.r);
        out[3] = clamp22(total.a);
    }
}

/// Alpha is never read; the output is fully opaque.
pub(crate) struct Ignore;

impl AlphaPolicy for Ignore {
    const PRECISION: i32 = PREC_HIGH;

    #[inline]
    fn combine(px: &[u8], w: i32, cell: &mut Cell) {
        cell.b = w * px[0] as i32;
        cell.g = w * px[1] as i32;
        cell.r = w * px[2] as i32;
    }

    #[inline]
    fn increase(px: &[u8], w: i32, cell: &mut Cell) {
        cell.b += w * px[0] as i32;
        cell.g += w * px[1] as i32;
        cell.r += w * px[2] as i32;
    }

    #[inline]
    fn init_total(cell: &Cell, w: i32, total: &mut Cell) {
        total.b = w * cell.b;
        total.g = w * cell.g;
        total.r = w * cell.r;
    }

    #[inline]
    fn increase_total(cell: &Cell, w: i32, total: &mut Cell) {
        total.b += w * cell.b;
        total.g += w * cell.g;
        total.r += w * cell.r;
    }

    #[inline]
    fn write(total: &Cell, out: &mut [u8]) {
        out[0] = clamp22(total.b);
        out[1] = clamp22(total.g);
        out[2] = clamp22(total.r);
        out[3] = 255;
    }
}

/// RGB weighted by alpha during accumulation and divided back out at the end,
/// so fully transparent pixels cannot bleed color into their neighbors.
///
/// The alpha multiplication costs ~8 bits of headroom, hence the smaller
/// precision unit and the extra `/4` on the RGB products: the worst case is
/// `255 * (0x100 * 255 / 4) * 0x100 < 2^30`.
pub(crate) struct PreMultiply;

impl AlphaPolicy for PreMultiply {
    const PRECISION: i32 = PREC_LOW;

    #[inline]
    fn combine(px: &[u8], w: i32, cell: &mut Cell) {
        if px[3] == 0 {
            *cell = Cell::default();
        } else {
            let alpha = w * px[3] as i32;
            cell.b = px[0] as i32 * alpha / PREMULT_DIV;
            cell.g = px[1] as i32 * alpha / PREMULT_DIV;
            cell.r = px[2] as i32 * alpha / PREMULT_DIV;
            cell.a = alpha;
        }
    }

    #[inline]
    fn increase(px: &[u8], w: i32, cell: &mut Cell) {
        if px[3] != 0 {
            let alpha = w * px[3] as i32;
            cell.b += px[0] as i32 * alpha / PREMULT_DIV;
            cell.g += px[1] as i32 * alpha / PREMULT_DIV;
            cell.r += px[2] as i32 * alpha / PREMULT_DIV;
            cell.a += alpha;
        }
    }

    #[inline]
    fn init_total(cell: &Cell, w: i32, total: &mut Cell) {
        if cell.a == 0 {
            *total = Cell::default();
        } else {
            total.b = w * cell.b;
            total.g = w * cell.g;
            total.r = w * cell.r;
            total.a = w * cell.a;
        }
    }

    #[inline]
    fn increase_total(cell: &Cell, w: i32, total: &mut Cell) {
        if cell.a != 0 {
            total.b += w * cell.b;
            total.g += w * cell.g;
            total.r += w * cell.r;
            total.a += w * cell.a;
        }
    }

    #[inline]
    fn write(total: &Cell, out: &mut [u8]) {
        // total.a carries precision^2 = 16 extra bits; the RGB totals carry
        // the same 16 bits plus the channel scaled by alpha/4, so dividing by
        // the shifted alpha leaves a 14-bit fixed-point channel.
        let alpha = (total.a.max(0) + 0x8000) >> 16;
        if alpha == 0 {
            out[..BYTES_PER_PIXEL].fill(0);
            return;
        }

        let unmult = |c: i32| ((((c.max(0) / alpha) + 0x1FFF) >> 14) as u32).min(255) as u8;
        out[0] = unmult(total.b);
        out[1] = unmult(total.g);
        out[2] = unmult(total.r);
        out[3] = (alpha as u32).min(255) as u8;
    }
}

/// Produces one target row of a tile.
///
/// `xcontribs` is the horizontal table narrowed to the tile's output columns
/// and `cache` spans the tile's source columns starting at `xmin_source`;
/// `out_row` is the tile's segment of the target row, `4 * xcontribs.len()`
/// bytes. Source rows advance top-down.
pub(crate) fn process_row<A: AlphaPolicy>(
    src: &Image,
    ycontrib: &Contributor,
    xcontribs: &[Contributor],
    xmin_source: i32,
    cache: &mut [Cell],
    out_row: &mut [u8],
) {
    debug_assert_eq!(out_row.len(), xcontribs.len() * BYTES_PER_PIXEL);

    // Vertical pass: collapse the row footprint into per-column sums.
    let base = xmin_source as usize * BYTES_PER_PIXEL;
    let row = &src.row(ycontrib.min as u32)[base..];
    let w = ycontrib.weights[0];
    for (cell, px) in cache.iter_mut().zip(row.chunks_exact(BYTES_PER_PIXEL)) {
        A::combine(px, w, cell);
    }

    for j in 1..=ycontrib.high {
        let row = &src.row((ycontrib.min + j) as u32)[base..];
        let w = ycontrib.weights[j as usize];
        for (cell, px) in cache.iter_mut().zip(row.chunks_exact(BYTES_PER_PIXEL)) {
            A::increase(px, w, cell);
        }
    }

    // Horizontal pass: walk the cache forward once, one footprint per output
    // pixel.
    let mut total = Cell::default();
    for (c, out) in xcontribs.iter().zip(out_row.chunks_exact_mut(BYTES_PER_PIXEL)) {
        let run = &cache[(c.min - xmin_source) as usize..][..c.weights.len()];

        A::init_total(&run[0], c.weights[0], &mut total);
        for (cell, &w) in run[1..].iter().zip(&c.weights[1..]) {
            A::increase_total(cell, w, &mut total);
        }

        A::write(&total, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_rounds_and_saturates() {
        assert_eq!(clamp22(0), 0);
        assert_eq!(clamp22(-5_000_000), 0);
        assert_eq!(clamp22(255 << 22), 255);
        assert_eq!(clamp22(200 << 22), 200);
        // Exactly half a unit rounds down, anything past it rounds up.
        assert_eq!(clamp22((100 << 22) + (1 << 21)), 100);
        assert_eq!(clamp22((100 << 22) + (1 << 21) + 1), 101);
        // Overshoot from negative lobes saturates instead of wrapping.
        assert_eq!(clamp22(260 << 22), 255);
    }

    #[test]
    fn independent_accumulates_all_channels() {
        let mut cell = Cell { b: 9, g: 9, r: 9, a: 9 };
        Independent::combine(&[1, 2, 3, 4], 10, &mut cell);
        assert_eq!(cell, Cell { b: 10, g: 20, r: 30, a: 40 });
        Independent::increase(&[1, 1, 1, 1], 5, &mut cell);
        assert_eq!(cell, Cell { b: 15, g: 25, r: 35, a: 45 });
    }

    #[test]
    fn ignore_leaves_alpha_opaque() {
        let mut cell = Cell::default();
        Ignore::combine(&[1, 2, 3, 200], PREC_HIGH, &mut cell);
        assert_eq!(cell.a, 0);

        let mut out = [0u8; 4];
        let total = Cell { b: 1 << 22, g: 2 << 22, r: 3 << 22, a: 0 };
        Ignore::write(&total, &mut out);
        assert_eq!(out, [1, 2, 3, 255]);
    }

    #[test]
    fn premultiply_transparent_pixels_vanish() {
        let mut cell = Cell { b: 7, g: 7, r: 7, a: 7 };
        // A transparent pixel wipes the cell on combine...
        PreMultiply::combine(&[255, 255, 255, 0], PREC_LOW, &mut cell);
        assert_eq!(cell, Cell::default());

        // ...and is skipped entirely on increase.
        PreMultiply::increase(&[255, 255, 255, 0], PREC_LOW, &mut cell);
        assert_eq!(cell, Cell::default());

        let mut out = [9u8; 4];
        PreMultiply::write(&Cell::default(), &mut out);
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn premultiply_round_trips_an_opaque_pixel() {
        // Full weight on a single opaque pixel must reproduce it exactly.
        let px = [40, 130, 220, 255];
        let mut cell = Cell::default();
        PreMultiply::combine(&px, PREC_LOW, &mut cell);

        let mut total = Cell::default();
        PreMultiply::init_total(&cell, PREC_LOW, &mut total);

        let mut out = [0u8; 4];
        PreMultiply::write(&total, &mut out);
        assert_eq!(out, px);
    }

    #[test]
    fn premultiply_recovers_translucent_color() {
        let px = [100, 50, 10, 128];
        let mut cell = Cell::default();
        PreMultiply::combine(&px, PREC_LOW, &mut cell);

        let mut total = Cell::default();
        PreMultiply::init_total(&cell, PREC_LOW, &mut total);

        let mut out = [0u8; 4];
        PreMultiply::write(&total, &mut out);
        assert_eq!(out[3], 128);
        // The /4 truncation costs at most one step per channel.
        for (o, p) in out[..3].iter().zip(&px[..3]) {
            assert!(o.abs_diff(*p) <= 1, "{out:?} vs {px:?}");
        }
    }
}

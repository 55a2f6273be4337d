// Weight-table construction for one separable axis.
//
// A contributor records, for one output pixel, the range of source pixels
// under the filter's footprint and an integer weight per source pixel. The
// weight is the kernel integrated across that source pixel's footprint, so
// downscaling antialiases instead of skipping pixels. Weights are quantized to
// fixed point and nudged so each table sums exactly to the precision unit.

use super::Filter;

/// Sub-intervals of the weighted midpoint+trapezoid quadrature.
const QUADRATURE_POINTS: i32 = 18;

/// Integer weights for one output pixel along one axis.
///
/// `weights[k]` applies to source pixel `min + k`; `weights.len() == high + 1`
/// and the weights always sum to the precision the table was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Contributor {
    pub min: i32,
    pub high: i32,
    pub weights: Vec<i32>,
}

/// Builds the contributor table for one axis.
///
/// `source_start`/`source_float_width` select the (fractional) span of the
/// source axis to map onto `[0, target_size)`; a float width of 0 means the
/// whole axis. `radius` is the filter support in source pixels, pre-resolved
/// by the caller (0 never reaches here).
pub(crate) fn make_contributors(
    radius: f64,
    source_size: i32,
    target_size: i32,
    source_start: f64,
    source_float_width: f64,
    filter: Filter,
    prec: i32,
) -> Vec<Contributor> {
    debug_assert!(source_size > 0 && target_size > 0 && radius > 0.0);

    let source_float_width =
        if source_float_width == 0.0 { source_size as f64 } else { source_float_width };
    let scale = source_float_width / target_size as f64;

    // Downsampling stretches the kernel over `scale` source pixels per output
    // pixel; upsampling keeps the support at `radius`.
    let rr = if scale > 1.0 { radius * scale } else { radius };
    let delta = 1.0 / rr;

    if scale == 1.0 && source_start.fract() == 0.0 {
        // Unit zoom at an integer offset copies pixels through unchanged.
        let start = source_start as i32;
        return (0..target_size)
            .map(|x| Contributor {
                min: (x + start).clamp(0, source_size - 1),
                high: 0,
                weights: vec![prec],
            })
            .collect();
    }

    let kernel = filter.kernel();
    let mut contribs = Vec::with_capacity(target_size as usize);

    for x in 0..target_size {
        // Center of output pixel x in source coordinates; source pixel j
        // occupies [j, j + 1].
        let center = (x as f64 + 0.5) * scale + source_start;
        let true_min = (center - rr - 1.0).ceil() as i32;
        let true_max = (center + rr).floor() as i32;

        let min = true_min.max(0);
        let mx = true_max.min(source_size - 1);
        let high = mx - min;

        if high < 0 {
            // The whole footprint lies past an edge, which happens for the
            // outer pixels of a rectangle poking out of the source. All the
            // mass repeats the edge pixel.
            let edge = if true_max < 0 { 0 } else { source_size - 1 };
            contribs.push(Contributor { min: edge, high: 0, weights: vec![prec] });
            continue;
        }

        let mut weights = vec![0i32; high as usize + 1];

        for j in true_min..=true_max {
            // Source pixel footprint mapped into the kernel domain and
            // intersected with the support.
            let x1 = (delta * (j as f64 - center)).max(-1.0);
            let x2 = (delta * ((j + 1) as f64 - center)).min(1.0);
            if x2 <= x1 {
                continue;
            }
            let x3 = 0.5 * (x1 + x2);

            let n = QUADRATURE_POINTS as f64;
            let dw = (x2 - x1) * (kernel(x1) + kernel(x2) + (n - 2.0) * kernel(x3)) / n;
            let w = (prec as f64 * dw).round() as i32;

            // Kernel mass beyond either edge repeats the edge pixel.
            weights[(j.clamp(min, mx) - min) as usize] += w;
        }

        // Quantization leaves the sum a little off the precision unit; push
        // the residue into the middle (usually largest) weight so the table
        // has exactly unity gain.
        let sum: i32 = weights.iter().sum();
        weights[high as usize / 2] += prec - sum;

        contribs.push(Contributor { min, high, weights });
    }

    contribs
}

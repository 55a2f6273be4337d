// See http://cs.brown.edu/courses/cs123/lectures/08_Image_Processing_IV.pdf
// for some of the theory behind image scaling and convolution.
//
// All kernels here are compressed into the support [-1, 1] and normalized so
// their integral over the support is 1. Weight tables are built by integrating
// a kernel across each source pixel's footprint, so unit integral rather than
// unit peak is what keeps the output gain at one.

use derive_more::Display;

/// Available reconstruction filters.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Box average. The cheapest filter and the blurriest downscaler.
    Box,

    /// Triangle filter, bilinear sampling in two dimensions.
    Linear,

    /// Cubic filter with a = -2. Sharp, with visible overshoot at hard edges.
    Bicubic,

    /// A 6th-degree polynomial approximation of Lanczos without the trig.
    Mine,

    /// Three-lobed windowed sinc.
    Lanczos,

    /// Cubic B-spline. No negative lobes, so no overshoot and the softest
    /// results of the six.
    BSpline,
}

const BICUBIC_A: f64 = -2.0;
const MINE_BETA: f64 = 0.52;

fn box_kernel(x: f64) -> f64 {
    // Total weight 1 spread over [-1, 1].
    if x.abs() <= 1.0 { 0.5 } else { 0.0 }
}

fn linear_kernel(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 { 1.0 - x } else { 0.0 }
}

fn bspline_kernel(x: f64) -> f64 {
    let x = x.abs();
    if x < 0.5 {
        8.0 * x * x * (x - 1.0) + 4.0 / 3.0
    } else if x < 1.0 {
        let t = 1.0 - x;
        8.0 / 3.0 * t * t * t
    } else {
        0.0
    }
}

fn bicubic_kernel(x: f64) -> f64 {
    let a = BICUBIC_A;
    let x = x.abs();
    if x < 0.5 {
        4.0 * (a + 8.0) * x.powi(3) - 2.0 * (a + 12.0) * x * x + 2.0
    } else if x < 1.0 {
        2.0 * a * (2.0 * x.powi(3) - 5.0 * x * x + 4.0 * x - 1.0)
    } else {
        0.0
    }
}

fn mine_kernel(x: f64) -> f64 {
    let b2 = MINE_BETA * MINE_BETA;
    let alpha = 105.0 / (16.0 - 112.0 * b2);
    let aa = alpha / 7.0;
    let bb = -alpha * (2.0 + b2) / 5.0;
    let cc = alpha * (1.0 + 2.0 * b2) / 3.0;
    let dd = -alpha * b2;

    let x = x.abs();
    if x < 1.0 {
        let x2 = x * x;
        7.0 * aa * x2 * x2 * x2 + 5.0 * bb * x2 * x2 + 3.0 * cc * x2 + dd
    } else {
        0.0
    }
}

fn lanczos_kernel(x: f64) -> f64 {
    let x = x.abs();
    if x == 0.0 {
        // The limit of sin(3y)sin(y)/y^2 as y goes to 0.
        3.0
    } else if x < 1.0 {
        let y = std::f64::consts::PI * x;
        (3.0 * y).sin() * y.sin() / (y * y)
    } else {
        0.0
    }
}

impl Filter {
    pub(crate) fn kernel(self) -> fn(f64) -> f64 {
        match self {
            Self::Box => box_kernel,
            Self::Linear => linear_kernel,
            Self::Bicubic => bicubic_kernel,
            Self::Mine => mine_kernel,
            Self::Lanczos => lanczos_kernel,
            Self::BSpline => bspline_kernel,
        }
    }

    /// Support radius in source pixels when the caller passes a radius of 0.
    pub const fn default_radius(self) -> f64 {
        match self {
            Self::Box => 0.5,
            Self::Linear => 1.0,
            Self::Bicubic | Self::Mine | Self::BSpline => 2.0,
            Self::Lanczos => 3.0,
        }
    }
}

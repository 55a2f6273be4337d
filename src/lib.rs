//! High-quality resampling of 32-bit BGRA images.
//!
//! Maps a floating-point sub-rectangle of a source image onto a fixed-size
//! target image using a separable reconstruction filter, which makes smooth
//! non-integer zoom and pan over a still image possible. Work can run on the
//! calling thread or be fanned out over a persistent worker pool.
//!
//! ```
//! use zoomscale::{resample, AlphaMode, Filter, Image, Res};
//!
//! let src = Image::new(Res { w: 640, h: 480 });
//! let mut dst = Image::new(Res { w: 320, h: 240 });
//! resample(320, 240, &src, &mut dst, Filter::Lanczos, 0.0, true, AlphaMode::Ignore).unwrap();
//! ```
//!
//! Buffers are top-down BGRA with 4-byte-aligned rows; callers coming from
//! `image::RgbaImage` can convert through [`Image::from_rgba`].

#[macro_use]
extern crate log;

use thiserror::Error;

pub mod com;
mod pools;
pub mod resample;

pub use com::{FloatRect, Image, Res};
pub use pools::ResamplePool;
pub use resample::{resample, zoom_resample, zoom_resample_parallel, AlphaMode, Filter};

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("invalid target size {w}x{h}")]
    InvalidTargetSize { w: i32, h: i32 },

    #[error("source image has no pixels")]
    EmptySource,

    #[error("source rectangle {0:?} is empty or lies outside the source image")]
    InvalidSourceRect(FloatRect),
}

pub type Result<T> = std::result::Result<T, Error>;

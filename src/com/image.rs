use image::RgbaImage;

use super::Res;

/// Bytes per 32-bit BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// An owned 32-bit BGRA image.
///
/// Rows are stored top-down; within each 32-bit little-endian pixel the byte
/// order is `{b, g, r, a}`. Rows are 4-byte aligned, so the default stride is
/// exactly `4 * width`, but buffers imported from elsewhere may carry a larger
/// stride.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    res: Res,
    stride: usize,
    data: Vec<u8>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Image {:?} stride {}]", self.res, self.stride)
    }
}

impl Image {
    /// A zeroed (fully transparent black) image.
    pub fn new(res: Res) -> Self {
        let stride = res.w as usize * BYTES_PER_PIXEL;
        Self { res, stride, data: vec![0; stride * res.h as usize] }
    }

    /// Wraps an existing top-down BGRA buffer.
    ///
    /// # Panics
    ///
    /// If the stride is smaller than a row or the buffer shorter than
    /// `stride * height`.
    pub fn from_vec(res: Res, stride: usize, data: Vec<u8>) -> Self {
        assert!(stride >= res.w as usize * BYTES_PER_PIXEL, "Row stride smaller than a row");
        assert!(data.len() >= stride * res.h as usize, "Buffer too short for {res:?}");

        Self { res, stride, data }
    }

    pub const fn res(&self) -> Res {
        self.res
    }

    pub const fn width(&self) -> u32 {
        self.res.w
    }

    pub const fn height(&self) -> u32 {
        self.res.h
    }

    /// Row stride in bytes.
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Reallocates to `res` if the current dimensions differ. Pixel contents
    /// are unspecified afterwards; the resampler overwrites every pixel.
    pub fn ensure_size(&mut self, res: Res) {
        if self.res != res {
            *self = Self::new(res);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// One row of pixel data, `4 * width` bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.res.w as usize * BYTES_PER_PIXEL]
    }

    /// All rows top-down, each narrowed to `4 * width` bytes.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let row_bytes = self.res.w as usize * BYTES_PER_PIXEL;
        self.data.chunks_exact_mut(self.stride).map(move |r| &mut r[..row_bytes])
    }

    /// The `{b, g, r, a}` bytes of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let p = &self.row(y)[x as usize * BYTES_PER_PIXEL..][..BYTES_PER_PIXEL];
        [p[0], p[1], p[2], p[3]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, bgra: [u8; 4]) {
        let start = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        self.data[start..start + BYTES_PER_PIXEL].copy_from_slice(&bgra);
    }

    /// Converts from the `image` crate's RGBA layout, swizzling to BGRA.
    pub fn from_rgba(img: &RgbaImage) -> Self {
        let res = Res { w: img.width(), h: img.height() };
        let mut out = Self::new(res);

        for (src, dst) in
            img.as_raw().chunks_exact(BYTES_PER_PIXEL).zip(out.data.chunks_exact_mut(BYTES_PER_PIXEL))
        {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }

        out
    }

    /// Converts to the `image` crate's RGBA layout.
    ///
    /// # Panics
    ///
    /// If the image dimensions overflow `RgbaImage`'s buffer limits.
    pub fn to_rgba(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.res.w, self.res.h);

        for (dst, src) in
            out.chunks_exact_mut(BYTES_PER_PIXEL).zip(self.data.chunks_exact(BYTES_PER_PIXEL))
        {
            dst[0] = src[2];
            dst[1] = src[1];
            dst[2] = src[0];
            dst[3] = src[3];
        }

        out
    }
}

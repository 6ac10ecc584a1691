//! Image views and owned floating-point images.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! `Image` owns a contiguous row-major `f64` buffer. Rows are indexed by `y`,
//! columns by `x`; for Abel transforms the column index is the radius.

use crate::util::{AbelError, AbelResult};

pub mod sample;
pub mod zoom;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> AbelResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> AbelResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(AbelError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Iterates over all rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> AbelResult<Self> {
        if width == 0 || height == 0 {
            return Err(AbelError::InvalidDimensions { width, height });
        }
        let out_of_bounds = AbelError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if x >= self.width || y >= self.height || end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(AbelError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(AbelError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> AbelResult<usize> {
    if width == 0 || height == 0 {
        return Err(AbelError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(AbelError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(AbelError::InvalidDimensions { width, height })
}

/// Owned contiguous `f64` image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl Image {
    /// Wraps a row-major buffer of exactly `width * height` samples.
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> AbelResult<Self> {
        let needed = width
            .checked_mul(height)
            .filter(|&n| n > 0)
            .ok_or(AbelError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(AbelError::ShapeMismatch {
                expected: needed,
                got: data.len(),
                context: "image buffer length",
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a zero-filled image.
    pub fn zeros(width: usize, height: usize) -> AbelResult<Self> {
        let len = width
            .checked_mul(height)
            .filter(|&n| n > 0)
            .ok_or(AbelError::InvalidDimensions { width, height })?;
        Self::new(vec![0.0; len], width, height)
    }

    /// Creates an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> AbelResult<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut img = Self::zeros(width, height)?;
        for y in 0..height {
            for x in 0..width {
                img.data[y * width + x] = f(x, y);
            }
        }
        Ok(img)
    }

    /// Copies a (possibly strided) view into a contiguous image.
    pub fn from_view(view: ImageView<'_, f64>) -> AbelResult<Self> {
        let len = view.width() * view.height();
        if view.stride() == view.width() {
            let data = view.as_slice().get(..len).ok_or(AbelError::BufferTooSmall {
                needed: len,
                got: view.as_slice().len(),
            })?;
            return Self::new(data.to_vec(), view.width(), view.height());
        }
        let mut data = Vec::with_capacity(view.width() * view.height());
        for row in view.rows() {
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height())
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, f64> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major sample buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Returns the row-major sample buffer mutably.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the image and returns its buffer.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> Option<&[f64]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.data[start..start + self.width])
    }

    /// Returns row `y` mutably.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [f64]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&mut self.data[start..start + self.width])
    }

    /// Returns the transposed image (`width` and `height` swapped).
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                data[x * self.height + y] = self.data[y * self.width + x];
            }
        }
        Self {
            data,
            width: self.height,
            height: self.width,
        }
    }
}

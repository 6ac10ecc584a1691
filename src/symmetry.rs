//! Quadrant extraction and mirror-symmetry checks.

use crate::image::{Image, ImageView};
use crate::util::math::allclose;
use crate::util::{AbelError, AbelResult};

const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

/// Splits `src` into four quadrants without reorienting them.
///
/// Order is top-right, top-left, bottom-left, bottom-right. For odd sizes
/// every quadrant includes the central row and column.
pub fn image_quadrants(src: ImageView<'_, f64>) -> AbelResult<[Image; 4]> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return Err(AbelError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    let wc = w / 2 + w % 2;
    let hc = h / 2 + h % 2;
    let quadrant = |x: usize, y: usize| -> AbelResult<Image> { Image::from_view(src.roi(x, y, wc, hc)?) };
    Ok([
        quadrant(w - wc, 0)?,
        quadrant(0, 0)?,
        quadrant(0, h - hc)?,
        quadrant(w - wc, h - hc)?,
    ])
}

fn flip_lr(img: &Image) -> Image {
    let mut out = img.clone();
    let w = img.width();
    for row in out.data_mut().chunks_mut(w) {
        row.reverse();
    }
    out
}

fn flip_ud(img: &Image) -> Image {
    let mut out = img.clone();
    let w = img.width();
    let h = img.height();
    for (y, dst) in out.data_mut().chunks_mut(w).enumerate() {
        dst.copy_from_slice(&img.data()[(h - 1 - y) * w..(h - y) * w]);
    }
    out
}

fn close(a: &Image, b: &Image) -> bool {
    allclose(a.data(), b.data(), RTOL, ATOL)
}

/// Checks mirror symmetry of `src`, one flag per quadrant pair.
///
/// - `i_sym` alone: left/right mirror, pairs (Q1, Q0) and (Q2, Q3).
/// - `j_sym` alone: up/down mirror, pairs (Q1, Q2) and (Q0, Q3).
/// - both: point symmetry, pairs (Q1, Q3) and (Q0, Q2).
///
/// Requesting neither axis is [`AbelError::DegenerateSymmetryCheck`].
pub fn is_symmetric(src: ImageView<'_, f64>, i_sym: bool, j_sym: bool) -> AbelResult<[bool; 2]> {
    if !i_sym && !j_sym {
        return Err(AbelError::DegenerateSymmetryCheck);
    }
    let [q0, q1, q2, q3] = image_quadrants(src)?;
    Ok(match (i_sym, j_sym) {
        (true, false) => [close(&flip_lr(&q1), &q0), close(&flip_lr(&q2), &q3)],
        (false, true) => [close(&flip_ud(&q1), &q2), close(&flip_ud(&q0), &q3)],
        _ => [
            close(&flip_ud(&flip_lr(&q1)), &q3),
            close(&flip_ud(&flip_lr(&q0)), &q2),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::{image_quadrants, is_symmetric};
    use crate::image::Image;
    use crate::util::AbelError;

    #[test]
    fn odd_quadrants_share_centre() {
        let img = Image::from_fn(5, 3, |x, y| (10 * y + x) as f64).unwrap();
        let [q0, q1, q2, q3] = image_quadrants(img.view()).unwrap();
        assert_eq!((q0.width(), q0.height()), (3, 2));
        assert_eq!(q0.data(), &[2.0, 3.0, 4.0, 12.0, 13.0, 14.0]);
        assert_eq!(q1.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(q2.data(), &[10.0, 11.0, 12.0, 20.0, 21.0, 22.0]);
        assert_eq!(q3.data(), &[12.0, 13.0, 14.0, 22.0, 23.0, 24.0]);
    }

    #[test]
    fn left_right_mirror_is_detected() {
        let img = Image::from_fn(7, 5, |x, y| ((x as f64 - 3.0).abs() + y as f64).sqrt()).unwrap();
        assert_eq!(is_symmetric(img.view(), true, false).unwrap(), [true, true]);
        assert_eq!(is_symmetric(img.view(), false, true).unwrap(), [false, false]);
    }

    #[test]
    fn radial_image_is_point_symmetric() {
        let img = Image::from_fn(9, 9, |x, y| {
            ((x as f64 - 4.0).powi(2) + (y as f64 - 4.0).powi(2)).sqrt()
        })
        .unwrap();
        assert_eq!(is_symmetric(img.view(), true, true).unwrap(), [true, true]);
    }

    #[test]
    fn no_axis_is_degenerate() {
        let img = Image::zeros(3, 3).unwrap();
        assert_eq!(
            is_symmetric(img.view(), false, false).unwrap_err(),
            AbelError::DegenerateSymmetryCheck
        );
    }
}

use abelkit::lowlevel::{build_operator, two_point_operator};
use abelkit::{transform, AbelError, BasisCache, Direction, Image, Method, TransformOptions};
use std::sync::Arc;

fn assert_causal(method: Method, direction: Direction, cols: usize) {
    let op = build_operator(method, direction, cols).unwrap();
    assert_eq!(op.size(), cols);
    for i in 0..cols {
        for j in 0..i {
            assert_eq!(
                op.get(i, j),
                Some(0.0),
                "{method} {direction} cols={cols} at ({i}, {j})"
            );
        }
    }
}

#[test]
fn operators_are_upper_triangular() {
    for cols in 1..40 {
        assert_causal(Method::TwoPoint, Direction::Inverse, cols);
        assert_causal(Method::OnionPeeling, Direction::Forward, cols);
        assert_causal(Method::OnionPeeling, Direction::Inverse, cols);
    }
}

#[test]
fn two_point_axis_cells_use_closed_form_limits() {
    let op = two_point_operator(5);
    let two_over_pi = 2.0 / std::f64::consts::PI;
    assert!((op.get(0, 0).unwrap() - two_over_pi).abs() < 1e-15);
    // J(0, 1) = [ln(2 + 2) - ln(1 + 1)] / pi
    let j01 = 2.0f64.ln() / std::f64::consts::PI;
    assert!((op.get(0, 1).unwrap() - (j01 - two_over_pi)).abs() < 1e-12);
}

#[test]
fn operator_depends_only_on_size() {
    let a = two_point_operator(17);
    let b = two_point_operator(17);
    assert_eq!(a, b);
    let small = two_point_operator(5);
    for i in 0..5 {
        for j in 0..5 {
            assert!((a.get(i, j).unwrap() - small.get(i, j).unwrap()).abs() < 1e-15);
        }
    }
}

#[test]
fn cache_shares_operators_until_cleared() {
    let mut cache = BasisCache::new();
    let first = cache
        .get_or_build(Method::TwoPoint, Direction::Inverse, 12)
        .unwrap();
    let again = cache
        .get_or_build(Method::TwoPoint, Direction::Inverse, 12)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(cache.len(), 1);

    cache
        .get_or_build(Method::OnionPeeling, Direction::Inverse, 12)
        .unwrap();
    assert_eq!(cache.len(), 2);
    assert!(cache.contains(Method::TwoPoint, Direction::Inverse, 12));

    cache.clear();
    assert!(cache.is_empty());
    let rebuilt = cache
        .get_or_build(Method::TwoPoint, Direction::Inverse, 12)
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(*first, *rebuilt);
}

#[test]
fn forward_two_point_is_rejected_for_every_shape() {
    let mut cache = BasisCache::new();
    for (w, h) in [(1, 1), (3, 7), (16, 2)] {
        let img = Image::zeros(w, h).unwrap();
        let err = transform(
            img.view(),
            Method::TwoPoint,
            Direction::Forward,
            &mut cache,
            TransformOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AbelError::UnsupportedDirection {
                method: "two_point",
                direction: "forward",
            }
        );
    }
    assert!(cache.is_empty());
}

#[test]
fn transform_preserves_shape() {
    let mut cache = BasisCache::new();
    let img = Image::from_fn(9, 4, |x, y| (x * y) as f64).unwrap();
    let out = transform(
        img.view(),
        Method::OnionPeeling,
        Direction::Inverse,
        &mut cache,
        TransformOptions::default(),
    )
    .unwrap();
    assert_eq!((out.width(), out.height()), (9, 4));
}

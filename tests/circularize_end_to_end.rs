use abelkit::circularize::{angular_slices, remap};
use abelkit::lowlevel::refine_peak;
use abelkit::{
    circularize_image, circularize_image_with_correction, reproject_image_into_polar, AlignMethod,
    CenterMethod, CircularizeConfig, Image, Interpolation,
};

const SIZE: usize = 201;
const R0: f64 = 60.0;
const EPS: f64 = 0.04;

/// Ring of radius `R0 (1 + EPS cos 2θ)` around the geometric centre.
fn distorted_ring() -> Image {
    let c = (SIZE / 2) as f64;
    Image::from_fn(SIZE, SIZE, |col, row| {
        let x = col as f64 - c;
        let y = c - row as f64;
        let theta = x.atan2(y);
        let r = x.hypot(y) / (1.0 + EPS * (2.0 * theta).cos());
        (-(r - R0).powi(2) / 18.0).exp()
    })
    .unwrap()
}

/// Standard deviation of the ring radius over 32 angular sectors.
fn ring_radius_spread(img: &Image) -> f64 {
    let polar = reproject_image_into_polar(img.view(), 1.0, Interpolation::Bicubic).unwrap();
    let slices = angular_slices(&polar, 32).unwrap();
    let radii: Vec<f64> = slices
        .iter()
        .map(|s| {
            let peak = s
                .profile
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            polar.radial()[0] + refine_peak(&s.profile, peak)
        })
        .collect();
    let mean = radii.iter().sum::<f64>() / radii.len() as f64;
    (radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / radii.len() as f64).sqrt()
}

#[test]
fn argmax_circularization_reduces_radius_spread() {
    let img = distorted_ring();
    let before = ring_radius_spread(&img);
    assert!(before > 1.0, "{before}");

    let cfg = CircularizeConfig {
        method: AlignMethod::Argmax,
        nslices: 32,
        ..CircularizeConfig::default()
    };
    let run = circularize_image_with_correction(img.view(), &cfg).unwrap();
    assert_eq!(run.radial_corrections.len(), 32);
    assert_eq!(run.slice_angles.len(), 32);
    assert_eq!(run.radial_corrections[0], 1.0);
    assert!(run.slice_angles.windows(2).all(|w| w[0] < w[1]));

    let after = ring_radius_spread(&run.image);
    assert!(after < 0.5 * before, "before {before}, after {after}");
}

#[test]
fn lsq_circularization_reduces_radius_spread() {
    let img = distorted_ring();
    let before = ring_radius_spread(&img);
    let cfg = CircularizeConfig {
        method: AlignMethod::Lsq,
        nslices: 32,
        radial_range: Some((30.0, 90.0)),
        ..CircularizeConfig::default()
    };
    let out = circularize_image(img.view(), &cfg).unwrap();
    assert_eq!((out.width(), out.height()), (SIZE, SIZE));
    let after = ring_radius_spread(&out);
    assert!(after < 0.6 * before, "before {before}, after {after}");
}

#[test]
fn returned_correction_reproduces_the_image() {
    let img = distorted_ring();
    let cfg = CircularizeConfig {
        nslices: 16,
        ..CircularizeConfig::default()
    };
    let run = circularize_image_with_correction(img.view(), &cfg).unwrap();
    assert_eq!(run.correction.angles(), run.slice_angles.as_slice());
    assert_eq!(run.correction.values().len(), run.radial_corrections.len());
    for (&theta, &v) in run.correction.angles().iter().zip(run.correction.values()) {
        assert!((run.correction.eval(theta) - v).abs() < 1e-9);
    }
    let again = remap(img.view(), &run.correction, cfg.interpolation, false).unwrap();
    assert_eq!(again, run.image);
}

#[test]
fn centering_runs_before_reprojection() {
    let img = distorted_ring();
    let cfg = CircularizeConfig {
        center: Some(CenterMethod::ImageCenter),
        nslices: 16,
        ..CircularizeConfig::default()
    };
    let plain = circularize_image(
        img.view(),
        &CircularizeConfig {
            nslices: 16,
            ..CircularizeConfig::default()
        },
    )
    .unwrap();
    let centred = circularize_image(img.view(), &cfg).unwrap();
    assert_eq!(plain, centred);
}

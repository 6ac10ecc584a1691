#![cfg(feature = "serde")]

use abelkit::benchmark::BenchmarkConfig;
use abelkit::{AlignMethod, CenterMethod, CircularizeConfig, Interpolation, TransformOptions};

#[test]
fn circularize_config_loads_partial_json() {
    let cfg: CircularizeConfig = serde_json::from_str(
        r#"{ "method": "lsq", "center": "convolution", "nslices": 16, "radial_range": [10.0, 80.0] }"#,
    )
    .unwrap();
    assert_eq!(cfg.method, AlignMethod::Lsq);
    assert_eq!(cfg.center, Some(CenterMethod::Convolution));
    assert_eq!(cfg.nslices, 16);
    assert_eq!(cfg.radial_range, Some((10.0, 80.0)));
    assert_eq!(cfg.zoom, 1.0);
    assert_eq!(cfg.interpolation, Interpolation::Bicubic);
    assert_eq!(cfg.lm.max_iterations, 200);
}

#[test]
fn unknown_enum_names_are_rejected() {
    let err = serde_json::from_str::<CircularizeConfig>(r#"{ "method": "fourier" }"#);
    assert!(err.is_err());
}

#[test]
fn benchmark_and_transform_configs_round_trip() {
    let cfg = BenchmarkConfig {
        sizes: vec![101],
        select: vec!["two_point".to_string()],
        ..BenchmarkConfig::default()
    };
    let text = serde_json::to_string(&cfg).unwrap();
    let back: BenchmarkConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back.sizes, vec![101]);
    assert_eq!(back.select, vec!["two_point".to_string()]);
    assert_eq!(back.n_max_bs, 700);

    let opts: TransformOptions = serde_json::from_str(r#"{ "dr": 0.25 }"#).unwrap();
    assert_eq!(opts.dr, 0.25);
    assert!(!opts.parallel);
}

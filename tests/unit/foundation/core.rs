use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn stage_interval_is_about_33ms() {
    let iv = Fps::STAGE.interval();
    assert!((iv.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    assert_eq!(iv.as_millis(), 33);
}

#[test]
fn timestamp_arithmetic_is_saturating_and_signed() {
    let t = Timestamp(1_000);
    assert_eq!(t.add_millis(500), Timestamp(1_500));
    assert_eq!(Timestamp(u64::MAX).add_millis(1), Timestamp(u64::MAX));
    assert_eq!(Timestamp(1_500).millis_since(t), 500.0);
    assert_eq!(t.millis_since(Timestamp(1_500)), -500.0);
}

#[test]
fn timestamp_serializes_as_plain_integer() {
    let json = serde_json::to_string(&Timestamp(42)).unwrap();
    assert_eq!(json, "42");
}

use super::*;

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(0, 255), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
}

#[test]
fn clamp_byte_rounds_and_saturates() {
    assert_eq!(clamp_byte(-3.0), 0);
    assert_eq!(clamp_byte(254.6), 255);
    assert_eq!(clamp_byte(300.0), 255);
    assert_eq!(clamp_byte(f64::NAN), 0);
}

#[test]
fn clamp_unit_handles_non_finite() {
    assert_eq!(clamp_unit(1.5), 1.0);
    assert_eq!(clamp_unit(-0.5), 0.0);
    assert_eq!(clamp_unit(f64::INFINITY), 0.0);
    assert_eq!(clamp_unit(0.25), 0.25);
}

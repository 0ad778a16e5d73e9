use super::*;

fn frame(bytes: &[u8]) -> Frame {
    Frame::from_vec(bytes.to_vec())
}

fn pairs() -> Vec<(Frame, Frame)> {
    vec![
        (frame(&[0, 0, 0]), frame(&[255, 255, 255])),
        (frame(&[10, 200, 33, 7, 8, 9]), frame(&[250, 1, 128, 0, 255, 90])),
        (frame(&[255, 128, 0]), frame(&[255, 128, 0])),
    ]
}

#[test]
fn mix_endpoints() {
    for (a, b) in pairs() {
        assert_eq!(blend_layer(&a, &b, LayerBlendMode::Mix, 0.0), a);
        assert_eq!(blend_layer(&a, &b, LayerBlendMode::Mix, 1.0), b);
    }
}

#[test]
fn mix_clamps_amount() {
    let (a, b) = (frame(&[0, 100, 200]), frame(&[200, 100, 0]));
    assert_eq!(blend_layer(&a, &b, LayerBlendMode::Mix, 7.0), b);
    assert_eq!(blend_layer(&a, &b, LayerBlendMode::Mix, -1.0), a);
}

#[test]
fn mix_half_is_midpoint() {
    let out = blend_layer(&frame(&[0, 100]), &frame(&[200, 100]), LayerBlendMode::Mix, 0.5);
    assert_eq!(out.as_bytes(), &[100, 100]);
}

#[test]
fn add_zero_is_identity_and_saturates() {
    for (a, b) in pairs() {
        assert_eq!(blend_layer(&a, &b, LayerBlendMode::Add, 0.0), a);
    }
    let out = blend_layer(&frame(&[200, 10]), &frame(&[100, 100]), LayerBlendMode::Add, 1.0);
    assert_eq!(out.as_bytes(), &[255, 110]);
    let half = blend_layer(&frame(&[0]), &frame(&[200]), LayerBlendMode::Add, 0.5);
    assert_eq!(half.as_bytes(), &[100]);
}

#[test]
fn mask_uses_overlay_as_luminance() {
    let base = frame(&[200, 200, 200]);
    let mask = frame(&[255, 0, 128]);
    assert_eq!(blend_layer(&base, &mask, LayerBlendMode::Mask, 0.0), base);
    let full = blend_layer(&base, &mask, LayerBlendMode::Mask, 1.0);
    assert_eq!(full.as_bytes(), &[200, 0, 100]);
}

#[test]
fn unknown_mode_and_mismatched_lengths_pass_base_through() {
    let base = frame(&[1, 2, 3]);
    let out = blend_layer(&base, &frame(&[9, 9, 9]), LayerBlendMode::Unknown, 1.0);
    assert!(out.ptr_eq(&base));
    let out = blend_layer(&base, &frame(&[9]), LayerBlendMode::Mix, 1.0);
    assert!(out.ptr_eq(&base));
}

#[test]
fn transition_endpoints() {
    for mode in [TransitionMode::Mix, TransitionMode::Add] {
        for (a, b) in pairs() {
            assert_eq!(blend_transition(&a, &b, mode, 0.0), a);
            assert_eq!(blend_transition(&a, &b, mode, 1.0), b);
        }
    }
}

#[test]
fn transition_add_is_asymmetric_and_brighter_mid_way() {
    let a = frame(&[200]);
    let b = frame(&[200]);
    let mid = blend_transition(&a, &b, TransitionMode::Add, 0.5);
    // 200 * 0.5 + 200 * 1.0 saturates.
    assert_eq!(mid.as_bytes(), &[255]);

    let early = blend_transition(&frame(&[100]), &frame(&[0]), TransitionMode::Add, 0.25);
    assert_eq!(early.as_bytes(), &[75]);
}

#[test]
fn crossfade_bytes() {
    assert_eq!(crossfade(10, 200, 0.0), 10);
    assert_eq!(crossfade(10, 200, 1.0), 200);
    assert_eq!(crossfade(0, 255, 0.5), 128);
}

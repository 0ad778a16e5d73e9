use super::*;

fn path(s: &str) -> ControlPath {
    ControlPath::parse(s)
}

fn no_lag() -> SliderField {
    SliderField {
        smoothing: 0.0,
        ..SliderField::default()
    }
}

#[test]
fn first_use_has_no_lag() {
    let mut a = Animator::new();
    let v = a.animate(&path("live:h"), 42.0, &SliderField::default(), Timestamp(0));
    assert_eq!(v, 42.0);
    assert_eq!(a.recent_value(&path("live:h")), Some(42.0));
}

#[test]
fn zero_smoothing_tracks_destination_exactly() {
    let mut a = Animator::new();
    let p = path("live:s");
    for (i, dest) in [0.0, 1.0, -3.0, 0.5, 100.0].into_iter().enumerate() {
        assert_eq!(a.animate(&p, dest, &no_lag(), Timestamp(i as u64 * 33)), dest);
    }
}

#[test]
fn smoothing_converges_monotonically_without_overshoot() {
    let mut a = Animator::new();
    let p = path("live:l");
    let field = SliderField {
        smoothing: 0.8,
        ..SliderField::default()
    };
    a.animate(&p, 0.0, &field, Timestamp(0));

    let mut prev = 0.0;
    for tick in 1..2_000u64 {
        let v = a.animate(&p, 1.0, &field, Timestamp(tick * 33));
        assert!(v >= prev - 1e-12, "not monotonic at tick {tick}");
        assert!(v <= 1.0 + 1e-12, "overshoot at tick {tick}");
        prev = v;
    }
    assert!((prev - 1.0).abs() < 1e-6);
}

#[test]
fn alpha_matches_lag_law() {
    assert_eq!(no_lag().alpha(), 1.0);
    let f = SliderField {
        smoothing: 0.5,
        ..SliderField::default()
    };
    assert!((f.alpha() - 0.12).abs() < 1e-12);

    let mut a = Animator::new();
    let p = path("live:x");
    a.animate(&p, 0.0, &f, Timestamp(0));
    let v = a.animate(&p, 10.0, &f, Timestamp(33));
    assert!((v - 1.2).abs() < 1e-9);
}

#[test]
fn bounce_adds_accent_inside_window_only() {
    let mut a = Animator::new();
    let p = path("live:amount");
    let field = SliderField {
        smoothing: 0.0,
        bounce_amount: 0.5,
        bounce_duration: 1_000,
    };

    a.bounce(p.clone(), Timestamp(1_000));
    assert_eq!(a.animate(&p, 1.0, &field, Timestamp(1_000)), 1.0);

    let peak = a.animate(&p, 1.0, &field, Timestamp(1_250));
    assert!((peak - 1.5).abs() < 1e-9);

    let mid = a.animate(&p, 1.0, &field, Timestamp(1_600));
    assert!(mid > 1.0 && mid < 1.5);

    assert_eq!(a.animate(&p, 1.0, &field, Timestamp(2_000)), 1.0);
    assert_eq!(a.animate(&p, 1.0, &field, Timestamp(5_000)), 1.0);
}

#[test]
fn bounce_is_not_fed_back_into_lag() {
    let mut a = Animator::new();
    let p = path("live:amount");
    let field = SliderField {
        smoothing: 0.9,
        bounce_amount: 10.0,
        bounce_duration: 1_000,
    };
    a.animate(&p, 1.0, &field, Timestamp(0));
    a.bounce(p.clone(), Timestamp(0));
    let v = a.animate(&p, 1.0, &field, Timestamp(250));
    assert!(v > 10.0);
    assert_eq!(a.recent_value(&p), Some(1.0));
}

#[test]
fn retrigger_restarts_envelope() {
    let mut a = Animator::new();
    let p = path("live:amount");
    let field = SliderField {
        smoothing: 0.0,
        bounce_amount: 1.0,
        bounce_duration: 1_000,
    };
    a.bounce(p.clone(), Timestamp(0));
    a.bounce(p.clone(), Timestamp(900));
    assert_eq!(a.bounce_start(&p), Some(Timestamp(900)));
    // 1150 is at the peak of the restarted envelope.
    let v = a.animate(&p, 0.0, &field, Timestamp(1_150));
    assert!((v - 1.0).abs() < 1e-9);
}

#[test]
fn non_finite_destination_holds_previous_value() {
    let mut a = Animator::new();
    let p = path("live:h");
    a.animate(&p, 3.0, &no_lag(), Timestamp(0));
    assert_eq!(a.animate(&p, f64::NAN, &no_lag(), Timestamp(33)), 3.0);
}

#[test]
fn swap_roots_moves_state_between_sides() {
    let mut a = Animator::new();
    a.animate(&path("live:h"), 10.0, &no_lag(), Timestamp(0));
    a.animate(&path("ready:h"), 20.0, &no_lag(), Timestamp(0));
    a.bounce(path("ready:item_a:l"), Timestamp(5));
    a.animate(&path("scratch:x"), 1.0, &no_lag(), Timestamp(0));

    a.swap_roots("live", "ready");
    assert_eq!(a.recent_value(&path("live:h")), Some(20.0));
    assert_eq!(a.recent_value(&path("ready:h")), Some(10.0));
    assert_eq!(a.bounce_start(&path("live:item_a:l")), Some(Timestamp(5)));
    assert_eq!(a.recent_value(&path("scratch:x")), Some(1.0));
    assert_eq!(a.len(), 4);
}

use super::*;

#[test]
fn test_profiles() {
    assert_eq!(RecursionProfile::SubtypeCheck.max_depth(), 30);
    assert_eq!(RecursionProfile::Canonicalization.max_depth(), 50);
    assert_eq!(RecursionProfile::SubtypeCheck.name(), "subtype check");
    assert_eq!(RecursionProfile::Canonicalization.name(), "canonicalization");
}

#[test]
fn test_enter_bounded_shares_depth() {
    let mut counter = DepthCounter::with_profile(RecursionProfile::Canonicalization);
    for _ in 0..30 {
        assert!(counter.enter_bounded(RecursionProfile::Canonicalization.max_depth()));
    }
    // A subtype check nested under 30 levels of alias resolution is refused,
    // while alias resolution may still go deeper.
    assert!(!counter.enter_bounded(RecursionProfile::SubtypeCheck.max_depth()));
    assert_eq!(counter.depth, 30);
    assert!(counter.enter_bounded(RecursionProfile::Canonicalization.max_depth()));
    assert_eq!(counter.depth, 31);
    for _ in 0..31 {
        counter.leave();
    }
    assert_eq!(counter.depth, 0);
}

#[test]
fn test_enter_bounded_never_exceeds_own_ceiling() {
    let mut counter = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
    for _ in 0..30 {
        assert!(counter.enter_bounded(100));
    }
    assert!(!counter.enter_bounded(100));
    for _ in 0..30 {
        counter.leave();
    }
}

#[test]
fn test_refused_enter_leaves_depth_untouched() {
    let mut counter = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
    assert!(!counter.enter_bounded(0));
    assert_eq!(counter.depth, 0);
    assert!(counter.enter_bounded(1));
    counter.leave();
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "DepthCounter dropped with depth 1")]
fn test_leak_detected_on_drop() {
    let mut counter = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
    assert!(counter.enter_bounded(1));
}

//! Property-based tests for the biochemical layer.
//!
//! Verifies the bound invariants: hormone levels stay in [0, 1] under any
//! decay/stimulus sequence, surprise impact is monotone, archetype
//! classification is pure, and TEC respects its floor.

use chrono::{DateTime, Duration, Utc};
use noema_core::config::RewardCurve;
use noema_core::AgentKind;
use noema_neuro::{IntentCategory, NeuroModulation, TopicTracker};
use proptest::prelude::*;

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn arb_agent() -> impl Strategy<Value = AgentKind> {
    prop_oneof![
        Just(AgentKind::Intuition),
        Just(AgentKind::Amygdala),
        Just(AgentKind::Prefrontal),
        Just(AgentKind::Social),
        Just(AgentKind::Striatum),
        Just(AgentKind::Uncertainty),
    ]
}

proptest! {
    /// **Core invariant**: every hormone stays in [0, 1] after any
    /// interleaving of decay and stimulus updates.
    #[test]
    fn hormones_always_bounded(
        steps in prop::collection::vec(
            (0i64..=1440, 0.0f32..=1.0, arb_agent(), 0.0f32..=1.0, any::<bool>()),
            1..20,
        )
    ) {
        let mut nm = NeuroModulation::new(t0());
        let mut now = t0();
        let curve = RewardCurve::default();

        for (minutes, impact, winner, tec, use_curve) in steps {
            now += Duration::minutes(minutes);
            nm.decay(now, tec);
            let reward = if use_curve { Some(&curve) } else { None };
            nm.update_from_stimuli(impact, winner, reward, tec);

            for (name, v) in [
                ("ne", nm.state.ne),
                ("da", nm.state.da),
                ("ht", nm.state.ht),
                ("cort", nm.state.cort),
            ] {
                prop_assert!(v.is_finite(), "{} not finite", name);
                prop_assert!((0.0..=1.0).contains(&v), "{} out of range: {}", name, v);
            }
        }
    }

    /// Surprise impact is monotone in raw error and bounded to [0, 1].
    #[test]
    fn surprise_impact_monotone(a in 0.0f32..=2.0, b in 0.0f32..=2.0) {
        let nm = NeuroModulation::new(t0());
        let ia = nm.compute_surprise_impact(a);
        let ib = nm.compute_surprise_impact(b);
        prop_assert!((0.0..=1.0).contains(&ia));
        if a < b {
            prop_assert!(ia <= ib, "impact({}) = {} > impact({}) = {}", a, ia, b, ib);
        }
    }

    /// Archetype classification is a pure function: repeated calls without
    /// intervening updates agree.
    #[test]
    fn archetype_is_pure(
        ne in 0.0f32..=1.0,
        da in 0.0f32..=1.0,
        ht in 0.0f32..=1.0,
        cort in 0.0f32..=1.0,
    ) {
        let mut nm = NeuroModulation::new(t0());
        nm.state.ne = ne;
        nm.state.da = da;
        nm.state.ht = ht;
        nm.state.cort = cort;
        prop_assert_eq!(nm.archetype(), nm.archetype());
        // Classification never mutates the state.
        prop_assert_eq!(nm.state.cort, cort);
    }

    /// TEC stays in [0, 1] for any observation sequence, and a reset turn
    /// restores it to exactly 1.0.
    #[test]
    fn tec_bounded(
        errors in prop::collection::vec(0.0f32..=1.0, 1..15),
        drift in 0.0f32..=1.0,
    ) {
        let mut tracker = TopicTracker::new();
        let text = "a reasonably long message about one single consistent subject";
        let base = vec![1.0, drift, 0.0];

        for pe in errors {
            tracker.observe(text, Some(&base), IntentCategory::Casual, pe);
            let tec = tracker.tec();
            prop_assert!((0.0..=1.0).contains(&tec), "TEC out of range: {}", tec);
        }

        // An orthogonal message forces a topic change.
        let other = vec![0.0, 0.0, 1.0];
        tracker.observe(
            "something entirely different is on my mind right now",
            Some(&other),
            IntentCategory::Casual,
            0.5,
        );
        prop_assert_eq!(tracker.tec(), 1.0);
    }
}

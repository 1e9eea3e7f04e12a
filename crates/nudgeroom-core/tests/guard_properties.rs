//! Property tests for the admission guard.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Timelike};
use nudgeroom_core::{
    Candidate, CooldownRules, Guard, GuardState, NudgeLimits, NudgePriority, NudgeType,
    QuietHours,
};
use proptest::prelude::*;

fn start_of_day() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 6, 1, 0, 0, 0)
        .unwrap()
}

fn nudge_type() -> impl Strategy<Value = NudgeType> {
    proptest::sample::select(NudgeType::ALL.to_vec())
}

fn priority() -> impl Strategy<Value = NudgePriority> {
    prop_oneof![
        Just(NudgePriority::Low),
        Just(NudgePriority::Normal),
        Just(NudgePriority::High),
    ]
}

proptest! {
    #[test]
    fn admitted_nudges_of_a_type_respect_cooldown(
        cooldown in 1i64..180,
        steps in proptest::collection::vec(1i64..60, 1..80),
    ) {
        let guard = Guard::new(
            CooldownRules::from_minutes(&[(NudgeType::RestSuggest, cooldown)]),
            NudgeLimits::new(u32::MAX, &[]),
            QuietHours::disabled(),
        );
        let mut state = GuardState::default();
        let candidate = Candidate::new(NudgeType::RestSuggest, NudgePriority::Normal);

        let mut now = start_of_day();
        let mut admitted: Vec<DateTime<FixedOffset>> = Vec::new();
        for step in steps {
            now += Duration::minutes(step);
            state.begin_tick();
            if guard.admit(&candidate, &mut state, now).is_admitted() {
                admitted.push(now);
            }
        }

        prop_assert!(!admitted.is_empty());
        for pair in admitted.windows(2) {
            prop_assert!(pair[1] - pair[0] >= Duration::minutes(cooldown));
        }
    }

    #[test]
    fn daily_counts_never_exceed_caps(
        global in 1u32..20,
        per_type in 1u32..6,
        picks in proptest::collection::vec((nudge_type(), priority()), 1..120),
    ) {
        let guard = Guard::new(
            CooldownRules::default(),
            NudgeLimits::new(global, &[(NudgeType::TaskNudge, per_type)]),
            QuietHours::disabled(),
        );
        let mut state = GuardState::default();
        let mut now = start_of_day() + Duration::hours(8);

        for (nudge_type, priority) in picks {
            now += Duration::seconds(30);
            state.begin_tick();
            guard.admit(&Candidate::new(nudge_type, priority), &mut state, now);
        }

        prop_assert!(state.total_today() <= global);
        prop_assert!(state.count_today(NudgeType::TaskNudge) <= per_type);
    }

    #[test]
    fn only_high_priority_passes_during_quiet_hours(
        minute_of_day in 0u32..(24 * 60),
        nudge_type in nudge_type(),
        priority in priority(),
    ) {
        let quiet = QuietHours::parse(true, "22:00", "07:00").unwrap();
        let guard = Guard::new(
            CooldownRules::default(),
            NudgeLimits::new(u32::MAX, &[]),
            quiet,
        );
        let mut state = GuardState::default();
        state.begin_tick();
        let now = start_of_day() + Duration::minutes(i64::from(minute_of_day));
        let admitted = guard
            .admit(&Candidate::new(nudge_type, priority), &mut state, now)
            .is_admitted();

        let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap();
        let in_quiet = quiet.contains(time);
        prop_assert_eq!(admitted, !in_quiet || priority == NudgePriority::High);
    }
}

//! Property tests for the countdown and the Pomodoro rotation.

use pomocycle_core::{next_session_type, Session, SessionType, TimerState};
use proptest::prelude::*;

fn finish_countdown(session: &mut Session) {
    while !session.tick() {}
}

proptest! {
    #[test]
    fn countdown_completes_on_exactly_the_last_tick(minutes in 1i32..=30) {
        let mut session = Session::new();
        prop_assert!(session.start_custom_session(minutes).unwrap());

        let total = minutes as u32 * 60;
        for _ in 1..total {
            prop_assert!(!session.tick());
        }
        prop_assert!(session.tick());
        prop_assert_eq!(session.timer().state(), TimerState::Completed);
        prop_assert_eq!(session.timer().remaining_seconds(), 0);
    }

    #[test]
    fn non_positive_minutes_never_start(minutes in i32::MIN..=0) {
        let mut session = Session::new();
        prop_assert!(session.start_custom_session(minutes).is_err());
        prop_assert_eq!(session.timer().state(), TimerState::Idle);
    }

    #[test]
    fn cycle_stays_in_range_and_counts_work(completions in 1usize..40) {
        let mut session = Session::new();
        let mut work_done = 0u32;

        for _ in 0..completions {
            let finished = session.current_session_type();
            session.start_custom_session(1).unwrap();
            finish_countdown(&mut session);
            let next = session.handle_timer_completion().unwrap();

            if finished == SessionType::Work {
                work_done += 1;
                if work_done % 4 == 0 {
                    prop_assert_eq!(next, SessionType::LongBreak);
                } else {
                    prop_assert_eq!(next, SessionType::ShortBreak);
                }
            } else {
                prop_assert_eq!(next, SessionType::Work);
            }
            prop_assert!(session.current_cycle() < 4);
            prop_assert_eq!(session.current_cycle(), work_done % 4);
            prop_assert_eq!(session.completed_pomodoros(), work_done);
        }
    }

    #[test]
    fn breaks_always_lead_to_work(cycle in 0u32..10) {
        prop_assert_eq!(next_session_type(SessionType::ShortBreak, cycle), SessionType::Work);
        prop_assert_eq!(next_session_type(SessionType::LongBreak, cycle), SessionType::Work);
    }
}

#[test]
fn seeded_count_does_not_trigger_long_break() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stats = pomocycle_core::DailyStatistics::new(date, 4, 0).unwrap();
    let mut session = Session::new();
    session.initialize_from_today_stats(&stats);

    session.start_session().unwrap();
    finish_countdown(&mut session);
    assert_eq!(
        session.handle_timer_completion().unwrap(),
        SessionType::ShortBreak
    );
}

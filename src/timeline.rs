// src/timeline.rs - Escalation timeline computation
//
// Pure functions over an ordered action list and an elapsed-time value.
// The external supervisor loop decides *when* to consult these; the
// computation itself lives here so it can be tested exhaustively.

use crate::model::{Action, Alarm, Severity};

/// Index of the escalation step that is current after `elapsed_ms`
/// milliseconds in the active state.
///
/// Walks the list in order accumulating `delay * 1000` and returns the
/// greatest index whose cumulative delay is `<= elapsed_ms`. Once the
/// timeline has fully played out the last index is returned indefinitely
/// (escalation holds at the final step). Returns `None` for an empty list
/// or when the elapsed time has not yet reached the first step.
///
/// Callers must gate on the alarm being active; state and elapsed time
/// are a package.
pub fn current_action_index(actions: &[Action], elapsed_ms: i64) -> Option<usize> {
    let mut current = None;
    let mut cumulative_ms: i64 = 0;
    for (i, action) in actions.iter().enumerate() {
        cumulative_ms += i64::from(action.delay) * 1000;
        if elapsed_ms >= cumulative_ms {
            current = Some(i);
        } else {
            break;
        }
    }
    current
}

/// Absolute epoch-millisecond execution time of step `index`, measured
/// from `reference_ms` (the instant the alarm became active).
///
/// Returns `None` when `index` is out of range; otherwise the reference
/// plus the inclusive cumulative delay up to and including `index`.
pub fn execution_time(actions: &[Action], index: usize, reference_ms: i64) -> Option<i64> {
    if index >= actions.len() {
        return None;
    }
    let cumulative_ms: i64 = actions[..=index]
        .iter()
        .map(|a| i64::from(a.delay) * 1000)
        .sum();
    Some(reference_ms + cumulative_ms)
}

/// Severity the alarm currently displays.
///
/// `None` unless the alarm is active. An active alarm whose timeline has
/// not reached any step yet (or whose change time was never stamped)
/// reports `Debug`; otherwise the current step's severity.
pub fn current_severity(alarm: &Alarm, now_ms: i64) -> Option<Severity> {
    if !alarm.is_active() {
        return None;
    }
    let index = if alarm.last_state_change_time == 0 {
        None
    } else {
        current_action_index(&alarm.start_actions, now_ms - alarm.last_state_change_time)
    };
    match index {
        Some(i) => Some(alarm.start_actions[i].severity),
        None => Some(Severity::Debug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionKind, AlarmState, NotifyParams};
    use proptest::prelude::*;

    fn actions(delays: &[u32]) -> Vec<Action> {
        delays
            .iter()
            .enumerate()
            .map(|(i, &delay)| Action {
                no: i as u32 + 1,
                kind: ActionKind::Sms(NotifyParams::default()),
                delay,
                severity: Severity::Warning,
            })
            .collect()
    }

    #[test]
    fn index_walks_cumulative_delays() {
        // Delays [0, 30, 60]s -> cumulative [0, 30000, 90000]ms.
        let list = actions(&[0, 30, 60]);
        assert_eq!(current_action_index(&list, 0), Some(0));
        assert_eq!(current_action_index(&list, 29_999), Some(0));
        assert_eq!(current_action_index(&list, 30_000), Some(1));
        assert_eq!(current_action_index(&list, 45_000), Some(1));
        assert_eq!(current_action_index(&list, 90_000), Some(2));
        // Beyond the timeline the escalation holds at the last step.
        assert_eq!(current_action_index(&list, 200_000), Some(2));
    }

    #[test]
    fn index_is_none_before_first_step_and_for_empty_list() {
        let list = actions(&[10, 20]);
        assert_eq!(current_action_index(&list, 0), None);
        assert_eq!(current_action_index(&list, 9_999), None);
        assert_eq!(current_action_index(&[], 1_000_000), None);
        assert_eq!(current_action_index(&[], 0), None);
    }

    #[test]
    fn zero_delay_duplicates_resolve_to_last() {
        // Two steps due at the same instant: the later one is current.
        let list = actions(&[0, 0, 30]);
        assert_eq!(current_action_index(&list, 0), Some(1));
        assert_eq!(current_action_index(&list, 30_000), Some(2));
    }

    #[test]
    fn execution_time_is_inclusive_cumulative() {
        let list = actions(&[0, 30, 60]);
        assert_eq!(execution_time(&list, 0, 1_000), Some(1_000));
        assert_eq!(execution_time(&list, 1, 1_000), Some(31_000));
        assert_eq!(execution_time(&list, 2, 1_000), Some(91_000));
        assert_eq!(execution_time(&list, 3, 1_000), None);
        assert_eq!(execution_time(&[], 0, 1_000), None);
    }

    #[test]
    fn severity_derivation() {
        let mut alarm = Alarm::new("a1", "Pump failure");
        alarm.start_actions = actions(&[10]);
        alarm.start_actions[0].severity = Severity::Error;

        // Not active: no severity at all.
        assert_eq!(current_severity(&alarm, 5_000), None);

        // Active but the first step is not due yet: debug.
        alarm.apply_state(AlarmState::Active, 1_000);
        assert_eq!(current_severity(&alarm, 5_000), Some(Severity::Debug));

        // First step reached: its configured severity.
        assert_eq!(current_severity(&alarm, 11_000), Some(Severity::Error));
    }

    #[test]
    fn severity_debug_when_change_time_never_stamped() {
        let mut alarm = Alarm::new("a1", "Valve stuck");
        alarm.state = AlarmState::Active;
        alarm.start_actions = actions(&[0]);
        assert_eq!(alarm.last_state_change_time, 0);
        assert_eq!(current_severity(&alarm, 999_999), Some(Severity::Debug));
    }

    proptest! {
        // For any step that is the last one at its cumulative delay,
        // feeding its own execution time back in must return its index.
        #[test]
        fn index_and_execution_time_agree(
            delays in proptest::collection::vec(0u32..600, 1..8),
            reference in 0i64..1_000_000_000,
        ) {
            let list = actions(&delays);
            for i in 0..list.len() {
                let due = execution_time(&list, i, reference).unwrap();
                let got = current_action_index(&list, due - reference).unwrap();
                // Ties from zero-delay steps resolve to the last index
                // sharing the same cumulative delay.
                prop_assert!(got >= i);
                prop_assert_eq!(
                    execution_time(&list, got, reference).unwrap(),
                    due
                );
            }
        }
    }
}

//! Property tests: arbitrary insert/delete sequences never break the
//! structural invariants, under either collapse policy.

use proptest::prelude::*;

use seatplan_logic::allocator::SeatingAllocator;
use seatplan_logic::config::{CollapsePolicy, TopologyConfig};
use seatplan_logic::integrity::Severity;

#[derive(Debug, Clone)]
enum Op {
    Insert { roll: u32, batch: u32, subject: &'static str },
    Delete { roll: u32 },
}

// -- Strategy helpers --

fn arb_subject() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("Math"), Just("Physics"), Just("Chemistry")]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u32..120, 21u32..=26, arb_subject())
            .prop_map(|(roll, batch, subject)| Op::Insert { roll, batch, subject }),
        1 => (0u32..120).prop_map(|roll| Op::Delete { roll }),
    ]
}

fn arb_policy() -> impl Strategy<Value = CollapsePolicy> {
    prop_oneof![Just(CollapsePolicy::Deferred), Just(CollapsePolicy::BorrowForward)]
}

fn error_issues(seats: &SeatingAllocator) -> Vec<String> {
    seats
        .validate_integrity()
        .into_iter()
        .filter(|issue| issue.severity == Severity::Error)
        .map(|issue| format!("[{}] {}", issue.category, issue.message))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_after_every_operation(
        ops in prop::collection::vec(arb_op(), 1..80),
        policy in arb_policy(),
    ) {
        let config = TopologyConfig::new(1, 2, 2, 3).with_collapse_policy(policy);
        let mut seats = SeatingAllocator::new(config).unwrap();
        let mut expected = 0usize;

        for op in ops {
            let before = seats.snapshot();
            match op {
                Op::Insert { roll, batch, subject } => match seats.insert_student(roll, batch, subject) {
                    Ok(_) => expected += 1,
                    Err(_) => {
                        prop_assert_eq!(seats.snapshot(), before);
                    }
                },
                Op::Delete { roll } => match seats.delete_student(roll) {
                    Ok(removal) => {
                        prop_assert_eq!(removal.student.roll_number(), roll);
                        expected -= 1;
                    }
                    Err(_) => {
                        prop_assert_eq!(seats.snapshot(), before);
                    }
                },
            }

            prop_assert_eq!(seats.occupied(), expected);
            let issues = error_issues(&seats);
            prop_assert!(issues.is_empty(), "integrity errors: {:?}", issues);
        }
    }

    #[test]
    fn distinct_rolls_always_fit_until_pool_is_full(
        rolls in prop::collection::hash_set(0u32..500, 1..18),
    ) {
        // One room, grid 6: even pool holds 18 seats; one subject, so the
        // clustering rule never refuses.
        let mut seats = SeatingAllocator::new(TopologyConfig::new(1, 1, 1, 6)).unwrap();
        for &roll in &rolls {
            prop_assert!(seats.insert_student(roll, 22, "Math").is_ok());
        }
        let seated: Vec<u32> = seats.students().map(|l| l.student.roll_number()).collect();
        let mut sorted: Vec<u32> = rolls.into_iter().collect();
        sorted.sort_unstable();
        prop_assert_eq!(seated, sorted);
    }
}

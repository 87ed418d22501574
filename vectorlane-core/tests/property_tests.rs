use std::time::Duration;

use proptest::prelude::*;
use vectorlane_core::param::{CreatePartition, LoadCollection};
use vectorlane_core::validation::{check_name, is_valid_name, MAX_NAME_LENGTH};
use vectorlane_core::{DataType, FieldType, ManualClock, Poller, TaskHandle, TaskKind, TaskState, TaskStatus, WaitPolicy};

proptest! {
    #[test]
    fn test_well_formed_names_are_accepted(name in "[A-Za-z_][A-Za-z0-9_]{0,254}") {
        prop_assert!(is_valid_name(&name));
        prop_assert!(check_name("collection_name", &name).is_ok());
    }

    #[test]
    fn test_leading_digit_is_rejected(name in "[0-9][A-Za-z0-9_]{0,20}") {
        let err = check_name("collection_name", &name).unwrap_err();
        prop_assert!(err.to_string().contains("must start with a letter or underscore"));
    }

    #[test]
    fn test_overlong_names_are_rejected(extra in 1usize..64) {
        let name = "a".repeat(MAX_NAME_LENGTH + extra);
        let err = check_name("alias", &name).unwrap_err();
        prop_assert_eq!(err.field(), Some("alias"));
        prop_assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_build_is_idempotent(
        collection in "[a-z_][a-z0-9_]{0,30}",
        partition in "[a-z_][a-z0-9_]{0,30}",
        timeout_ms in 0u64..10_000,
    ) {
        let builder = CreatePartition::builder()
            .with_collection_name(collection)
            .with_partition_name(partition)
            .with_timeout(Duration::from_millis(timeout_ms));
        prop_assert_eq!(builder.build().unwrap(), builder.build().unwrap());
    }

    #[test]
    fn test_vector_dimension_range(dim in 0u32..40_000) {
        let result = FieldType::builder()
            .with_name("embedding")
            .with_data_type(DataType::FloatVector)
            .with_dimension(dim)
            .build();
        prop_assert_eq!(result.is_ok(), (1..=32768).contains(&dim));
    }

    #[test]
    fn test_interval_is_validated(interval_ms in 0u64..5_000) {
        let result = LoadCollection::builder()
            .with_collection_name("books")
            .with_waiting_interval(Duration::from_millis(interval_ms))
            .build();
        prop_assert_eq!(result.is_ok(), interval_ms > 0);
    }

    #[test]
    fn test_wait_never_overshoots_by_more_than_one_interval(
        interval_ms in 1u64..1_000,
        timeout_ms in 1u64..10_000,
    ) {
        let clock = ManualClock::new();
        let policy = WaitPolicy::new(
            Duration::from_millis(interval_ms),
            Some(Duration::from_millis(timeout_ms)),
        )
        .unwrap();
        let handle = TaskHandle::new(1, TaskKind::Load, "books");

        let mut polls = 0u64;
        let err = Poller::new(&clock)
            .wait_for_completion(&handle, &policy, |_| {
                polls += 1;
                Ok(TaskStatus::new(TaskState::InProgress))
            })
            .unwrap_err();

        prop_assert!(err.is_timeout());
        prop_assert!(clock.elapsed() >= Duration::from_millis(timeout_ms));
        prop_assert!(clock.elapsed() < Duration::from_millis(timeout_ms + interval_ms));
        prop_assert_eq!(polls, clock.sleeps().len() as u64 + 1);
    }
}

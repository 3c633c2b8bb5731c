//! Property tests for command toggling and duration parsing.

use chrono::TimeDelta;
use modgate_commands::{
    parse_duration_at, CommandError, CommandRegistry, CommandToggle, MemoryDisabledStore,
};
use modgate_common::test_utils::{mock_timestamp, property_testing::chat_id_strategy};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const COMMANDS: [&str; 4] = ["rules", "notes", "disabled", "disableable"];

fn toggle() -> CommandToggle {
    let mut registry = CommandRegistry::with_builtin();
    registry.register("rules", &["regeln"], true);
    registry.register("notes", &["saved"], true);
    CommandToggle::new(Arc::new(registry), Arc::new(MemoryDisabledStore::new()))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Disable(usize),
    Enable(usize),
    EnableAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..COMMANDS.len()).prop_map(Op::Disable),
        (0..COMMANDS.len()).prop_map(Op::Enable),
        Just(Op::EnableAll),
    ]
}

proptest! {
    #[test]
    fn prop_toggle_matches_set_model(
        chat in chat_id_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..40)
    ) {
        let rt = runtime();
        let toggle = toggle();
        let mut model: Vec<&str> = Vec::new();

        rt.block_on(async {
            for op in ops {
                match op {
                    Op::Disable(i) => {
                        let result = toggle.disable(chat, COMMANDS[i]).await;
                        if model.contains(&COMMANDS[i]) {
                            let already = matches!(result, Err(CommandError::AlreadyDisabled { .. }));
                            prop_assert!(already, "second disable of {} must be rejected", COMMANDS[i]);
                        } else {
                            prop_assert_eq!(result.unwrap(), COMMANDS[i]);
                            model.push(COMMANDS[i]);
                        }
                    }
                    Op::Enable(i) => {
                        let result = toggle.enable(chat, COMMANDS[i]).await;
                        if let Some(pos) = model.iter().position(|c| *c == COMMANDS[i]) {
                            prop_assert!(result.is_ok());
                            model.remove(pos);
                        } else {
                            let already = matches!(result, Err(CommandError::AlreadyEnabled { .. }));
                            prop_assert!(already, "enabling active {} must be rejected", COMMANDS[i]);
                        }
                    }
                    Op::EnableAll => {
                        let result = toggle.enable_all_confirm(chat).await;
                        if model.is_empty() {
                            let nothing = matches!(result, Err(CommandError::NothingDisabled));
                            prop_assert!(nothing, "enable-all on an empty set must be rejected");
                        } else {
                            prop_assert_eq!(result.unwrap(), model.len());
                            model.clear();
                        }
                    }
                }

                let exported = toggle.export(chat).await.unwrap().disabled;
                prop_assert_eq!(&exported, &model);
                for command in COMMANDS {
                    prop_assert_eq!(
                        toggle.is_disabled(chat, command).await.unwrap(),
                        model.contains(&command)
                    );
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_alias_spellings_agree(
        chat in chat_id_strategy(),
        prefix in prop::sample::select(vec!["", "/", "!"]),
        upper in any::<bool>()
    ) {
        let rt = runtime();
        let toggle = toggle();
        let alias = if upper { "REGELN" } else { "regeln" };
        let spelled = format!("{prefix}{alias}");

        rt.block_on(async {
            prop_assert_eq!(toggle.disable(chat, &spelled).await.unwrap(), "rules");
            prop_assert!(toggle.is_disabled(chat, "rules").await.unwrap());
            prop_assert!(toggle.is_disabled(chat, "regeln").await.unwrap());
            let unique: HashSet<String> = toggle.export(chat).await.unwrap().disabled.into_iter().collect();
            prop_assert_eq!(unique.len(), 1);
            Ok(())
        })?;
    }

    #[test]
    fn prop_valid_durations_add_exactly(amount in 1i64..10_000, unit in prop::sample::select(vec!['m', 'h', 'd', 'w', 'M', 'H', 'D', 'W'])) {
        let now = mock_timestamp(2024, 1, 1, 0, 0, 0);
        let expected = match unit.to_ascii_lowercase() {
            'm' => TimeDelta::minutes(amount),
            'h' => TimeDelta::hours(amount),
            'd' => TimeDelta::days(amount),
            _ => TimeDelta::weeks(amount),
        };
        prop_assert_eq!(parse_duration_at(&format!("{amount}{unit}"), now).unwrap(), now + expected);
    }

    #[test]
    fn prop_tokens_without_unit_are_rejected(token in "[0-9]{0,6}[a-ce-gi-lnoqrs-vx-z]?") {
        let now = mock_timestamp(2024, 1, 1, 0, 0, 0);
        let rejected = matches!(
            parse_duration_at(&token, now),
            Err(CommandError::InvalidTimeUnit { .. })
        );
        prop_assert!(rejected, "{} should be rejected", token);
    }
}

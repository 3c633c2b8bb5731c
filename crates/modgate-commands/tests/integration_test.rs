//! Integration tests for modgate-commands crate.
//!
//! Commands run end to end through `ModerationHandlers::run` against the
//! in-memory chat backend.

use chrono::{TimeDelta, Utc};
use modgate_commands::{
    create_handlers_with_store, CommandError, ErrorKind, Invocation, LeaveOutcome,
    MemoryDisabledStore, MentionResolver, ModerationHandlers, ReplyContext, ENABLE_ALL_CANCEL,
    ENABLE_ALL_CONFIRM,
};
use modgate_common::test_utils::{fixtures::*, init_test_logging, BackendCall, MemoryBackend};
use modgate_common::{MessageId, UserId};
use modgate_config::Config;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    backend: Arc<MemoryBackend>,
    handlers: ModerationHandlers,
}

fn harness_with(config: &Config) -> Harness {
    init_test_logging();
    let backend = Arc::new(
        MemoryBackend::new(BOT)
            .with_admin(CHAT, ADMIN)
            .with_admin(CHAT, CO_ADMIN),
    );
    let handlers = create_handlers_with_store(
        config,
        backend.clone(),
        Arc::new(MentionResolver),
        Arc::new(MemoryDisabledStore::new()),
    )
    .unwrap();
    Harness { backend, handlers }
}

fn harness() -> Harness {
    harness_with(&Config::default())
}

fn command(args: &str) -> Invocation {
    Invocation::new(CHAT, ADMIN, COMMAND_MESSAGE, args)
}

fn mention(user: UserId) -> String {
    format!("<@{user}>")
}

#[tokio::test(start_paused = true)]
async fn test_silent_mute_marks_and_cleans_up() {
    let Harness { backend, handlers } = harness();

    let response = handlers
        .run("smute", &command(&mention(MEMBER)))
        .await
        .unwrap();

    assert_eq!(
        response.text,
        "@user20 was muted by @user10 in Test Chat 1.\nThis message will be deleted in 5 seconds."
    );
    assert_eq!(backend.calls(), vec![BackendCall::Mute(CHAT, MEMBER, None)]);

    // the bot's own removal of the marked user hides the notice
    let event = backend.leave_event(CHAT, MEMBER, BOT);
    assert_eq!(
        handlers.coordinator().on_member_left_event(&event).await,
        LeaveOutcome::Suppressed
    );

    tokio::time::sleep(Duration::from_secs(6)).await;
    let deleted = backend.deleted();
    assert!(deleted.contains(&(CHAT, response.message_id)));
    assert!(deleted.contains(&(CHAT, COMMAND_MESSAGE)));
    assert!(deleted.contains(&(CHAT, event.notice_message_id.unwrap())));
    assert_eq!(deleted.len(), 3);
}

#[tokio::test]
async fn test_leave_after_marker_expiry_is_not_suppressed() {
    let mut config = Config::default();
    config.moderation.silent_marker_ttl_secs = 1;
    config.moderation.cleanup_delay_secs = 0;
    let Harness { backend, handlers } = harness_with(&config);

    handlers
        .run("skick", &command(&mention(MEMBER)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let event = backend.leave_event(CHAT, MEMBER, BOT);
    assert_eq!(
        handlers.coordinator().on_member_left_event(&event).await,
        LeaveOutcome::NoMarker
    );
    assert!(!backend.deleted().contains(&(CHAT, event.notice_message_id.unwrap())));
}

#[tokio::test(start_paused = true)]
async fn test_silent_kick_by_reply_deletes_target_message() {
    let Harness { backend, handlers } = harness();
    let offending = MessageId(77);
    let invocation = command("").replying_to(ReplyContext {
        message_id: offending,
        author_id: MEMBER,
    });

    let response = handlers.run("skick", &invocation).await.unwrap();
    assert_eq!(backend.calls(), vec![BackendCall::Kick(CHAT, MEMBER)]);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(
        backend.calls().last(),
        Some(&BackendCall::Delete(
            CHAT,
            vec![response.message_id, COMMAND_MESSAGE, offending]
        ))
    );
}

#[tokio::test]
async fn test_temporal_ban_expires_in_a_day() {
    let Harness { backend, handlers } = harness();

    let before = Utc::now();
    let response = handlers
        .run("tban", &command(&format!("{} 1d spamming", mention(MEMBER))))
        .await
        .unwrap();
    let after = Utc::now();

    let until = match backend.calls().as_slice() {
        [BackendCall::Ban(chat, user, Some(until))] => {
            assert_eq!((*chat, *user), (CHAT, MEMBER));
            *until
        }
        calls => panic!("unexpected calls: {calls:?}"),
    };
    assert!(until >= before + TimeDelta::days(1));
    assert!(until <= after + TimeDelta::days(1));

    assert_eq!(
        response.text,
        "@user20 was banned by @user10 in Test Chat 1.\nFor 1 day.\nReason: spamming"
    );
}

#[tokio::test]
async fn test_temporal_variant_by_reply_reads_duration_first() {
    let Harness { backend, handlers } = harness();
    let invocation = command("2h flooding").replying_to(ReplyContext {
        message_id: MessageId(80),
        author_id: MEMBER,
    });

    let response = handlers.run("tmute", &invocation).await.unwrap();

    assert!(matches!(
        backend.calls().as_slice(),
        [BackendCall::Mute(_, user, Some(_))] if *user == MEMBER
    ));
    assert!(response.text.ends_with("For 2 hours.\nReason: flooding"));
}

#[tokio::test]
async fn test_temporal_variant_argument_errors() {
    let Harness { backend, handlers } = harness();

    let error = handlers
        .run("tmute", &command(&mention(MEMBER)))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::MissingTimeArgument));
    assert_eq!(
        backend.last_text().as_deref(),
        Some("Please enter a duration, for example 2h or 3d.")
    );

    let error = handlers
        .run("stban", &command(&format!("{} 3y", mention(MEMBER))))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Argument);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_bot_target_reported_first() {
    let Harness { backend, handlers } = harness();

    let error = handlers
        .run("ban", &command(&mention(BOT)))
        .await
        .unwrap_err();

    assert!(matches!(error, CommandError::TargetIsSelf { .. }));
    assert_eq!(
        backend.last_text().as_deref(),
        Some("I'm not going to ban myself.")
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_admin_and_invoker_targets_rejected() {
    let Harness { backend, handlers } = harness();

    let error = handlers
        .run("kick", &command(&mention(CO_ADMIN)))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::TargetIsAdmin { .. }));

    let error = handlers
        .run("unmute", &command(&mention(ADMIN)))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::TargetIsInvoker { .. }));
    assert_eq!(
        backend.last_text().as_deref(),
        Some("You can't unmute yourself.")
    );
}

#[tokio::test]
async fn test_non_admin_cannot_restrict() {
    let Harness { backend, handlers } = harness();
    let invocation = Invocation::new(CHAT, UserId(30), COMMAND_MESSAGE, mention(MEMBER));

    let error = handlers.run("ban", &invocation).await.unwrap_err();
    assert!(matches!(error, CommandError::InvokerNotAdmin));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_failed_mutation_sends_no_success_text() {
    let Harness { backend, handlers } = harness();
    backend.fail_mutations(true);

    let error = handlers
        .run("sban", &command(&mention(MEMBER)))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Backend);
    let sent = backend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].2.text,
        "Something went wrong while talking to the chat. Nothing was changed."
    );
}

#[tokio::test]
async fn test_unknown_target_and_ambiguity_are_validation_errors() {
    let Harness { backend, handlers } = harness();

    let error = handlers.run("mute", &command("somebody")).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(
        backend.last_text().as_deref(),
        Some("I couldn't find that user.")
    );

    let error = handlers.run("mute", &command("")).await.unwrap_err();
    assert!(matches!(error, CommandError::MissingTarget));
}

#[tokio::test]
async fn test_disable_enable_flow() {
    let Harness { backend, handlers } = harness();

    let response = handlers.run("disable", &command("/Disablable")).await.unwrap();
    assert_eq!(response.text, "Disabled disableable in Test Chat 1.");

    let error = handlers.run("disable", &command("disableable")).await.unwrap_err();
    assert!(matches!(error, CommandError::AlreadyDisabled { .. }));
    assert_eq!(
        backend.last_text().as_deref(),
        Some("This command is already disabled.")
    );

    let listing = handlers.run("disabled", &command("")).await.unwrap();
    assert_eq!(
        listing.text,
        "Disabled commands in Test Chat 1:\n* disableable"
    );

    handlers.run("enable", &command("disableable")).await.unwrap();
    let listing = handlers.run("disabled", &command("")).await.unwrap();
    assert_eq!(listing.text, "No commands are disabled in Test Chat 1.");

    let error = handlers.run("disable", &command("ban")).await.unwrap_err();
    assert!(matches!(error, CommandError::NotDisablable { .. }));

    let error = handlers.run("enable", &command("")).await.unwrap_err();
    assert!(matches!(error, CommandError::MissingArgument));
}

#[tokio::test]
async fn test_disableable_lists_registry() {
    let Harness { handlers, .. } = harness();
    let invocation = Invocation::new(CHAT, MEMBER, COMMAND_MESSAGE, "");

    let response = handlers.run("disablable", &invocation).await.unwrap();
    assert_eq!(
        response.text,
        "Commands that can be disabled:\n* disableable\n* disabled"
    );
}

#[tokio::test]
async fn test_enable_all_requires_confirmation() {
    let Harness { backend, handlers } = harness();

    let error = handlers.run("enableall", &command("")).await.unwrap_err();
    assert!(matches!(error, CommandError::NothingDisabled));
    assert_eq!(
        backend.last_text().as_deref(),
        Some("Nothing is disabled in Test Chat 1.")
    );

    handlers.run("disable", &command("disabled")).await.unwrap();
    handlers.run("disable", &command("disableable")).await.unwrap();

    let prompt = handlers.run("enableall", &command("")).await.unwrap();
    let (_, _, sent) = backend.sent().last().cloned().unwrap();
    assert_eq!(
        sent.buttons
            .iter()
            .map(|button| button.callback.as_str())
            .collect::<Vec<_>>(),
        vec![ENABLE_ALL_CONFIRM, ENABLE_ALL_CANCEL]
    );
    assert_eq!(handlers.export(CHAT).await.unwrap().disabled.len(), 2);

    let press = Invocation::new(CHAT, CO_ADMIN, prompt.message_id, "");
    let done = handlers.on_button(ENABLE_ALL_CONFIRM, &press).await.unwrap();
    assert_eq!(done.text, "Enabled 2 commands in Test Chat 1.");
    assert_eq!(
        backend.edited(),
        vec![(CHAT, prompt.message_id, done.text.clone())]
    );
    assert!(handlers.export(CHAT).await.unwrap().disabled.is_empty());

    // a second press finds nothing left
    let error = handlers.on_button(ENABLE_ALL_CONFIRM, &press).await.unwrap_err();
    assert!(matches!(error, CommandError::NothingDisabled));
}

#[tokio::test]
async fn test_enable_all_cancel_and_non_admin_press() {
    let Harness { backend, handlers } = harness();
    handlers.run("disable", &command("disabled")).await.unwrap();
    let prompt = handlers.run("enableall", &command("")).await.unwrap();

    let stranger = Invocation::new(CHAT, MEMBER, prompt.message_id, "");
    let error = handlers.on_button(ENABLE_ALL_CONFIRM, &stranger).await.unwrap_err();
    assert!(matches!(error, CommandError::InvokerNotAdmin));

    let press = Invocation::new(CHAT, ADMIN, prompt.message_id, "");
    handlers.on_button(ENABLE_ALL_CANCEL, &press).await.unwrap();

    assert_eq!(
        backend.edited().last().map(|(_, _, text)| text.as_str()),
        Some("Cancelled, nothing was enabled.")
    );
    assert_eq!(handlers.export(CHAT).await.unwrap().disabled, vec!["disabled"]);
}

#[tokio::test]
async fn test_gate_lets_admins_through() {
    let Harness { handlers, .. } = harness();
    handlers.run("disable", &command("disabled")).await.unwrap();

    let member = Invocation::new(CHAT, MEMBER, COMMAND_MESSAGE, "");
    assert!(!handlers.gate("/disabled", &member).await.unwrap());
    assert!(handlers.gate("disabled", &command("")).await.unwrap());
    assert!(handlers.gate("disableable", &member).await.unwrap());
}

#[tokio::test]
async fn test_unknown_command() {
    let Harness { handlers, .. } = harness();
    let error = handlers.run("frobnicate", &command("")).await.unwrap_err();
    assert!(matches!(error, CommandError::UnknownCommand(name) if name == "frobnicate"));
}

//! Integration tests for modgate-bot.
//!
//! The Discord side cannot run without a gateway, so these tests check that
//! the registered prefix commands and the moderation handlers agree on names,
//! and drive the handlers the way the command check and button router do.

use modgate_bot::commands;
use modgate_commands::{
    create_handlers_with_store, CommandError, Invocation, MemoryDisabledStore, MentionResolver,
    ModerationHandlers, ENABLE_ALL_CONFIRM,
};
use modgate_common::test_utils::{fixtures::*, init_test_logging, MemoryBackend};
use modgate_common::MessageId;
use modgate_config::Config;
use std::sync::Arc;

fn handlers(backend: &Arc<MemoryBackend>) -> ModerationHandlers {
    create_handlers_with_store(
        &Config::default(),
        Arc::clone(backend) as _,
        Arc::new(MentionResolver),
        Arc::new(MemoryDisabledStore::new()),
    )
    .unwrap()
}

fn command_names() -> Vec<String> {
    commands::all()
        .into_iter()
        .flat_map(|command| {
            let mut names = vec![command.name.clone()];
            names.extend(command.aliases.iter().cloned());
            names
        })
        .collect()
}

#[test]
fn test_every_variant_is_registered() {
    let names = command_names();
    for expected in [
        "kick", "skick", "mute", "smute", "tmute", "stmute", "unmute", "ban", "sban", "tban",
        "stban", "unban", "disable", "enable", "enableall", "disabled", "disableable",
        "disablable",
    ] {
        assert!(names.iter().any(|name| name == expected), "{expected} missing");
    }
}

#[tokio::test]
async fn test_handlers_know_every_registered_name() {
    init_test_logging();
    let backend = Arc::new(MemoryBackend::new(BOT));
    let handlers = handlers(&backend);
    let invocation = Invocation::new(CHAT, MEMBER, COMMAND_MESSAGE, "");

    for name in command_names() {
        match handlers.run(&name, &invocation).await {
            Ok(_) | Err(CommandError::InvokerNotAdmin) => {}
            Err(other) => panic!("{name} failed with {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_disabled_listing_is_gated_for_members_only() {
    let backend = Arc::new(MemoryBackend::new(BOT).with_admin(CHAT, ADMIN));
    let handlers = handlers(&backend);

    handlers
        .run("disable", &Invocation::new(CHAT, ADMIN, COMMAND_MESSAGE, "disabled"))
        .await
        .unwrap();

    let member = Invocation::new(CHAT, MEMBER, COMMAND_MESSAGE, "");
    let admin = Invocation::new(CHAT, ADMIN, COMMAND_MESSAGE, "");
    assert!(!handlers.gate("disabled", &member).await.unwrap());
    assert!(handlers.gate("disabled", &admin).await.unwrap());
    assert!(handlers.gate("disableable", &member).await.unwrap());
}

#[tokio::test]
async fn test_enableall_button_round_trip() {
    let backend = Arc::new(MemoryBackend::new(BOT).with_admin(CHAT, ADMIN));
    let handlers = handlers(&backend);
    let command = Invocation::new(CHAT, ADMIN, COMMAND_MESSAGE, "");

    handlers
        .run("disable", &Invocation::new(CHAT, ADMIN, COMMAND_MESSAGE, "disableable"))
        .await
        .unwrap();
    let prompt = handlers.run("enableall", &command).await.unwrap();

    let (_, _, sent) = backend.sent().pop().unwrap();
    assert!(sent.buttons.iter().any(|b| b.callback == ENABLE_ALL_CONFIRM));

    let member_press = Invocation::new(CHAT, MEMBER, prompt.message_id, "");
    let error = handlers
        .on_button(ENABLE_ALL_CONFIRM, &member_press)
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::InvokerNotAdmin));
    assert_eq!(
        handlers.render_error(CHAT, &error).await,
        "Only chat admins can do that."
    );

    let admin_press = Invocation::new(CHAT, ADMIN, prompt.message_id, "");
    let done = handlers
        .on_button(ENABLE_ALL_CONFIRM, &admin_press)
        .await
        .unwrap();
    assert_eq!(done.message_id, prompt.message_id);
    assert_ne!(done.message_id, MessageId(0));
    assert!(handlers.export(CHAT).await.unwrap().disabled.is_empty());
}

//! Dispatcher behaviour against a recording bot and an in-memory store

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bidoof_bot::application::errors::CommandError;
use bidoof_bot::application::services::HELLO_USAGE;
use bidoof_bot::application::supervisor::TaskOutcome;
use bidoof_bot::domain::entities::{ChatKind, Command, InboundEvent};
use bidoof_bot::domain::traits::{CommandScope, ParseMode};
use common::*;
use tokio::sync::mpsc;

#[tokio::test]
async fn hello_from_known_chat_delivers_rich_reply() {
    let h = Harness::new();
    h.register_ash().await;

    let outcome = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();

    assert!(outcome.is_success());
    let sent = h.bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, ASH_CHAT);
    assert_eq!(sent[0].parse_mode, ParseMode::MarkdownV2);
    assert!(sent[0].text.contains("Ash"));
    assert!(sent[0].text.contains("Pikachu"));
}

#[tokio::test]
async fn hello_with_wrong_arity_replies_usage() {
    let h = Harness::new();
    h.register_ash().await;

    for raw in ["Ash", "", "Ash Pikachu Brock"] {
        let outcome = h.dispatcher.process(private_command("hello", raw)).await.unwrap();
        assert!(outcome.is_success());
    }

    let sent = h.bot.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|m| m.text == HELLO_USAGE));
    assert!(sent.iter().all(|m| m.parse_mode == ParseMode::Plain));
}

#[tokio::test]
async fn plain_text_is_ignored() {
    let h = Harness::new();
    h.register_ash().await;

    let event = InboundEvent::text(ASH_CHAT, ChatKind::Private, ash());
    assert!(h.dispatcher.process(event.clone()).await.is_none());
    assert!(h.dispatcher.dispatch(event).is_none());

    assert!(h.bot.sent().is_empty());
    assert_eq!(h.store.lookups(), 0);
}

#[tokio::test]
async fn group_chat_gets_notice_without_store_access() {
    let h = Harness::new();
    h.register_ash().await;

    for kind in [ChatKind::Group, ChatKind::Supergroup] {
        let event = InboundEvent::command(-100, kind, ash(), "hello", "Ash Pikachu");
        let outcome = h.dispatcher.process(event).await.unwrap();
        assert!(outcome.is_success());
    }

    let sent = h.bot.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.chat_id == -100));
    assert!(sent.iter().all(|m| m.text == h.config.bot.messages.group_chat));
    assert_eq!(h.store.lookups(), 0);
}

#[tokio::test]
async fn unknown_sender_is_dropped_silently() {
    let h = Harness::new();

    let outcome = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(h.bot.sent().is_empty());
    assert_eq!(h.store.lookups(), 1);
}

#[tokio::test]
async fn unknown_command_gets_notice() {
    let h = Harness::new();
    h.register_ash().await;

    let outcome = h.dispatcher.process(private_command("ghost", "")).await.unwrap();

    assert!(outcome.is_success());
    let sent = h.bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, h.config.bot.messages.unknown_command);
}

#[tokio::test]
async fn start_registers_then_reports_already_awake() {
    let h = Harness::new();

    let first = h.dispatcher.process(private_command("start", "")).await.unwrap();
    assert!(first.is_success());

    let chat = h.known(ASH_CHAT).await.expect("chat registered");
    assert_eq!(chat.username, "ash");
    assert_eq!(chat.display_name, "Ash Ketchum");

    let second = h.dispatcher.process(private_command("start", "")).await.unwrap();
    assert!(second.is_success());

    let sent = h.bot.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].text.contains("thank you for waking me"));
    assert!(sent[1].text.contains("already awaken"));
}

#[tokio::test]
async fn concurrent_starts_from_one_chat_are_not_faults() {
    let h = Harness::new();
    h.store.slow_lookups(Duration::from_millis(20));

    let first = h
        .dispatcher
        .dispatch(private_command("start", ""))
        .expect("command spawns a task");
    let second = h
        .dispatcher
        .dispatch(private_command("start", ""))
        .expect("command spawns a task");

    assert!(first.await.unwrap().is_success());
    assert!(second.await.unwrap().is_success());
    assert!(h.known(ASH_CHAT).await.is_some());

    let sent = h.bot.sent();
    assert_eq!(sent.len(), 2);
    let welcomes = sent.iter().filter(|m| m.text.contains("thank you for waking me")).count();
    let notices = sent.iter().filter(|m| m.text.contains("already awaken")).count();
    assert_eq!((welcomes, notices), (1, 1));
    let apology = h.config.bot.messages.apology_for("Ash Ketchum");
    assert!(sent.iter().all(|m| m.text != apology));
}

#[tokio::test]
async fn stop_unregisters_the_chat() {
    let h = Harness::new();
    h.register_ash().await;

    let outcome = h.dispatcher.process(private_command("stop", "")).await.unwrap();

    assert!(outcome.is_success());
    assert!(h.known(ASH_CHAT).await.is_none());
    let sent = h.bot.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].parse_mode, ParseMode::MarkdownV2);

    // the chat is unknown now, so stop is dropped by the identity gate
    h.dispatcher.process(private_command("stop", "")).await.unwrap();
    assert_eq!(h.bot.sent().len(), 1);
}

#[tokio::test]
async fn failing_handler_yields_one_apology() {
    let mut registry = default_registry();
    registry
        .register(Command::new("pokedex").with_description("Not written yet"))
        .unwrap();
    let h = Harness::with_registry(registry, config_with_timeout(5));
    h.register_ash().await;

    let outcome = h.dispatcher.process(private_command("pokedex", "")).await.unwrap();

    assert!(matches!(outcome, TaskOutcome::Failure(CommandError::Unimplemented(ref n)) if n == "pokedex"));
    let sent = h.bot.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Ash Ketchum"));
    assert!(!sent[0].text.contains("pokedex"));
}

#[tokio::test]
async fn panicking_handler_yields_one_apology_and_dispatcher_survives() {
    let mut registry = default_registry();
    registry
        .register(Command::new("boom").with_handler(|_ctx| async {
            if true {
                panic!("index out of range");
            }
            Ok(())
        }))
        .unwrap();
    let h = Harness::with_registry(registry, config_with_timeout(5));
    h.register_ash().await;

    let outcome = h.dispatcher.process(private_command("boom", "")).await.unwrap();
    match outcome {
        TaskOutcome::Panic(msg) => assert!(msg.contains("index out of range")),
        other => panic!("expected panic outcome, got {}", other.label()),
    }
    assert_eq!(h.bot.sent().len(), 1);
    assert_eq!(
        h.bot.sent()[0].text,
        h.config.bot.messages.apology_for("Ash Ketchum")
    );

    let next = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();
    assert!(next.is_success());
    assert_eq!(h.bot.sent().len(), 2);
}

#[tokio::test]
async fn store_failure_at_identity_gate_is_a_fault() {
    let h = Harness::new();
    h.store.break_down();

    let outcome = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();

    assert!(matches!(outcome, TaskOutcome::Failure(CommandError::Storage(_))));
    assert_eq!(h.bot.sent().len(), 1);
}

#[tokio::test]
async fn delivery_failure_is_swallowed() {
    let h = Harness::new();
    h.register_ash().await;
    h.bot.fail_sends();

    let outcome = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(h.bot.sent().is_empty());
}

#[tokio::test]
async fn slow_handler_times_out_without_reply() {
    let finished = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&finished);

    let mut registry = default_registry();
    registry
        .register(Command::new("nap").with_handler(move |_ctx| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(1500)).await;
                flag.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }))
        .unwrap();
    let h = Harness::with_registry(registry, config_with_timeout(1));
    h.register_ash().await;

    let outcome = h.dispatcher.process(private_command("nap", "")).await.unwrap();

    assert!(matches!(outcome, TaskOutcome::TimedOut));
    assert!(h.bot.sent().is_empty());

    // the detached task still runs to completion
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert!(h.bot.sent().is_empty());
}

#[tokio::test]
async fn shutdown_cancels_without_reply() {
    let h = Harness::new();
    h.register_ash().await;
    h.supervisor.cancel();

    let outcome = h
        .dispatcher
        .process(private_command("hello", "Ash Pikachu"))
        .await
        .unwrap();

    assert!(matches!(outcome, TaskOutcome::Canceled));
    assert!(h.bot.sent().is_empty());
    assert_eq!(h.store.lookups(), 0);
}

#[tokio::test]
async fn dispatch_returns_handle_for_commands() {
    let h = Harness::new();
    h.register_ash().await;

    let handle = h
        .dispatcher
        .dispatch(private_command("hello", "Ash Pikachu"))
        .expect("command spawns a task");
    assert!(handle.await.unwrap().is_success());
    assert_eq!(h.bot.sent().len(), 1);
}

#[tokio::test]
async fn serve_drains_channel_until_closed() {
    let h = Harness::new();
    h.register_ash().await;

    let (tx, rx) = mpsc::channel(8);
    let serving = tokio::spawn(Arc::clone(&h.dispatcher).serve(rx));

    tx.send(InboundEvent::text(ASH_CHAT, ChatKind::Private, ash()))
        .await
        .unwrap();
    tx.send(private_command("hello", "Ash Pikachu")).await.unwrap();
    tx.send(private_command("hello", "Misty Togepi")).await.unwrap();
    drop(tx);
    serving.await.unwrap();

    for _ in 0..50 {
        if h.bot.sent().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(h.bot.sent().len(), 2);
}

#[tokio::test]
async fn default_menu_is_published_for_private_chats() {
    let bot = RecordingBot::new();
    default_registry().publish(&*bot).await.unwrap();

    let menus = bot.menus();
    assert_eq!(menus.len(), 1);
    let (commands, scope) = &menus[0];
    assert_eq!(*scope, CommandScope::AllPrivateChats);
    let names: Vec<&str> = commands.iter().map(|c| c.command.as_str()).collect();
    assert_eq!(names, vec!["hello", "start", "stop"]);
}

#[tokio::test]
async fn menu_publish_failure_is_reported() {
    let bot = RecordingBot::new();
    bot.fail_menu();
    assert!(default_registry().publish(&*bot).await.is_err());
}

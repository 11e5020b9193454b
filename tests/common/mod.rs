//! Shared fakes for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bidoof_bot::application::errors::{BotError, StorageError};
use bidoof_bot::application::messaging::UpdateDispatcher;
use bidoof_bot::application::services::{ChatGateway, CommandService};
use bidoof_bot::application::supervisor::TaskSupervisor;
use bidoof_bot::domain::entities::{ChatFilter, ChatIdentity, ChatKind, CommandRegistry, InboundEvent, Sender};
use bidoof_bot::domain::traits::{
    Bot, BotCommand, BotInfo, ChatStore, CommandScope, DeliveryReceipt, ParseMode,
};
use bidoof_bot::infrastructure::config::Config;
use bidoof_bot::infrastructure::database::SqliteChatStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: ParseMode,
}

/// Bot that records every outbound call instead of talking to Telegram
#[derive(Default)]
pub struct RecordingBot {
    sent: Mutex<Vec<SentMessage>>,
    menus: Mutex<Vec<(Vec<BotCommand>, CommandScope)>>,
    fail_sends: AtomicBool,
    fail_menu: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn menus(&self) -> Vec<(Vec<BotCommand>, CommandScope)> {
        self.menus.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_menu(&self) {
        self.fail_menu.store(true, Ordering::SeqCst);
    }

    pub fn slow_down(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn maybe_wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn get_me(&self) -> Result<BotInfo, BotError> {
        self.maybe_wait().await;
        Ok(BotInfo {
            id: 777,
            is_bot: true,
            first_name: "Grand Lord Bidoof".to_string(),
            username: "grandlordbidoof_bot".to_string(),
            ..BotInfo::default()
        })
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<DeliveryReceipt, BotError> {
        self.maybe_wait().await;
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BotError::Network("connection reset".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            chat_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(DeliveryReceipt {
            message_id: sent.len() as i64,
            chat_id,
            recipient: format!("chat-{}", chat_id),
        })
    }

    async fn set_my_commands(
        &self,
        commands: &[BotCommand],
        scope: CommandScope,
    ) -> Result<(), BotError> {
        if self.fail_menu.load(Ordering::SeqCst) {
            return Err(BotError::Api {
                code: 401,
                description: "Unauthorized".to_string(),
            });
        }
        self.menus.lock().unwrap().push((commands.to_vec(), scope));
        Ok(())
    }
}

/// Store wrapper that counts lookups, can delay them, and can be switched to fail
pub struct ProbeStore {
    inner: SqliteChatStore,
    lookups: AtomicUsize,
    broken: AtomicBool,
    lookup_delay: Mutex<Option<Duration>>,
}

impl ProbeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteChatStore::in_memory().unwrap(),
            lookups: AtomicUsize::new(0),
            broken: AtomicBool::new(false),
            lookup_delay: Mutex::new(None),
        })
    }

    pub fn slow_lookups(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn break_down(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for ProbeStore {
    async fn insert_chat(&self, chat: &ChatIdentity) -> Result<bool, StorageError> {
        self.check()?;
        self.inner.insert_chat(chat).await
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<ChatIdentity>, StorageError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let chat = self.inner.get_chat(chat_id).await?;
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: i64) -> Result<bool, StorageError> {
        self.check()?;
        self.inner.delete_chat(chat_id).await
    }

    async fn find_chats(&self, filter: &ChatFilter) -> Result<Vec<ChatIdentity>, StorageError> {
        self.check()?;
        self.inner.find_chats(filter).await
    }
}

pub const ASH_CHAT: i64 = 42;

pub fn ash() -> Sender {
    Sender::new(ASH_CHAT, "Ash")
        .with_last_name("Ketchum")
        .with_username("ash")
}

pub fn ash_identity() -> ChatIdentity {
    ChatIdentity::new(ASH_CHAT)
        .with_username("ash")
        .with_display_name("Ash Ketchum")
}

pub fn private_command(name: &str, raw_arguments: &str) -> InboundEvent {
    InboundEvent::command(ASH_CHAT, ChatKind::Private, ash(), name, raw_arguments)
}

pub fn config_with_timeout(timeout_seconds: u64) -> Arc<Config> {
    let mut config = Config::default();
    config.bot.timeout_seconds = timeout_seconds;
    Arc::new(config)
}

/// Everything a dispatcher test needs to poke at
pub struct Harness {
    pub bot: Arc<RecordingBot>,
    pub store: Arc<ProbeStore>,
    pub supervisor: TaskSupervisor,
    pub config: Arc<Config>,
    pub dispatcher: Arc<UpdateDispatcher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_registry(default_registry(), config_with_timeout(5))
    }

    pub fn with_registry(registry: CommandRegistry, config: Arc<Config>) -> Self {
        let bot = RecordingBot::new();
        let store = ProbeStore::new();
        let supervisor = TaskSupervisor::default();
        let bot_dyn: Arc<dyn Bot> = bot.clone();
        let store_dyn: Arc<dyn ChatStore> = store.clone();
        let dispatcher = Arc::new(UpdateDispatcher::new(
            Arc::new(registry),
            ChatGateway::new(bot_dyn),
            store_dyn,
            supervisor.clone(),
            Arc::clone(&config),
        ));

        Self {
            bot,
            store,
            supervisor,
            config,
            dispatcher,
        }
    }

    pub async fn register_ash(&self) {
        self.store.inner.insert_chat(&ash_identity()).await.unwrap();
    }

    pub async fn known(&self, chat_id: i64) -> Option<ChatIdentity> {
        self.store.inner.get_chat(chat_id).await.unwrap()
    }
}

pub fn default_registry() -> CommandRegistry {
    let mut commands = CommandService::new();
    commands.register_defaults().unwrap();
    commands.into_registry()
}

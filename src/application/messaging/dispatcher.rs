//! Update dispatcher - Routes chat updates to command handlers
//!
//! Each command update becomes one supervised task. Plain text never spawns
//! anything. Faults come back as a [`TaskOutcome`] and are turned into a
//! generic apology; timeouts and cancellation are only logged.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::errors::CommandError;
use crate::application::messaging::CommandContext;
use crate::application::services::{ChatGateway, REGISTER_COMMAND};
use crate::application::supervisor::{TaskOutcome, TaskSupervisor};
use crate::domain::entities::{CommandRegistry, InboundEvent};
use crate::domain::traits::ChatStore;
use crate::infrastructure::config::Config;

/// Outcome of one command update
pub type UpdateOutcome = TaskOutcome<(), CommandError>;

/// Routes inbound events through access checks, the registry and the supervisor
pub struct UpdateDispatcher {
    registry: Arc<CommandRegistry>,
    gateway: ChatGateway,
    store: Arc<dyn ChatStore>,
    supervisor: TaskSupervisor,
    config: Arc<Config>,
}

impl UpdateDispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        gateway: ChatGateway,
        store: Arc<dyn ChatStore>,
        supervisor: TaskSupervisor,
        config: Arc<Config>,
    ) -> Self {
        Self {
            registry,
            gateway,
            store,
            supervisor,
            config,
        }
    }

    /// Hand the event to a fresh task and return at once.
    ///
    /// `None` when the event carries no command: nothing is spawned.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) -> Option<JoinHandle<UpdateOutcome>> {
        if !event.is_command {
            return None;
        }

        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.supervise(event).await }))
    }

    /// Run the whole state machine for one event and wait for its outcome.
    pub async fn process(self: &Arc<Self>, event: InboundEvent) -> Option<UpdateOutcome> {
        if !event.is_command {
            tracing::trace!(chat_id = event.chat_id, "update.ignored");
            return None;
        }
        Some(self.supervise(event).await)
    }

    /// Consume events until the channel closes or shutdown is requested.
    pub async fn serve(self: Arc<Self>, mut updates: mpsc::Receiver<InboundEvent>) {
        let shutdown = self.supervisor.shutdown_token().clone();
        tracing::info!("Dispatcher started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = updates.recv() => match event {
                    Some(event) => {
                        tracing::info!(
                            event_id = %event.id,
                            chat_id = event.chat_id,
                            command = %event.command_name,
                            "event.new"
                        );
                        self.dispatch(event);
                    }
                    None => break,
                },
            }
        }

        tracing::info!("Dispatcher stopped");
    }

    async fn supervise(self: &Arc<Self>, event: InboundEvent) -> UpdateOutcome {
        let this = Arc::clone(self);
        let work_event = event.clone();
        let outcome = self
            .supervisor
            .run(self.config.bot.timeout(), async move {
                this.route(work_event).await
            })
            .await;

        self.report(&event, &outcome).await;
        outcome
    }

    async fn route(&self, event: InboundEvent) -> Result<(), CommandError> {
        let messages = &self.config.bot.messages;

        if !event.chat_kind.is_private() {
            tracing::debug!(chat_id = event.chat_id, kind = event.chat_kind.as_str(), "update.not_private");
            self.gateway
                .send(event.chat_id, &messages.group_chat, false, "route.IsPrivate")
                .await;
            return Ok(());
        }

        if event.command_name != REGISTER_COMMAND
            && self.store.get_chat(event.chat_id).await?.is_none()
        {
            tracing::debug!(chat_id = event.chat_id, "update.unregistered_sender");
            return Ok(());
        }

        let command = match self.registry.resolve(&event.command_name) {
            Ok(command) => command,
            Err(_) => {
                tracing::warn!(command = %event.command_name, "command.error");
                self.gateway
                    .send(event.chat_id, &messages.unknown_command, false, "route.unknown")
                    .await;
                return Ok(());
            }
        };

        let ctx = CommandContext::new(
            event,
            self.gateway.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        );
        command.execute(ctx).await
    }

    async fn report(&self, event: &InboundEvent, outcome: &UpdateOutcome) {
        match outcome {
            TaskOutcome::Success(()) => {
                let elapsed = Utc::now() - event.received_at;
                tracing::debug!(
                    chat_id = event.chat_id,
                    command = %event.command_name,
                    elapsed_ms = elapsed.num_milliseconds(),
                    "command.done"
                );
            }
            TaskOutcome::Failure(err) => {
                tracing::error!(
                    event_id = %event.id,
                    chat_id = event.chat_id,
                    command = %event.command_name,
                    arguments = %event.raw_arguments,
                    error = %err,
                    "command.failure"
                );
                self.apologize(event).await;
            }
            TaskOutcome::Panic(msg) => {
                tracing::error!(
                    event_id = %event.id,
                    chat_id = event.chat_id,
                    command = %event.command_name,
                    arguments = %event.raw_arguments,
                    panic = %msg,
                    "command.panic"
                );
                self.apologize(event).await;
            }
            TaskOutcome::TimedOut => {
                tracing::warn!(chat_id = event.chat_id, command = %event.command_name, "command.timeout");
            }
            TaskOutcome::Canceled => {
                tracing::warn!(chat_id = event.chat_id, command = %event.command_name, "command.canceled");
            }
        }
    }

    async fn apologize(&self, event: &InboundEvent) {
        let text = self
            .config
            .bot
            .messages
            .apology_for(&event.sender.full_name());
        self.gateway
            .send(event.chat_id, &text, false, "handlePanic")
            .await;
    }
}

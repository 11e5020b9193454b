use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::CommandContext;
use crate::domain::traits::{Bot, BotCommand, CommandScope};

/// Future returned by a command handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send>>;

/// Command handler function type
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> HandlerFuture + Send + Sync>;

/// Represents a bot command
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub usage: Option<String>,
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: None,
            handler: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |ctx| Box::pin(handler(ctx))));
        self
    }

    /// Run the handler. A command registered without one is a fault, not a silent no-op.
    pub fn execute(&self, ctx: CommandContext) -> HandlerFuture {
        match &self.handler {
            Some(handler) => handler(ctx),
            None => {
                let name = self.name.clone();
                Box::pin(async move { Err(CommandError::Unimplemented(name)) })
            }
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Command registry, filled at startup and read-only afterwards
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        if self.commands.contains_key(&command.name) {
            return Err(CommandError::Duplicate(command.name));
        }
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Result<&Command, CommandError> {
        self.commands
            .get(name)
            .ok_or_else(|| CommandError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Commands sorted by name
    pub fn all(&self) -> Vec<&Command> {
        let mut commands: Vec<&Command> = self.commands.values().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn menu(&self) -> Vec<BotCommand> {
        self.all()
            .into_iter()
            .map(|cmd| BotCommand {
                command: cmd.name.clone(),
                description: cmd.description.clone().unwrap_or_else(|| cmd.name.clone()),
            })
            .collect()
    }

    /// Advertise the command menu for private chats.
    ///
    /// Callers treat an error as fatal: serving traffic with a stale menu is worse than not starting.
    pub async fn publish(&self, bot: &dyn Bot) -> Result<(), BotError> {
        let menu = self.menu();
        bot.set_my_commands(&menu, CommandScope::AllPrivateChats).await?;
        tracing::info!(count = menu.len(), "Published command menu");
        Ok(())
    }
}

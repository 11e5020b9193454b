use crate::application::errors::CommandError;
use crate::application::messaging::CommandContext;
use crate::application::services::escape_markdown;
use crate::domain::entities::{ChatIdentity, Command, CommandRegistry};

/// The one command an unknown chat may send
pub const REGISTER_COMMAND: &str = "start";

pub const HELLO_USAGE: &str = "Usage: /hello <name> <message>";

const STOP_TEXT: &str = r"*Thank you for using me*\! If you need me, you can always /start me again or find me at t\.me/grandlordbidoof\_bot\. You can also safely delete this chat if you want\. Bidoof bless you\.";

const HELLO_TEMPLATE: &str = r#"
Hello {to} \! Bidoof wants to say:

"{msg}"

That's all Bidoof have to say, sir\.
"#;

/// Service for building the command registry at startup
pub struct CommandService {
    registry: CommandRegistry,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
        }
    }

    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        self.registry.register(command)
    }

    pub fn register_defaults(&mut self) -> Result<(), CommandError> {
        self.register(
            Command::new("hello")
                .with_description("Say something")
                .with_usage(HELLO_USAGE)
                .with_handler(hello_command),
        )?;

        self.register(
            Command::new(REGISTER_COMMAND)
                .with_description("Start the bot")
                .with_handler(start_command),
        )?;

        self.register(
            Command::new("stop")
                .with_description("Stop bot interaction for this user")
                .with_handler(stop_command),
        )?;

        Ok(())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> CommandRegistry {
        self.registry
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the chat. A chat that is already known gets a notice, not an error.
///
/// The insert itself decides which reply goes out, so two concurrent `/start`s
/// from one chat produce one welcome and one notice.
async fn start_command(ctx: CommandContext) -> Result<(), CommandError> {
    let sender = &ctx.event.sender;
    let chat = ChatIdentity::new(ctx.chat_id())
        .with_username(sender.username.clone().unwrap_or_default())
        .with_display_name(sender.full_name())
        .with_bio(sender.bio.clone().unwrap_or_default());

    if !ctx.store.insert_chat(&chat).await? {
        let text = format!(
            "{}, looks like you've already awaken Grand Lord Bidoof!",
            sender.first_name
        );
        ctx.reply(text, "StartCommand.GetPrivateChat").await;
        return Ok(());
    }
    tracing::info!(chat_id = chat.chat_id, username = %chat.username, "chat.registered");

    let text = format!("{}, thank you for waking me. Bidoof bless you.", sender.first_name);
    ctx.reply(text, "StartCommand.savePrivateChat").await;
    Ok(())
}

async fn stop_command(ctx: CommandContext) -> Result<(), CommandError> {
    if !ctx.store.delete_chat(ctx.chat_id()).await? {
        ctx.reply("uh-oh, Who art thou? Zzzzz...", "StopCommand.GetPrivateChat")
            .await;
        return Ok(());
    }

    tracing::info!(chat_id = ctx.chat_id(), "chat.unregistered");
    ctx.reply_markdown(STOP_TEXT, "StopCommand.DeletePrivateChat")
        .await;
    Ok(())
}

/// Say something to another user via Bidoof
async fn hello_command(ctx: CommandContext) -> Result<(), CommandError> {
    let args = ctx.args();
    if args.len() != 2 {
        ctx.reply(HELLO_USAGE, "HelloCommand.usage").await;
        return Ok(());
    }

    let text = HELLO_TEMPLATE
        .replacen("{to}", &escape_markdown(&args[0]), 1)
        .replacen("{msg}", &escape_markdown(&args[1]), 1);
    ctx.reply_markdown(text, "HelloCommand").await;
    Ok(())
}

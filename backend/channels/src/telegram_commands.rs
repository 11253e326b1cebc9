//! Telegram Bot Commands
//!
//! Recognizes `/start` and `/help` (both begin a new order) and publishes
//! the command list shown in the Telegram client menu.

use teloxide::types::BotCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramCommand {
    Start,
    Help,
}

impl TelegramCommand {
    /// Parse a message text as a bot command.
    ///
    /// Accepts `/start`, `/START`, `/start@ShopBot` and trailing arguments.
    /// Anything else, including unknown commands, is `None` and is handled
    /// as plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Commands registered with `setMyCommands` at startup.
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start a new order"),
        BotCommand::new("help", "Start over from the delivery address"),
    ]
}

//! User commands received over the messaging transport.
//!
//! Each command is a plain request/response against [`BotState`]; none of
//! them schedule anything. Commands take the same lock as job bodies.
//!
//! [`BotState`]: crate::state::BotState

use watchbell_core::{IncomingMessage, SubscriberId};

use crate::state::SharedState;

const WELCOME: &str = "You are now subscribed to periodic updates!\n\
                       You can view all available commands by typing /help.\n\
                       You can stop the updates at any time by typing /stopBot.";

const HELP: &str = "Available commands:\n\
                    /start - subscribe to periodic updates\n\
                    /stopBot - unsubscribe from periodic updates\n\
                    /currentStatus - view the current status message\n\
                    /help - view this help message";

const NO_STATUS: &str = "No status has been received yet.";

const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that command. Type /help for the list.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe,
    Unsubscribe,
    CurrentStatus,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse a message text. `None` means the text is not a command for this
    /// bot: plain text, or a `/cmd@otherbot` addressed elsewhere. The
    /// `@botname` check is skipped when `bot_username` is unknown. Trailing
    /// arguments are ignored.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/')?;
        let (name, target) = match word.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (word, None),
        };
        if let (Some(target), Some(me)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(me.trim_start_matches('@')) {
                return None;
            }
        }
        Some(match name {
            "start" | "subscribe" => Self::Subscribe,
            "stopBot" | "stop" | "unsubscribe" => Self::Unsubscribe,
            "currentStatus" | "status" => Self::CurrentStatus,
            "help" => Self::Help,
            other => Self::Unknown(other.to_string()),
        })
    }
}

pub struct CommandHandler {
    state: SharedState,
    bot_username: Option<String>,
}

impl CommandHandler {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            bot_username: None,
        }
    }

    /// Only act on `/cmd@name` when `name` is this bot.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Replies to send back to the chat, in order. Empty for non-commands.
    pub async fn handle(&self, message: &IncomingMessage) -> Vec<String> {
        match Command::parse(&message.content, self.bot_username.as_deref()) {
            Some(command) => self.execute(message.chat_id, command).await,
            None => Vec::new(),
        }
    }

    pub async fn execute(&self, chat: SubscriberId, command: Command) -> Vec<String> {
        let mut state = self.state.lock().await;
        match command {
            Command::Subscribe => {
                if !state.subscribers.add(chat) {
                    return vec!["You are already subscribed!".into()];
                }
                tracing::info!(
                    "👋 A new user has subscribed. Total subscribed users: {}",
                    state.subscribers.len()
                );
                let current = state.status.current().unwrap_or(NO_STATUS).to_string();
                vec![WELCOME.into(), current]
            }
            Command::Unsubscribe => {
                if !state.subscribers.remove(chat) {
                    return vec!["You are not subscribed.".into()];
                }
                tracing::info!(
                    "👋 A user has unsubscribed. Total subscribed users: {}",
                    state.subscribers.len()
                );
                vec!["You have been unsubscribed from periodic updates.".into()]
            }
            Command::CurrentStatus => {
                vec![state.status.current().unwrap_or(NO_STATUS).to_string()]
            }
            Command::Help => vec![HELP.into()],
            Command::Unknown(name) => {
                tracing::debug!("Unknown command /{name} from {chat}");
                vec![NOT_UNDERSTOOD.into()]
            }
        }
    }
}

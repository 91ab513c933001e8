//! # Watchbell Channels
//! Concrete adapters for the collaborator traits in `watchbell-core`.
//!
//! - [`telegram`]: Bot API long polling for commands, `sendMessage` and
//!   `sendDocument` for delivery
//! - [`home_assistant`]: light toggled around captures
//! - [`camera`]: frame capture through an external program
//! - [`source`]: HTTP JSON status source and the template formatter

pub mod camera;
pub mod home_assistant;
pub mod source;
pub mod telegram;

pub use camera::CommandCamera;
pub use home_assistant::HomeAssistantLight;
pub use source::{HttpStatusSource, TemplateFormatter};
pub use telegram::{TelegramChannel, TelegramPollingStream};

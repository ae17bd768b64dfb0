//! SMTP wire protocol: commands, replies and EHLO capabilities.

mod capability;
mod command;
mod reply;

pub use capability::Capabilities;
pub use command::Command;
pub use reply::{Reply, ReplyCode, is_last_reply_line, parse_reply};

//! Library components of the `vidchat` command-line tool.

pub mod interrupt;
pub mod logging;
pub mod output;
pub mod settings;

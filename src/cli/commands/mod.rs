//! Subcommands of the `gridseek` binary

pub mod evaluate;
pub mod play;
pub mod train;

//! Cmdrelay core library: config, broker RPC client, event consumer,
//! command execution, and reply delivery used by the CLI binary.

pub mod bot;
pub mod broker;
pub mod config;
pub mod events;
pub mod exec;
pub mod relay;
pub mod reply;

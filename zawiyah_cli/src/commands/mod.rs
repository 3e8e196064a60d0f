//! CLI subcommand implementations.

pub mod analytics;
pub mod campaigns;
pub mod donations;
pub mod events;
pub mod health;
pub mod lessons;
pub mod users;

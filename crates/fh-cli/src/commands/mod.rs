//! Subcommand implementations.

pub mod hunts;
pub mod serve;

pub use hunts::{cmd_create, cmd_list, cmd_modify, cmd_show, CreateArgs};
pub use serve::run_server;

/// Output format of query commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

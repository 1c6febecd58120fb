use crate::cli::{Commands, ConfigCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Run { json, .. } => *json,
        Commands::Config {
            command: ConfigCommand::Show { json, .. },
        } => *json,
    };
    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

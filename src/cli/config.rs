use anyhow::Result;
use clap::Subcommand;

use crate::settings::{
    store::{FileSettingsStore, SettingsStore},
    RawSettings, SETTINGS_KEYS,
};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    #[command(about = "Print every setting. The API token is masked")]
    Show,
    #[command(about = "Change a setting. An empty value removes it")]
    Set {
        #[arg(help = "Settings key, for example jiraUrl or primaryStatuses")]
        key: String,
        #[arg(default_value = "")]
        value: String,
    },
    #[command(about = "Remove all settings")]
    Reset,
    #[command(about = "Print the location of the settings file")]
    Path,
}

pub async fn process_config_command(command: ConfigCommand, store: &FileSettingsStore) -> Result<()> {
    match command {
        ConfigCommand::Show => print!("{}", render_settings(&store.get().await?)),
        ConfigCommand::Set { key, value } => {
            let mut raw = store.get().await?;
            raw.set(&key, &value)?;
            store.set(&raw).await?;
            let shown = raw.display_value(&key).unwrap_or_else(|| "<unset>".into());
            println!("{key} = {shown}");
        }
        ConfigCommand::Reset => {
            store.clear().await?;
            println!("Settings removed");
        }
        ConfigCommand::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

fn render_settings(raw: &RawSettings) -> String {
    let width = SETTINGS_KEYS.iter().map(|v| v.len()).max().unwrap_or_default();
    SETTINGS_KEYS
        .iter()
        .map(|key| {
            let value = raw.display_value(key).unwrap_or_else(|| "<unset>".into());
            format!("{key:<width$}  {value}\n")
        })
        .collect()
}

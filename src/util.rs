use crate::config::Config;

const DISCORD_TOKEN: &str = "DISCORD_TOKEN";

pub fn get_discord_token() -> Option<String> {
    non_empty(std::env::var(DISCORD_TOKEN).ok())
}

const STATUS_API_TOKEN: &str = "STATUS_API_TOKEN";

pub fn get_api_token() -> Option<String> {
    non_empty(std::env::var(STATUS_API_TOKEN).ok())
}

const STATUS_CONFIG: &str = "STATUS_CONFIG";

/// Config file path from the environment, used when `-f` is not given
pub fn get_config_path() -> Option<String> {
    non_empty(std::env::var(STATUS_CONFIG).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fill tokens from the environment. Environment values win over the file.
pub fn apply_env_overrides(config: &mut Config) {
    apply_tokens(config, get_discord_token(), get_api_token());
}

fn apply_tokens(config: &mut Config, discord: Option<String>, api: Option<String>) {
    if discord.is_some() {
        config.discord.token = discord;
    }

    if let (Some(token), Some(api_config)) = (api, config.api.as_mut()) {
        api_config.token = Some(token);
    }
}

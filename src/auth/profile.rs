use super::credentials::Credentials;
use crate::utils::errors::{Result, RotatorError};
use ini::Ini;
use serde::Deserialize;

/// What a profile entry resolves to before any network call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCredentials {
    Static(Credentials),
    EcsRole(String),
}

/// `~/.aliyun/config.json`, as written by the `aliyun` CLI.
#[derive(Debug, Deserialize)]
struct CliConfig {
    #[serde(default)]
    current: String,
    #[serde(default)]
    profiles: Vec<CliProfile>,
}

#[derive(Debug, Deserialize)]
struct CliProfile {
    name: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    access_key_id: String,
    #[serde(default)]
    access_key_secret: String,
    #[serde(default)]
    sts_token: String,
    #[serde(default)]
    ram_role_name: String,
}

/// Pick a profile out of the CLI config. Without an explicit name the
/// config's `current` profile is used.
pub fn parse_cli_config(content: &str, profile: Option<&str>) -> Result<ProfileCredentials> {
    let config: CliConfig = serde_json::from_str(content)?;
    let name = profile.unwrap_or(&config.current);

    let entry = config
        .profiles
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| {
            RotatorError::Credential(format!("unable to get profile with '{name}'"))
        })?;

    match entry.mode.as_str() {
        "AK" => Ok(ProfileCredentials::Static(Credentials::new(
            &entry.access_key_id,
            &entry.access_key_secret,
        ))),
        "StsToken" => Ok(ProfileCredentials::Static(Credentials {
            access_key_id: entry.access_key_id.clone(),
            access_key_secret: entry.access_key_secret.clone(),
            security_token: Some(entry.sts_token.clone()),
        })),
        "EcsRamRole" => Ok(ProfileCredentials::EcsRole(entry.ram_role_name.clone())),
        mode => Err(RotatorError::Credential(format!(
            "unsupported profile mode '{mode}' in profile '{name}'"
        ))),
    }
}

/// Pick a section out of an INI credentials file
/// (`~/.alibabacloud/credentials`).
pub fn parse_credentials_file(content: &str, profile: &str) -> Result<ProfileCredentials> {
    let ini = Ini::load_from_str(content)
        .map_err(|e| RotatorError::Credential(format!("invalid credentials file: {e}")))?;

    let section = ini.section(Some(profile)).ok_or_else(|| {
        RotatorError::Credential(format!("can not load section '{profile}'"))
    })?;

    let field = |key: &str| -> Result<String> {
        section
            .get(key)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                RotatorError::Credential(format!("missing {key} in profile '{profile}'"))
            })
    };

    match section.get("type").unwrap_or_default() {
        "access_key" => Ok(ProfileCredentials::Static(Credentials::new(
            &field("access_key_id")?,
            &field("access_key_secret")?,
        ))),
        "sts" => Ok(ProfileCredentials::Static(Credentials {
            access_key_id: field("access_key_id")?,
            access_key_secret: field("access_key_secret")?,
            security_token: Some(field("security_token")?),
        })),
        "ecs_ram_role" => Ok(ProfileCredentials::EcsRole(field("role_name")?)),
        other => Err(RotatorError::Credential(format!(
            "unsupported credential type '{other}' in profile '{profile}'"
        ))),
    }
}

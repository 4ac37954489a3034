use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::Deserializer;
use url::Url;

use crate::form::FormSnapshot;
use crate::{news, weather};

const PROFILE_FILE: &str = "config.yaml";

/// Provider secrets, read once at startup. Either may be absent; the client
/// that needs it reports that on first use.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub weather: Option<String>,
    pub news: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("weather", &self.weather.as_ref().map(|_| "***"))
            .field("news", &self.news.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            weather: read_var(weather::API_KEY_VAR),
            news: read_var(news::API_KEY_VAR),
        }
    }

    /// Names of the variables that were not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.weather.is_none() {
            missing.push(weather::API_KEY_VAR);
        }
        if self.news.is_none() {
            missing.push(news::API_KEY_VAR);
        }
        missing
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Optional defaults for the form and the provider endpoints. Never written back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub city: String,
    pub category: String,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub weather_url: String,
    pub news_url: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            city: "London".to_string(),
            category: "general".to_string(),
            sender: None,
            receiver: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            news_url: "https://newsapi.org/v2/top-headlines".to_string(),
        }
    }
}

impl Profile {
    pub fn user_profile_path() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix("glance").find_config_file(PROFILE_FILE)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&raw, &path.display().to_string())
    }

    pub fn from_yaml(raw: &str, origin: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let deserialized = Deserializer::from_str(raw);
        serde_path_to_error::deserialize(deserialized).map_err(|e| {
            anyhow!("Invalid YAML in {origin} at `{}`: {}", e.path(), e.inner())
        })
    }

    /// Initial form contents. The password never comes from here.
    pub fn form_defaults(&self) -> FormSnapshot {
        FormSnapshot {
            city: self.city.clone(),
            category: self.category.clone(),
            sender: self.sender.clone().unwrap_or_default(),
            password: String::new(),
            receiver: self.receiver.clone().unwrap_or_default(),
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub keys: ApiKeys,
    pub profile: Profile,
    pub weather_url: Url,
    pub news_url: Url,
}

impl Config {
    /// Reads `.env`, the environment and the optional profile file.
    pub fn load(profile_path: Option<&Path>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(anyhow!("Could not read .env file: {e}")),
        }

        let keys = ApiKeys::from_env();
        for var in keys.missing() {
            warn!("{var} not found in environment or .env file!");
        }

        let profile_path = profile_path
            .map(Path::to_path_buf)
            .or_else(Profile::user_profile_path);
        let profile = match profile_path {
            Some(path) => {
                debug!("Loading profile from {}", path.display());
                Profile::load_from(&path)?
            }
            None => Profile::default(),
        };

        Self::from_parts(keys, profile)
    }

    pub fn from_parts(keys: ApiKeys, profile: Profile) -> Result<Self> {
        let weather_url = Url::parse(&profile.weather_url)
            .with_context(|| format!("Invalid weather_url '{}'", profile.weather_url))?;
        let news_url = Url::parse(&profile.news_url)
            .with_context(|| format!("Invalid news_url '{}'", profile.news_url))?;

        Ok(Self {
            keys,
            profile,
            weather_url,
            news_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_stock_form() {
        let form = Profile::default().form_defaults();
        assert_eq!(form.city, "London");
        assert_eq!(form.category, "general");
        assert_eq!(form.smtp_host, "smtp.gmail.com");
        assert_eq!(form.smtp_port, "587");
        assert!(form.password.is_empty());
    }

    #[test]
    fn partial_profile_keeps_other_defaults() {
        let profile = Profile::from_yaml("city: Mumbai\nsmtp_port: 2525\n", "test").unwrap();
        assert_eq!(profile.city, "Mumbai");
        assert_eq!(profile.smtp_port, 2525);
        assert_eq!(profile.category, "general");
        assert_eq!(profile.weather_url, Profile::default().weather_url);
    }

    #[test]
    fn bad_profile_names_the_offending_key() {
        let err = Profile::from_yaml("smtp_port: lots\n", "test.yaml").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("test.yaml"), "{msg}");
        assert!(msg.contains("smtp_port"), "{msg}");
    }

    #[test]
    fn unknown_profile_keys_are_rejected() {
        assert!(Profile::from_yaml("password: hunter2\n", "test").is_err());
    }

    #[test]
    fn profile_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "category: technology").unwrap();
        writeln!(file, "sender: me@example.com").unwrap();

        let profile = Profile::load_from(file.path()).unwrap();
        assert_eq!(profile.category, "technology");
        assert_eq!(profile.form_defaults().sender, "me@example.com");
    }

    #[test]
    fn empty_profile_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(Profile::load_from(file.path()).unwrap(), Profile::default());
    }

    #[test]
    fn from_parts_rejects_bad_endpoint() {
        let profile = Profile {
            news_url: "not a url".into(),
            ..Profile::default()
        };
        let err = Config::from_parts(ApiKeys::default(), profile).unwrap_err();
        assert!(err.to_string().contains("news_url"));
    }

    #[test]
    fn missing_keys_are_listed() {
        let keys = ApiKeys {
            weather: Some("sekrit".into()),
            news: None,
        };
        assert_eq!(keys.missing(), vec!["NEWS_API_KEY"]);
        assert!(!format!("{keys:?}").contains("sekrit"));
    }
}

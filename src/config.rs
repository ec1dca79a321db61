use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use confique::Config as _;

use crate::prelude::*;


/// The locations where Quizzard will look for a configuration file. The first
/// existing file in this list is used.
const DEFAULT_PATHS: &[&str] = &["config.toml", "/etc/quizzard/config.toml"];

/// Configuration for Quizzard.
///
/// All relative paths are relative to the location of this configuration file.
#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) db: crate::db::DbConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) auth: crate::auth::AuthConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,
}

impl Config {
    /// Tries to find a config file from a list of possible default config file
    /// locations. The first existing file is loaded via [`Self::load_from`].
    pub(crate) fn from_default_locations() -> Result<(Self, PathBuf)> {
        let path = DEFAULT_PATHS.iter()
            .map(Path::new)
            .find(|p| p.exists())
            .ok_or(anyhow!(
                "no configuration file found. Note: we checked the following paths: {}",
                DEFAULT_PATHS.join(", "),
            ))?;

        let config = Self::load_from(path)
            .context(format!("failed to load configuration from '{}'", path.display()))?;

        Ok((config, path.to_owned()))
    }

    /// Loads the configuration from a specific TOML file.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config::from_file(path)
            .context(format!("failed to read config file '{}'", path.display()))?;
        config.fix_paths(path)?;

        Ok(config)
    }

    /// Goes through all paths in the configuration and changes relative paths
    /// to be absolute based on the path of the configuration file itself.
    fn fix_paths(&mut self, config_path: &Path) -> Result<()> {
        let absolute_config_path = config_path.canonicalize()
            .context("failed to canonicalize config path")?;
        let base = absolute_config_path.parent()
            .expect("config file path has no parent");

        if let Some(p) = &mut self.log.file {
            if p.is_relative() {
                *p = base.join(&p);
            }
        }

        Ok(())
    }
}

/// Writes the generated TOML config template file to the given destination or
/// stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    use confique::toml::FormatOptions;

    info!(
        "Writing configuration template to '{}'",
        path.map(|p| p.display().to_string()).unwrap_or("<stdout>".into()),
    );

    let template = confique::toml::template::<Config>(FormatOptions::default());
    match path {
        Some(path) => fs::write(path, template)?,
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}

/// Deserializes a duration from a string like "20s", "5min", "12h" or "7d".
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::{Deserialize, de::Error};

    let s = String::deserialize(deserializer)?;
    let start_unit = s.find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| D::Error::custom("no unit in duration"))?;
    let (num, unit) = s.split_at(start_unit);
    let num = num.parse::<u64>().map_err(|e| D::Error::custom(format!("invalid number: {e}")))?;

    let seconds_per_unit = match unit.trim() {
        "s" => 1,
        "min" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => return Err(D::Error::custom(format!("invalid unit of time '{other}'"))),
    };

    Ok(Duration::from_secs(num * seconds_per_unit))
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[derive(Debug, serde::Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "super::deserialize_duration")]
        duration: Duration,
    }

    fn parse(s: &str) -> Result<Duration, serde_json::Error> {
        serde_json::from_str::<Wrapper>(&format!(r#"{{ "duration": "{s}" }}"#)).map(|w| w.duration)
    }

    #[test]
    fn durations() {
        assert_eq!(parse("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse("5min").unwrap(), Duration::from_secs(5 * 60));
        assert_eq!(parse("2h").unwrap(), Duration::from_secs(2 * 60 * 60));
        assert_eq!(parse("1d").unwrap(), Duration::from_secs(24 * 60 * 60));

        assert!(parse("30").is_err());
        assert!(parse("30x").is_err());
        assert!(parse("s").is_err());
    }
}

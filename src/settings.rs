//! Layered runtime settings.
//!
//! Sources are applied in order, later ones winning: built-in defaults, an
//! optional TOML file, `KAFKAWATCH_*` environment variables, then CLI flags.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use config::{Config, Environment, File};
use serde::Deserialize;

use kafkawatch_sync::{Credentials, FetchTarget};
use kafkawatch_types::{DiskSpaceSelection, TimeDuration, TopicSelection};

use crate::period::parse_period;

/// Default metrics API base path.
pub const DEFAULT_API_BASE: &str = "https://api.openshift.com";

/// Which metric views to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewChoice {
    Disk,
    Topics,
    #[default]
    All,
}

impl ViewChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewChoice::Disk => "disk",
            ViewChoice::Topics => "topics",
            ViewChoice::All => "all",
        }
    }

    pub fn wants_disk(self) -> bool {
        matches!(self, ViewChoice::Disk | ViewChoice::All)
    }

    pub fn wants_topics(self) -> bool {
        matches!(self, ViewChoice::Topics | ViewChoice::All)
    }
}

/// Values passed on the command line; `None` leaves lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instance: Option<String>,
    pub api_base: Option<String>,
    pub token: Option<String>,
    pub view: Option<ViewChoice>,
    pub duration: Option<String>,
    pub topic: Option<String>,
    pub poll: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Kafka instance identifier.
    pub instance: String,
    pub api_base: String,
    pub token: String,
    pub view: ViewChoice,
    /// Initial window, e.g. `1h` or `60`.
    pub duration: String,
    /// Initial topic filter for the topics view.
    pub topic: Option<String>,
    /// Poll period, e.g. `5m`.
    pub poll: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instance: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: String::new(),
            view: ViewChoice::All,
            duration: TimeDuration::default().to_string(),
            topic: None,
            poll: "5m".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from every layer.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_from(config_path, Some("KAFKAWATCH"), overrides)
    }

    fn load_from(
        config_path: Option<&Path>,
        env_prefix: Option<&str>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }
        if let Some(prefix) = env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix));
        }

        let settings: Settings = builder
            .set_override_option("instance", overrides.instance.clone())?
            .set_override_option("api_base", overrides.api_base.clone())?
            .set_override_option("token", overrides.token.clone())?
            .set_override_option("view", overrides.view.map(|v| v.as_str()))?
            .set_override_option("duration", overrides.duration.clone())?
            .set_override_option("topic", overrides.topic.clone())?
            .set_override_option("poll", overrides.poll.clone())?
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check that every value parses and an instance is set.
    pub fn validate(&self) -> Result<()> {
        if self.instance.trim().is_empty() {
            bail!("No Kafka instance configured (use --instance or KAFKAWATCH_INSTANCE)");
        }
        self.time_duration()?;
        self.poll_period()?;
        Ok(())
    }

    pub fn time_duration(&self) -> Result<TimeDuration> {
        self.duration
            .parse()
            .with_context(|| format!("Invalid duration '{}'", self.duration))
    }

    pub fn poll_period(&self) -> Result<Duration> {
        parse_period(&self.poll).with_context(|| format!("Invalid poll period '{}'", self.poll))
    }

    /// The instance and API the services query.
    pub fn target(&self) -> FetchTarget {
        FetchTarget::new(
            self.instance.clone(),
            self.api_base.clone(),
            Credentials::bearer(&self.token),
        )
    }

    pub fn disk_selection(&self) -> Result<DiskSpaceSelection> {
        Ok(DiskSpaceSelection::new(self.time_duration()?))
    }

    pub fn topic_selection(&self) -> Result<TopicSelection> {
        let selection = TopicSelection::new(self.time_duration()?);
        Ok(match self.topic.as_deref().filter(|t| !t.is_empty()) {
            Some(topic) => selection.with_topic(topic),
            None => selection,
        })
    }
}

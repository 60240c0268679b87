use std::time::Duration;

use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BusinessSettings {
    pub name: String,
    /// IANA zone of the salon's wall clock; appointment times are local to it.
    pub timezone: chrono_tz::Tz,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            name: "Beauty Touch Nails".to_string(),
            timezone: chrono_tz::UTC,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReminderSettings {
    pub interval_secs: u64,
    pub window_start_hours: i64,
    pub window_end_hours: i64,
    pub prefer_rich_channel: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            window_start_hours: 23,
            window_end_hours: 25,
            prefer_rich_channel: true,
        }
    }
}

impl ReminderSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Look-ahead range for reminders.
    ///
    /// The range must be in order and at least one tick interval wide, or
    /// an appointment could cross it between two ticks without being seen.
    pub fn window(&self) -> Result<(TimeDelta, TimeDelta), ConfigError> {
        let hours = |key: &str, value: i64| {
            TimeDelta::try_hours(value).ok_or_else(|| {
                ConfigError::Message(format!("reminders.{key} is out of range: {value}"))
            })
        };
        let start = hours("window_start_hours", self.window_start_hours)?;
        let end = hours("window_end_hours", self.window_end_hours)?;

        if start > end {
            return Err(ConfigError::Message(format!(
                "reminders window starts after it ends: {}h > {}h",
                self.window_start_hours, self.window_end_hours
            )));
        }

        let interval = TimeDelta::from_std(self.interval()).map_err(|_| {
            ConfigError::Message(format!(
                "reminders.interval_secs is out of range: {}",
                self.interval_secs
            ))
        })?;
        if end - start < interval {
            return Err(ConfigError::Message(format!(
                "reminders window ({}h..{}h) is narrower than the tick interval ({}s)",
                self.window_start_hours, self.window_end_hours, self.interval_secs
            )));
        }

        Ok((start, end))
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NotificationSettings {
    pub queue_capacity: usize,
    pub prefer_rich_confirmations: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            prefer_rich_confirmations: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppSettings {
    pub business: BusinessSettings,
    pub reminders: ReminderSettings,
    pub notifications: NotificationSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_config(settings)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: AppSettings = config.try_deserialize()?;
        settings.reminders.window()?;

        Ok(settings)
    }
}

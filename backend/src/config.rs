//! Daily task job configuration loaded via OrthoConfig.
//!
//! Concurrency carries an OrthoConfig default so an environment with only
//! `DATABASE_URL` still loads; the remaining values are optional and the
//! accessors supply their defaults. Environment variables use the
//! `DAILY_TASK_` prefix.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{DailyTaskSchedulerConfig, ReminderContent, ServiceCalendar};
use crate::outbound::persistence::DEFAULT_USER_PAGE_SIZE;
use crate::outbound::push::DEFAULT_EXPO_PUSH_ENDPOINT;

const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Invalid or missing configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Neither database URL variable is set.
    #[error("no database URL: set DAILY_TASK_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,
    /// The service-day offset is a full day or more away from UTC.
    #[error("UTC offset of {0} minutes is outside ±24 hours")]
    InvalidUtcOffset(i32),
    /// The push endpoint is not an absolute URL.
    #[error("invalid push endpoint {endpoint}: {message}")]
    InvalidPushEndpoint {
        /// Configured endpoint text.
        endpoint: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Settings for the `daily-tasks` binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DAILY_TASK")]
pub struct DailyTaskSettings {
    /// PostgreSQL connection string; falls back to `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Users processed concurrently per pass.
    #[ortho_config(default = 8)]
    pub max_concurrent_users: usize,
    /// Service-day offset from UTC in minutes (e.g. 540 for JST).
    pub utc_offset_minutes: Option<i32>,
    /// Rows fetched per user listing query.
    pub user_page_size: Option<u32>,
    /// Push gateway endpoint.
    pub push_endpoint: Option<String>,
    /// Push gateway request timeout in seconds.
    pub push_timeout_secs: Option<u64>,
    /// Reminder notification title override.
    pub reminder_title: Option<String>,
    /// Reminder notification body override.
    pub reminder_body: Option<String>,
}

impl DailyTaskSettings {
    /// Resolve the database URL, falling back to `DATABASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when neither is set.
    pub fn database_url(&self) -> Result<String, SettingsError> {
        self.database_url
            .clone()
            .or_else(|| std::env::var(FALLBACK_DATABASE_URL_VAR).ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Per-pass concurrency, never below one.
    pub fn max_concurrent_users(&self) -> usize {
        self.max_concurrent_users.max(1)
    }

    /// Service calendar for the configured offset; UTC when unset.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidUtcOffset`] for offsets beyond a day.
    pub fn calendar(&self) -> Result<ServiceCalendar, SettingsError> {
        let minutes = self.utc_offset_minutes.unwrap_or_default();
        ServiceCalendar::from_offset_minutes(minutes).ok_or(SettingsError::InvalidUtcOffset(minutes))
    }

    /// Rows per user listing page, never below one.
    pub fn user_page_size(&self) -> u32 {
        self.user_page_size.unwrap_or(DEFAULT_USER_PAGE_SIZE).max(1)
    }

    /// Parsed push endpoint, defaulting to Expo.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidPushEndpoint`] when the URL is malformed.
    pub fn push_endpoint(&self) -> Result<Url, SettingsError> {
        let endpoint = self
            .push_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_EXPO_PUSH_ENDPOINT);
        Url::parse(endpoint).map_err(|error| SettingsError::InvalidPushEndpoint {
            endpoint: endpoint.to_owned(),
            message: error.to_string(),
        })
    }

    /// Push gateway request timeout, at least one second.
    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(
            self.push_timeout_secs
                .unwrap_or(DEFAULT_PUSH_TIMEOUT_SECS)
                .max(1),
        )
    }

    /// Reminder text with configured overrides applied.
    pub fn reminder_content(&self) -> ReminderContent {
        let defaults = ReminderContent::default();
        ReminderContent {
            title: self.reminder_title.clone().unwrap_or(defaults.title),
            body: self.reminder_body.clone().unwrap_or(defaults.body),
            sound: defaults.sound,
        }
    }

    /// Scheduler configuration derived from these settings.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsError::InvalidUtcOffset`].
    pub fn scheduler_config(&self) -> Result<DailyTaskSchedulerConfig, SettingsError> {
        Ok(DailyTaskSchedulerConfig {
            max_concurrent_users: self.max_concurrent_users(),
            calendar: self.calendar()?,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for daily task configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use chrono::FixedOffset;
    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "DAILY_TASK_DATABASE_URL",
        "DAILY_TASK_MAX_CONCURRENT_USERS",
        "DAILY_TASK_UTC_OFFSET_MINUTES",
        "DAILY_TASK_USER_PAGE_SIZE",
        "DAILY_TASK_PUSH_ENDPOINT",
        "DAILY_TASK_PUSH_TIMEOUT_SECS",
        "DAILY_TASK_REMINDER_TITLE",
        "DAILY_TASK_REMINDER_BODY",
        "DATABASE_URL",
    ];

    fn cleared_env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn unset() -> DailyTaskSettings {
        DailyTaskSettings {
            database_url: None,
            max_concurrent_users: 8,
            utc_offset_minutes: None,
            user_page_size: None,
            push_endpoint: None,
            push_timeout_secs: None,
            reminder_title: None,
            reminder_body: None,
        }
    }

    fn load_from_empty_args() -> DailyTaskSettings {
        DailyTaskSettings::load_from_iter([OsString::from("daily-tasks")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared_env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), Err(SettingsError::MissingDatabaseUrl));
        assert_eq!(settings.max_concurrent_users(), 8);
        assert_eq!(settings.calendar(), Ok(ServiceCalendar::utc()));
        assert_eq!(settings.user_page_size(), DEFAULT_USER_PAGE_SIZE);
        assert_eq!(
            settings.push_endpoint().expect("default endpoint").as_str(),
            DEFAULT_EXPO_PUSH_ENDPOINT
        );
        assert_eq!(settings.push_timeout(), Duration::from_secs(10));
        assert_eq!(settings.reminder_content(), ReminderContent::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_env_with(&[
            ("DAILY_TASK_DATABASE_URL", "postgres://db/petcare"),
            ("DAILY_TASK_MAX_CONCURRENT_USERS", "3"),
            ("DAILY_TASK_UTC_OFFSET_MINUTES", "540"),
            ("DAILY_TASK_USER_PAGE_SIZE", "50"),
            ("DAILY_TASK_PUSH_ENDPOINT", "http://localhost:9000/push"),
            ("DAILY_TASK_PUSH_TIMEOUT_SECS", "2"),
            ("DAILY_TASK_REMINDER_TITLE", "Daily task time"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url().as_deref(), Ok("postgres://db/petcare"));
        assert_eq!(settings.max_concurrent_users(), 3);
        assert_eq!(
            settings.calendar(),
            Ok(ServiceCalendar::new(
                FixedOffset::east_opt(9 * 3600).expect("valid offset")
            ))
        );
        assert_eq!(settings.user_page_size(), 50);
        assert_eq!(
            settings.push_endpoint().expect("endpoint").as_str(),
            "http://localhost:9000/push"
        );
        assert_eq!(settings.push_timeout(), Duration::from_secs(2));
        let content = settings.reminder_content();
        assert_eq!(content.title, "Daily task time");
        assert_eq!(content.body, ReminderContent::DEFAULT_BODY);
    }

    #[rstest]
    fn database_url_falls_back_to_the_shared_variable() {
        let _guard = lock_env(cleared_env_with(&[("DATABASE_URL", "postgres://shared/db")]));

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url().as_deref(), Ok("postgres://shared/db"));
    }

    #[rstest]
    fn loads_with_only_the_shared_database_url() {
        let _guard = lock_env(cleared_env_with(&[("DATABASE_URL", "postgres://shared/db")]));

        let settings = load_from_empty_args();
        assert_eq!(settings.max_concurrent_users, 8);
        let config = settings.scheduler_config().expect("default scheduler config");
        assert_eq!(config.max_concurrent_users, 8);
        assert_eq!(config.calendar, ServiceCalendar::utc());
    }

    #[rstest]
    fn zero_concurrency_is_raised_to_one() {
        let settings = DailyTaskSettings {
            max_concurrent_users: 0,
            ..unset()
        };
        assert_eq!(settings.max_concurrent_users(), 1);
    }

    #[rstest]
    #[case(24 * 60)]
    #[case(-24 * 60)]
    fn offsets_beyond_a_day_are_rejected(#[case] minutes: i32) {
        let settings = DailyTaskSettings {
            utc_offset_minutes: Some(minutes),
            ..unset()
        };
        assert_eq!(
            settings.scheduler_config(),
            Err(SettingsError::InvalidUtcOffset(minutes))
        );
    }

    #[rstest]
    fn malformed_endpoints_are_rejected() {
        let settings = DailyTaskSettings {
            push_endpoint: Some("not a url".to_owned()),
            ..unset()
        };
        assert!(matches!(
            settings.push_endpoint(),
            Err(SettingsError::InvalidPushEndpoint { .. })
        ));
    }
}

//! Reload notification to the monitoring engine
//!
//! After a rule file changes, Prometheus is asked to re-read its rules via
//! `POST <url>/-/reload`. The notification is best effort: the file on disk
//! is already correct, so a failed reload is only logged.

use backoff::ExponentialBackoffBuilder;
use confmon_core::ReloadSettings;
use std::time::Duration;

const RELOAD_PATH: &str = "/-/reload";

/// Errors from an explicit reload attempt
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// HTTP client could not be constructed
    #[error("Failed to build reload client: {message}")]
    Client { message: String },

    /// Request did not complete (connect, timeout, I/O)
    #[error("Reload request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Engine answered with a non-success status
    #[error("Reload request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Every retry failed
    #[error("Reload of {url} failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl ReloadError {
    /// Client errors (4xx) will not succeed on retry.
    fn is_permanent(&self) -> bool {
        match self {
            Self::Client { .. } => true,
            Self::Status { status, .. } => (400..500).contains(status),
            Self::Transport { .. } | Self::RetryExhausted { .. } => false,
        }
    }
}

/// Something that can be told rule files changed
pub trait ReloadNotifier {
    /// Ask the engine to reload. Never fails; problems are logged.
    fn notify_reload(&self);
}

impl<T: ReloadNotifier + ?Sized> ReloadNotifier for Box<T> {
    fn notify_reload(&self) {
        (**self).notify_reload();
    }
}

/// Notifier used when reloading is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledReload;

impl ReloadNotifier for DisabledReload {
    fn notify_reload(&self) {
        tracing::debug!("Reload disabled, skipping notification");
    }
}

/// Reloads Prometheus over HTTP with exponential-backoff retries
#[derive(Debug, Clone)]
pub struct HttpReloadTrigger {
    client: reqwest::blocking::Client,
    endpoint: String,
    max_retries: u32,
    initial_delay: Duration,
    multiplier: f64,
}

impl HttpReloadTrigger {
    pub fn new(settings: &ReloadSettings) -> Result<Self, ReloadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ReloadError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", settings.url.trim_end_matches('/'), RELOAD_PATH),
            max_retries: settings.max_retries,
            initial_delay: settings.retry_delay(),
            multiplier: settings.retry_multiplier,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Reload, retrying transient failures up to `max_retries` times.
    pub fn try_reload(&self) -> Result<(), ReloadError> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();

        let mut attempts = 0u32;
        let result = backoff::retry(policy, || {
            attempts += 1;
            match self.post_once() {
                Ok(()) => Ok(()),
                Err(e) if e.is_permanent() || attempts > self.max_retries => {
                    Err(backoff::Error::permanent(e))
                }
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "Reload attempt failed, retrying");
                    Err(backoff::Error::transient(e))
                }
            }
        });

        match result {
            Ok(()) => {
                tracing::info!(endpoint = %self.endpoint, attempts, "Monitoring engine reloaded");
                Ok(())
            }
            Err(backoff::Error::Permanent(e)) | Err(backoff::Error::Transient { err: e, .. }) => {
                if attempts > 1 && !e.is_permanent() {
                    Err(ReloadError::RetryExhausted {
                        url: self.endpoint.clone(),
                        attempts,
                        last_error: e.to_string(),
                    })
                } else {
                    Err(e)
                }
            }
        }
    }

    fn post_once(&self) -> Result<(), ReloadError> {
        let response = self
            .client
            .post(&self.endpoint)
            .send()
            .map_err(|source| ReloadError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReloadError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            })
        }
    }
}

impl ReloadNotifier for HttpReloadTrigger {
    fn notify_reload(&self) {
        if let Err(e) = self.try_reload() {
            tracing::warn!(
                endpoint = %self.endpoint,
                error = %e,
                "Reload failed; rule files on disk are current and will be picked up later"
            );
        }
    }
}

/// Build the notifier the settings ask for.
///
/// A client that cannot be built degrades to [`DisabledReload`] with a warning.
pub fn notifier_from_settings(settings: &ReloadSettings) -> Box<dyn ReloadNotifier> {
    if !settings.enabled {
        return Box::new(DisabledReload);
    }
    match HttpReloadTrigger::new(settings) {
        Ok(trigger) => Box::new(trigger),
        Err(e) => {
            tracing::warn!(error = %e, "Reload client unavailable, reload disabled");
            Box::new(DisabledReload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> ReloadSettings {
        ReloadSettings {
            url: url.to_string(),
            ..ReloadSettings::default()
        }
    }

    #[test]
    fn endpoint_appends_reload_path_once() {
        let trigger = HttpReloadTrigger::new(&settings("http://prom:9090/")).unwrap();
        assert_eq!(trigger.endpoint(), "http://prom:9090/-/reload");
    }

    #[test]
    fn client_errors_are_not_retried() {
        let status = |code| ReloadError::Status {
            url: String::new(),
            status: code,
        };
        assert!(status(403).is_permanent());
        assert!(!status(503).is_permanent());
    }

    #[test]
    fn disabled_settings_yield_noop_notifier() {
        let notifier = notifier_from_settings(&ReloadSettings {
            enabled: false,
            ..ReloadSettings::default()
        });
        notifier.notify_reload();
    }
}

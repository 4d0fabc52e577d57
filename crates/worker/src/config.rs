//! Environment-driven configuration.
//!
//! Every knob has a default suitable for local development, so a bare
//! `tracklift-worker` starts against localhost services. Interval
//! variables are plain integer seconds.

use std::time::Duration;

/// One upstream platform service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Knobs for the conversion engine itself.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Matcher parallelism bound.
    pub concurrency: usize,
    /// Blocking-pop timeout for the job queue.
    pub poll_interval: Duration,
    /// End-to-end deadline for one conversion.
    pub job_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub spotify: ServiceConfig,
    pub youtube: ServiceConfig,
    pub worker: WorkerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "postgres://localhost:5432/tracklift"),
            redis_url: env_or("REDIS_URL", "redis://localhost:6379"),
            spotify: ServiceConfig {
                base_url: env_or("SPOTIFY_SERVICE_URL", "http://localhost:8080"),
                timeout: env_secs("SPOTIFY_SERVICE_TIMEOUT", 30),
            },
            youtube: ServiceConfig {
                base_url: env_or("YOUTUBE_SERVICE_URL", "http://localhost:8081"),
                timeout: env_secs("YOUTUBE_SERVICE_TIMEOUT", 30),
            },
            worker: WorkerConfig {
                concurrency: env_u64("WORKER_CONCURRENCY", 5).max(1) as usize,
                poll_interval: env_secs("WORKER_POLL_INTERVAL", 1),
                job_timeout: env_secs("WORKER_JOB_TIMEOUT", 300),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset or unparseable values fall back to the default.
fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_u64(key, default_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so parallel tests never race
    // on shared process environment.

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("TRACKLIFT_TEST_UNSET_STR", "fallback"), "fallback");
    }

    #[test]
    fn env_u64_parses_set_values() {
        std::env::set_var("TRACKLIFT_TEST_U64", "12");
        assert_eq!(env_u64("TRACKLIFT_TEST_U64", 5), 12);
    }

    #[test]
    fn env_u64_falls_back_on_garbage() {
        std::env::set_var("TRACKLIFT_TEST_U64_BAD", "not-a-number");
        assert_eq!(env_u64("TRACKLIFT_TEST_U64_BAD", 5), 5);
    }

    #[test]
    fn env_secs_builds_durations() {
        std::env::set_var("TRACKLIFT_TEST_SECS", "90");
        assert_eq!(env_secs("TRACKLIFT_TEST_SECS", 1), Duration::from_secs(90));
        assert_eq!(
            env_secs("TRACKLIFT_TEST_SECS_UNSET", 300),
            Duration::from_secs(300)
        );
    }
}

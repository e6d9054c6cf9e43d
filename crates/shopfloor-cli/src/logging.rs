// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tracing subscriber setup.
//!
//! Filter priority: `SHOPFLOOR_LOG`, then `RUST_LOG`, then `[log].level`.
//! The TUI owns the terminal, so interactive runs write to a log file;
//! one-shot commands write to stderr.

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const LOG_ENV: &str = "SHOPFLOOR_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn init(level: &str, target: &LogTarget) -> Result<()> {
    let filter = build_env_filter(level);

    match target {
        LogTarget::Stderr => {
            let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(use_ansi)
                        .without_time()
                        .compact(),
                )
                .try_init()
                .map_err(|error| anyhow!("install tracing subscriber: {error}"))
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| {
                    format!(
                        "open log file {} -- set [log].file to a writable path",
                        path.display()
                    )
                })?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .map_err(|error| anyhow!("install tracing subscriber: {error}"))
        }
    }
}

/// Unparseable env directives fall through to the next source.
fn build_env_filter(level: &str) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::build_env_filter;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_log_env<T>(shopfloor: Option<&str>, rust: Option<&str>, body: impl FnOnce() -> T) -> T {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            match shopfloor {
                Some(value) => std::env::set_var("SHOPFLOOR_LOG", value),
                None => std::env::remove_var("SHOPFLOOR_LOG"),
            }
            match rust {
                Some(value) => std::env::set_var("RUST_LOG", value),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        let result = body();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("SHOPFLOOR_LOG");
            std::env::remove_var("RUST_LOG");
        }
        result
    }

    #[test]
    fn shopfloor_log_wins_over_rust_log_and_config() {
        let filter = with_log_env(Some("shopfloor_api=debug"), Some("trace"), || {
            build_env_filter("error")
        });
        assert_eq!(filter.to_string(), "shopfloor_api=debug");
    }

    #[test]
    fn rust_log_is_used_when_shopfloor_log_is_unset() {
        let filter = with_log_env(None, Some("info"), || build_env_filter("error"));
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn config_level_applies_without_env() {
        let filter = with_log_env(None, None, || build_env_filter("debug"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn invalid_directives_fall_through() {
        let filter = with_log_env(Some("shopfloor=loud"), None, || build_env_filter("nope=loud"));
        assert_eq!(filter.to_string(), "warn");
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue URL parsing.
//!
//! A single URL selects the queue implementation and carries its
//! parameters: `list:<id>:<id>:…` for an inline list, `file:/path` for a
//! newline-delimited file, `redis://host[:port]/db?query` (or `rediss://`
//! for TLS) for the distributed queue. Parsing never touches the network;
//! the resulting config is handed to queue construction.

use crate::id::{BuildId, TestId, WorkerId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid queue URL: {0}")]
    Malformed(#[from] url::ParseError),
    #[error("unknown queue scheme `{0}`")]
    UnknownScheme(String),
    #[error("missing `{0}` parameter in queue URL")]
    MissingParam(&'static str),
    #[error("invalid `{param}` value `{value}`")]
    InvalidValue { param: &'static str, value: String },
}

/// A parsed queue URL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueUrl {
    /// `list:` — colon-separated inline test list.
    List(Vec<TestId>),
    /// `file:` — newline-delimited test list file.
    File(PathBuf),
    /// `redis:` / `rediss:` — distributed queue on a shared store.
    Redis(RedisConfig),
}

/// Parameters of a distributed queue, from the URL query string.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisConfig {
    /// Connection URL for the store client, query stripped
    /// (`redis://host:port/db`).
    pub store_url: String,
    pub build_id: BuildId,
    /// Required for the worker role; supervisors leave it out.
    pub worker_id: Option<WorkerId>,
    /// Reservation staleness threshold; zero disables reclamation of lost
    /// reservations.
    pub timeout: Duration,
    /// Per-test requeue cap.
    pub max_requeues: u32,
    /// Global requeue budget as a fraction of the test count.
    pub requeue_tolerance: f64,
    /// Hand back the worker's retry queue instead of a fresh worker.
    pub retry: bool,
    pub socket_timeout: Option<Duration>,
    pub socket_connect_timeout: Option<Duration>,
    pub retry_on_timeout: bool,
}

impl QueueUrl {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        // `list:` payloads are colon-joined test identifiers, which may
        // legally contain `#` and other URL metacharacters. Split off the
        // scheme by hand instead of round-tripping through a URL parser.
        if let Some(payload) = raw.strip_prefix("list:") {
            let tests = payload
                .split(':')
                .filter(|part| !part.is_empty())
                .map(TestId::from)
                .collect();
            return Ok(Self::List(tests));
        }

        let url = Url::parse(raw)?;
        match url.scheme() {
            "file" => Ok(Self::File(PathBuf::from(url.path()))),
            "redis" | "rediss" => Ok(Self::Redis(RedisConfig::from_url(&url)?)),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }
}

impl RedisConfig {
    fn from_url(url: &Url) -> Result<Self, ConfigError> {
        let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        let build_id = take(&mut params, "build")
            .map(BuildId::from)
            .ok_or(ConfigError::MissingParam("build"))?;
        let worker_id = take(&mut params, "worker").map(WorkerId::from);

        let timeout = seconds_param(&mut params, "timeout")?.unwrap_or(Duration::ZERO);
        let max_requeues = int_param(&mut params, "max_requeues")?.unwrap_or(0);
        let requeue_tolerance = float_param(&mut params, "requeue_tolerance")?.unwrap_or(0.0);
        let retry = int_param(&mut params, "retry")?.unwrap_or(0) != 0;

        let socket_timeout = seconds_param(&mut params, "socket_timeout")?;
        let socket_connect_timeout = seconds_param(&mut params, "socket_connect_timeout")?;
        let retry_on_timeout = bool_param(&mut params, "retry_on_timeout")?.unwrap_or(false);

        let store_url = {
            let mut bare = url.clone();
            bare.set_query(None);
            bare.set_fragment(None);
            bare.to_string()
        };

        Ok(Self {
            store_url,
            build_id,
            worker_id,
            timeout,
            max_requeues,
            requeue_tolerance,
            retry,
            socket_timeout,
            socket_connect_timeout,
            retry_on_timeout,
        })
    }
}

/// Remove a param, treating an empty value as absent.
fn take(params: &mut HashMap<String, String>, name: &str) -> Option<String> {
    params.remove(name).filter(|value| !value.is_empty())
}

fn float_param(
    params: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<Option<f64>, ConfigError> {
    let Some(value) = take(params, name) else {
        return Ok(None);
    };
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => Ok(Some(parsed)),
        _ => Err(ConfigError::InvalidValue { param: name, value }),
    }
}

fn seconds_param(
    params: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(parsed) = float_param(params, name)? else {
        return Ok(None);
    };
    Duration::try_from_secs_f64(parsed)
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            param: name,
            value: parsed.to_string(),
        })
}

fn int_param(
    params: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<Option<u32>, ConfigError> {
    let Some(value) = take(params, name) else {
        return Ok(None);
    };
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { param: name, value })
}

fn bool_param(
    params: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(value) = take(params, name) else {
        return Ok(None);
    };
    match value.as_str() {
        "1" | "true" => Ok(Some(true)),
        "0" | "false" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue { param: name, value }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

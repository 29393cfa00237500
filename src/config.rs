use std::{env, num::NonZeroUsize, path::PathBuf, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// 入力の取得元。ローカルファイルか comment-hub サービスのどちらか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Service,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    source: SourceKind,
    catalog_path: Option<PathBuf>,
    pool_path: Option<PathBuf>,
    plan_path: PathBuf,
    report_dir: PathBuf,
    strict_validation: bool,
    comment_hub_base_url: Option<String>,
    comment_hub_service_token: Option<String>,
    comment_hub_connect_timeout: Duration,
    comment_hub_total_timeout: Duration,
    comment_hub_page_limit: NonZeroUsize,
    http_max_retries: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から Curation Worker の設定値を読み込み、検証する。
    ///
    /// `CURATION_SOURCE` が `file` の場合はカタログ／プールのパスが、
    /// `service` の場合は comment-hub のベース URL が必須になる。
    ///
    /// # Errors
    /// 必須の環境変数が未設定、もしくは各種値のパースに失敗した場合は
    /// [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let source = parse_source_kind("CURATION_SOURCE", SourceKind::File)?;
        let plan_path = PathBuf::from(env_var("CURATION_PLAN_PATH")?);
        let report_dir =
            PathBuf::from(env::var("CURATION_REPORT_DIR").unwrap_or_else(|_| "reports".to_string()));
        let strict_validation = parse_bool("CURATION_STRICT_VALIDATION", false)?;

        // Source-dependent requirements: the unused source's variables stay optional.
        let (catalog_path, pool_path, comment_hub_base_url) = match source {
            SourceKind::File => (
                Some(PathBuf::from(env_var("CURATION_CATALOG_PATH")?)),
                Some(PathBuf::from(env_var("CURATION_POOL_PATH")?)),
                env::var("COMMENT_HUB_BASE_URL").ok(),
            ),
            SourceKind::Service => (
                env::var("CURATION_CATALOG_PATH").ok().map(PathBuf::from),
                env::var("CURATION_POOL_PATH").ok().map(PathBuf::from),
                Some(env_var("COMMENT_HUB_BASE_URL")?),
            ),
        };

        let comment_hub_service_token = env::var("COMMENT_HUB_SERVICE_TOKEN").ok();
        let comment_hub_connect_timeout = parse_duration_ms("COMMENT_HUB_CONNECT_TIMEOUT_MS", 3000)?;
        let comment_hub_total_timeout = parse_duration_ms("COMMENT_HUB_TOTAL_TIMEOUT_MS", 30000)?;
        let comment_hub_page_limit = parse_non_zero_usize("COMMENT_HUB_PAGE_LIMIT", 200)?;

        // Retry settings (exponential backoff + jitter)
        let http_max_retries = parse_usize("HTTP_MAX_RETRIES", 3)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 10000)?;

        Ok(Self {
            source,
            catalog_path,
            pool_path,
            plan_path,
            report_dir,
            strict_validation,
            comment_hub_base_url,
            comment_hub_service_token,
            comment_hub_connect_timeout,
            comment_hub_total_timeout,
            comment_hub_page_limit,
            http_max_retries,
            http_backoff_base_ms,
            http_backoff_cap_ms,
        })
    }

    #[must_use]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    #[must_use]
    pub fn catalog_path(&self) -> Option<&PathBuf> {
        self.catalog_path.as_ref()
    }

    #[must_use]
    pub fn pool_path(&self) -> Option<&PathBuf> {
        self.pool_path.as_ref()
    }

    #[must_use]
    pub fn plan_path(&self) -> &PathBuf {
        &self.plan_path
    }

    #[must_use]
    pub fn report_dir(&self) -> &PathBuf {
        &self.report_dir
    }

    #[must_use]
    pub fn strict_validation(&self) -> bool {
        self.strict_validation
    }

    #[must_use]
    pub fn comment_hub_base_url(&self) -> Option<&str> {
        self.comment_hub_base_url.as_deref()
    }

    #[must_use]
    pub fn comment_hub_service_token(&self) -> Option<&str> {
        self.comment_hub_service_token.as_deref()
    }

    #[must_use]
    pub fn comment_hub_connect_timeout(&self) -> Duration {
        self.comment_hub_connect_timeout
    }

    #[must_use]
    pub fn comment_hub_total_timeout(&self) -> Duration {
        self.comment_hub_total_timeout
    }

    #[must_use]
    pub fn comment_hub_page_limit(&self) -> NonZeroUsize {
        self.comment_hub_page_limit
    }

    #[must_use]
    pub fn http_max_retries(&self) -> usize {
        self.http_max_retries
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_source_kind(name: &'static str, default: SourceKind) -> Result<SourceKind, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "file" => Ok(SourceKind::File),
        "service" => Ok(SourceKind::Service),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("expected \"file\" or \"service\", got: {raw}"),
        }),
    }
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_ms.to_string());
    let ms = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_millis(ms))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}

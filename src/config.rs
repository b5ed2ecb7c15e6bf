// Runtime configuration, validated from the command line.

use crate::cli::Cli;
use crate::query::{ContributionMode, QueryType};
use anyhow::{bail, Result};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_API_SERVER: &str = "context-api-test.seleritycorp.com";

/// Session id placeholder that asks for a generated id.
pub const AUTOMATIC_SESSION_ID: &str = "<automatic>";

pub const SUPPORT_EMAIL_ADDRESS: &str = "support@selerityinc.com";

/// Items requested per recommendations query.
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// Upper bound for how many entities a DDS query should return.
pub const DEFAULT_MAX_ENTITIES: u32 = 20;

pub const DEFAULT_PAUSE_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// API server root, always with a scheme.
    pub api_server_url: String,
    pub api_key: String,
    pub session_id: String,
    /// Only list entitled sources instead of polling for content.
    pub sources_only: bool,
    /// Free-text entity query; empty means no entity filter.
    pub query: String,
    pub exact_matching: bool,
    pub query_type: QueryType,
    pub contribution_mode: ContributionMode,
    pub batch_size: u32,
    pub max_entities: u32,
    pub pause: Duration,
}

impl Config {
    /// Validates parsed arguments. A missing api key is the only fatal
    /// problem; everything else is fixed up.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let api_key = match cli.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => bail!(
                "No usable api key given. Please run the demo command with\n\
                 \n  --apikey INSERT-YOUR-API-KEY-HERE\n\n\
                 If you have not yet gotten an API key, get in touch with us at {}",
                SUPPORT_EMAIL_ADDRESS
            ),
        };

        Ok(Config {
            api_server_url: normalize_server_url(&cli.api_server),
            api_key,
            session_id: resolve_session_id(cli.session_id.as_deref()),
            sources_only: cli.sources,
            query: cli.query,
            exact_matching: cli.exact,
            query_type: parse_query_type(&cli.query_type),
            contribution_mode: cli.contributions,
            batch_size: DEFAULT_BATCH_SIZE,
            max_entities: DEFAULT_MAX_ENTITIES,
            pause: Duration::from_secs(cli.pause_secs),
        })
    }
}

/// Prefixes `https://` unless the url already names a scheme.
pub fn normalize_server_url(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Uses the given session id, or a fresh random one when it is unset or
/// asks for automatic generation.
pub fn resolve_session_id(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if !id.is_empty() && id != AUTOMATIC_SESSION_ID => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Parses a query type, falling back to FEED with a warning.
pub fn parse_query_type(name: &str) -> QueryType {
    QueryType::from_wire(name).unwrap_or_else(|| {
        warn!("Unknown query type {}. Switching to FEED.", name);
        QueryType::Feed
    })
}

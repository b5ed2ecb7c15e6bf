// Command line surface. Parsing only; `config::Config::from_cli` validates.

use crate::config::{AUTOMATIC_SESSION_ID, DEFAULT_API_SERVER, DEFAULT_PAUSE_SECS};
use crate::query::ContributionMode;
use clap::{ArgAction, Parser};
use std::ffi::OsString;

/// Long flags that may also be spelled with a single dash (`-apikey KEY`).
const SINGLE_DASH_FLAGS: &[&str] = &[
    "apiserver",
    "apikey",
    "sessionid",
    "sources",
    "query",
    "exact",
    "querytype",
    "contributions",
    "pause-secs",
    "help",
];

/// Rewrites single-dash long flags (and `-?`) to the `--` form clap parses.
/// Anything after `--` is left alone.
pub fn normalize_args<I, A>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = A>,
    A: Into<OsString>,
{
    let mut after_separator = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg: OsString| {
            if after_separator {
                return arg;
            }
            let rewritten = match arg.to_str() {
                Some("--") => {
                    after_separator = true;
                    None
                }
                Some("-?") => Some(OsString::from("--help")),
                Some(s) => s
                    .strip_prefix('-')
                    .filter(|rest| !rest.starts_with('-') && is_single_dash_flag(rest))
                    .map(|_| OsString::from(format!("-{}", s))),
                None => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

fn is_single_dash_flag(flag: &str) -> bool {
    let name = flag.split('=').next().unwrap_or(flag);
    SINGLE_DASH_FLAGS.contains(&name)
}

#[derive(Parser, Debug)]
#[command(name = "context-api-demo", version, about = "Demo client for the Selerity Context API")]
pub struct Cli {
    /// The Context API server to connect to
    #[arg(long = "apiserver", value_name = "URL", default_value = DEFAULT_API_SERVER)]
    pub api_server: String,

    /// The key used for the API connections
    #[arg(long = "apikey", value_name = "API_KEY", env = "CONTEXT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// The session id to use for requests
    #[arg(long = "sessionid", value_name = "SESSION_ID", default_value = AUTOMATIC_SESSION_ID)]
    pub session_id: Option<String>,

    /// Output the entitled sources. In this mode, no query for content is made.
    #[arg(long)]
    pub sources: bool,

    /// Query only for content items of the given entity (e.g.: AAPL, Google)
    #[arg(long, value_name = "QUERY", default_value = "")]
    pub query: String,

    /// When matching entities, consider only exact matches instead of also partial matches
    #[arg(long)]
    pub exact: bool,

    /// The type of query to make: FEED (keep on top of latest breaking news),
    /// RECOMMENDATION (get up to speed quickly), SURVEY, SEARCH or DISCOVERY
    #[arg(long = "querytype", value_name = "TYPE", default_value = "FEED")]
    pub query_type: String,

    /// Which factors that contributed to an item's score to show
    #[arg(long, value_name = "MODE", value_enum, default_value_t = ContributionMode::None)]
    pub contributions: ContributionMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Seconds to wait between UPDATE queries
    #[arg(long, hide = true, default_value_t = DEFAULT_PAUSE_SECS)]
    pub pause_secs: u64,
}

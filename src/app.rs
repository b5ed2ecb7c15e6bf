// Wires the configuration to the transport, query layer and printer and
// runs the selected mode.

use crate::api::{HttpTransport, Transport};
use crate::config::Config;
use crate::poll::Poller;
use crate::print::Printer;
use crate::query::QueryClient;
use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::info;

/// Runs the demo against the configured server. In sources mode this
/// returns after one listing; otherwise it polls until an error occurs.
pub fn run(config: &Config) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "Using Selerity Context API server at {}", config.api_server_url)?;

    let transport = HttpTransport::new(&config.api_server_url).context("Failed to build HTTP client")?;
    info!("Posting requests to {}", transport.base_url());
    let queries = QueryClient::new(transport, config.api_key.as_str(), config.session_id.as_str());
    info!("Using session id {}", queries.session_id());

    if config.sources_only {
        let mut printer = Printer::new(&queries, out);
        print_entitled_sources(&queries, &mut printer)
    } else {
        Poller::new(&queries, out, config).run()
    }
}

/// Queries for and prints the sources the api key is entitled to.
pub fn print_entitled_sources<T: Transport, W: Write>(
    queries: &QueryClient<T>,
    printer: &mut Printer<'_, T, W>,
) -> Result<()> {
    let sources = queries
        .list_entitled_sources()
        .context("Failed to query entitled sources")?;
    printer.print_sources(&sources)?;
    Ok(())
}

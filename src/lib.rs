// Library root
// -----------
// Demo client for the Selerity Context API. The binary (`main.rs`) parses
// the command line and hands a `Config` to `app::run`.
//
// Module responsibilities:
// - `api`: HTTP transport and response validation.
// - `query`: request payloads for sources, DDS and recommendations.
// - `cache`: time-bounded cache of entity details.
// - `print`: plain-text rendering of query results.
// - `poll`: the resolve-then-poll loop and its seen-item ledger.
// - `cli`, `config`, `logging`: command line, validated settings, tracing.
pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod json;
pub mod logging;
pub mod poll;
pub mod print;
pub mod query;

#[cfg(test)]
mod testing;

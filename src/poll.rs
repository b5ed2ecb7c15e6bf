// Poll loop: resolve the query to entities once, then keep asking for
// recommendations and print the ones not seen before.

use crate::api::Transport;
use crate::config::Config;
use crate::json::scalar_as_string;
use crate::print::Printer;
use crate::query::{EntityQueryType, QueryClient, QueryMode};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Recently printed content ids, most recent first.
///
/// Only the newest `capacity` ids are kept; the API does not return items
/// older than a couple of batches in UPDATE queries.
#[derive(Debug, Clone)]
pub struct SeenLedger {
    ids: VecDeque<String>,
    capacity: usize,
}

impl SeenLedger {
    pub fn new(capacity: usize) -> Self {
        SeenLedger {
            ids: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Ledger sized for twice the per-request batch size.
    pub fn for_batch_size(batch_size: u32) -> Self {
        Self::new(2 * batch_size as usize)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records `id` and returns true if it was not seen yet. The oldest id
    /// is dropped once the ledger grows past its capacity.
    pub fn insert_if_new(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push_front(id.to_string());
        if self.ids.len() > self.capacity {
            self.ids.pop_back();
        }
        true
    }
}

/// Whether the next recommendations query is the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Initial,
    Update,
}

impl PollPhase {
    pub fn query_mode(self) -> QueryMode {
        match self {
            PollPhase::Initial => QueryMode::Initial,
            PollPhase::Update => QueryMode::Update,
        }
    }
}

pub struct Poller<'a, T, W> {
    queries: &'a QueryClient<T>,
    printer: Printer<'a, T, W>,
    config: &'a Config,
    seen: SeenLedger,
    phase: PollPhase,
    entity_ids: Vec<String>,
}

impl<'a, T: Transport, W: Write> Poller<'a, T, W> {
    pub fn new(queries: &'a QueryClient<T>, out: W, config: &'a Config) -> Self {
        Poller {
            queries,
            printer: Printer::new(queries, out),
            config,
            seen: SeenLedger::for_batch_size(config.batch_size),
            phase: PollPhase::Initial,
            entity_ids: Vec::new(),
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn seen(&self) -> &SeenLedger {
        &self.seen
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn into_printer(self) -> Printer<'a, T, W> {
        self.printer
    }

    /// Resolves the configured query to entity ids and prints the matched
    /// entities. An empty query means no entity filter and skips DDS.
    pub fn resolve_query_entity_ids(&mut self) -> Result<&[String]> {
        let config = self.config;
        let query = config.query.as_str();
        self.entity_ids.clear();
        if query.is_empty() {
            info!("No query given, asking for unfiltered recommendations");
            return Ok(&self.entity_ids);
        }

        let mode = if config.exact_matching {
            EntityQueryType::ExactMatch
        } else {
            EntityQueryType::PartialMatch
        };
        let results = self
            .queries
            .resolve_entities(query, mode, config.max_entities)
            .with_context(|| format!("Failed to resolve query '{}' to entities", query))?;

        self.printer
            .println(&format!("Query for '{}' will look for those entities:", query))?;
        for result in &results {
            let Some(entity) = result.as_object() else {
                warn!("Skipping malformed entity {}", result);
                continue;
            };
            self.printer.print_resolved_entity(entity)?;
            match entity.get("entityID").and_then(Value::as_str) {
                Some(id) => self.entity_ids.push(id.to_string()),
                None => warn!("Entity without entityID: {}", result),
            }
        }
        debug!("Resolved '{}' to {:?}", query, self.entity_ids);
        Ok(&self.entity_ids)
    }

    /// Performs one recommendations query and prints the items not seen
    /// before. Returns how many items were printed.
    pub fn poll_once(&mut self) -> Result<usize> {
        let mode = self.phase.query_mode();
        let recommendations = self
            .queries
            .query_recommendations(
                self.config.query_type,
                mode,
                self.config.batch_size,
                self.config.contribution_mode,
                &self.entity_ids,
            )
            .with_context(|| format!("{:?} recommendations query failed", mode))?;
        self.phase = PollPhase::Update;

        self.printer.println(&format!(
            "Received {} recommendations. (Printing only new ones.)",
            recommendations.len()
        ))?;
        Ok(self.print_new(&recommendations)?)
    }

    /// Prints recommendations whose content id is not in the ledger yet.
    /// Items without a content id (absent, null or not a scalar) are
    /// skipped.
    pub fn print_new(&mut self, recommendations: &[Value]) -> io::Result<usize> {
        let mut printed = 0;
        for recommendation in recommendations {
            let Some(recommendation) = recommendation.as_object() else {
                continue;
            };
            let Some(content_id) = recommendation.get("contentID").and_then(scalar_as_string) else {
                debug!("Skipping recommendation without contentID");
                continue;
            };
            if self.seen.insert_if_new(&content_id) {
                self.printer.print_recommendation(recommendation)?;
                printed += 1;
            }
        }
        Ok(printed)
    }

    /// Waits before the next UPDATE query, with a countdown on stderr.
    pub fn pause(&mut self) -> Result<()> {
        let secs = self.config.pause.as_secs();
        self.printer.println(&format!(
            "Sleeping for {} seconds before asking for updated content items",
            secs
        ))?;
        if secs == 0 {
            return Ok(());
        }

        let bar = ProgressBar::new(secs);
        bar.set_style(ProgressStyle::with_template("{spinner} next update in {msg} [{bar:30}]")?);
        for remaining in (1..=secs).rev() {
            bar.set_message(format!("{}s", remaining));
            thread::sleep(Duration::from_secs(1));
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(())
    }

    /// Resolves the query once, then polls forever. Only returns on error.
    pub fn run(&mut self) -> Result<()> {
        self.resolve_query_entity_ids()?;
        loop {
            let printed = self.poll_once()?;
            debug!("Printed {} new recommendations", printed);
            self.pause()?;
        }
    }
}

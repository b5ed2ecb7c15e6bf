// Presentation layer: renders sources, entities and recommended content
// items as plain text.
//
// Nothing in here fails because of what the API sent. Missing or oddly
// typed fields print as `<no proper FIELD>` placeholders; only write errors
// on the sink are returned.

use crate::api::Transport;
use crate::cache::EntityDetailCache;
use crate::json::{empty_marker, field_as_string, nested_field_as_string, scalar_as_string};
use crate::query::QueryClient;
use serde_json::{Map, Value};
use std::io::{self, Write};
use tracing::debug;

/// Contributor type whose contributor is an entity id.
const RELEVANCE_ENTITY: &str = "RELEVANCE_ENTITY";

/// Prints query results to a sink (stdout for the CLI, a buffer in tests).
pub struct Printer<'a, T, W> {
    out: W,
    entities: EntityDetailCache<'a, T>,
}

impl<'a, T: Transport, W: Write> Printer<'a, T, W> {
    /// Printer that loads entity details through `queries`.
    pub fn new(queries: &'a QueryClient<T>, out: W) -> Self {
        Self::with_entity_cache(EntityDetailCache::new(queries), out)
    }

    pub fn with_entity_cache(entities: EntityDetailCache<'a, T>, out: W) -> Self {
        Printer { out, entities }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    pub fn println(&mut self, s: &str) -> io::Result<()> {
        writeln!(self.out, "{}", s)
    }

    /// Prints the sources an api key is entitled to.
    pub fn print_sources(&mut self, sources: &[Value]) -> io::Result<()> {
        if sources.is_empty() {
            return self.println("API key is not entitled for any source.");
        }
        self.println("API key is entitled for the following sources:")?;
        for source in sources {
            let name = scalar_as_string(source).unwrap_or_else(|| empty_marker("sources"));
            self.println(&format!("* {}", name))?;
        }
        Ok(())
    }

    /// One line for an entity found while resolving a query.
    pub fn print_resolved_entity(&mut self, entity: &Map<String, Value>) -> io::Result<()> {
        self.println(&format!(
            "* {} -> {} ({}, {})",
            field_as_string(entity, "entityID"),
            field_as_string(entity, "displayName"),
            field_as_string(entity, "entityType"),
            field_as_string(entity, "description"),
        ))
    }

    /// Fetches (through the cache) and prints details for an entity. Failing
    /// to load them is reported inline and otherwise ignored.
    pub fn print_entity_details(&mut self, entity_id: &str) -> io::Result<()> {
        match self.entities.get(entity_id) {
            Ok(details) => self.print_entity_detail_object(&details),
            Err(e) => {
                debug!("Could not load details for entity {}: {}", entity_id, e);
                self.println(" (failed to load details)")
            }
        }
    }

    pub fn print_entity_detail_object(&mut self, details: &Map<String, Value>) -> io::Result<()> {
        self.println(&format!(
            " (i.e.: {}, {}, {})",
            field_as_string(details, "entityType"),
            field_as_string(details, "displayName"),
            field_as_string(details, "description"),
        ))
    }

    fn print_contribution(&mut self, contribution: &Value) -> io::Result<()> {
        let Some(contribution) = contribution.as_object() else {
            return self.println(&format!("  score-contribution: {}", empty_marker("contributions")));
        };

        let value = contribution
            .get("value")
            .and_then(Value::as_f64)
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| empty_marker("value"));
        let kind = field_as_string(contribution, "contributorType");
        let contributor = contribution.get("contributor").and_then(scalar_as_string);
        let shown = contributor
            .clone()
            .unwrap_or_else(|| empty_marker("contributor"));

        self.print(&format!("  score-contribution: {} {:<18} {}", value, kind, shown))?;
        match (kind == RELEVANCE_ENTITY, contributor) {
            (true, Some(entity_id)) => self.print_entity_details(&entity_id),
            (true, None) => self.println(" (failed to load details)"),
            (false, _) => self.println(""),
        }
    }

    /// Prints a recommended content item.
    pub fn print_recommendation(&mut self, recommendation: &Map<String, Value>) -> io::Result<()> {
        self.println("")?;
        self.println(&format!("* {}", field_as_string(recommendation, "headline")))?;
        self.println("")?;
        for field in ["contentID", "contentType", "source", "timestamp", "score"] {
            self.println(&format!("  {}: {}", field, field_as_string(recommendation, field)))?;
        }

        match recommendation.get("contributions") {
            None | Some(Value::Null) => {}
            Some(Value::Array(contributions)) => {
                for contribution in contributions {
                    self.print_contribution(contribution)?;
                }
            }
            Some(_) => {
                self.println(&format!("  score-contribution: {}", empty_marker("contributions")))?
            }
        }

        self.println(&format!("  summary: {}", field_as_string(recommendation, "summary")))?;
        self.println(&format!(
            "  socialInfo->author: {}",
            nested_field_as_string(recommendation, "socialInfo", "author")
        ))?;
        self.println(&format!("  linkURL: {}", field_as_string(recommendation, "linkURL")))?;

        match recommendation.get("relatedContent") {
            None | Some(Value::Null) => {}
            Some(Value::Array(related)) => {
                for item in related {
                    let line = match item.as_object() {
                        Some(item) => format!(
                            "  related content: {} {} {}",
                            field_as_string(item, "relationship"),
                            nested_field_as_string(item, "contentItem", "contentType"),
                            nested_field_as_string(item, "contentItem", "linkURL"),
                        ),
                        None => format!("  related content: {}", empty_marker("relatedContent")),
                    };
                    self.println(&line)?;
                }
            }
            Some(_) => {
                self.println(&format!("  related content: {}", empty_marker("relatedContent")))?
            }
        }
        Ok(())
    }
}

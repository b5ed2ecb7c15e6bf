// Query layer: builds the Context API request payloads on top of a
// `Transport` and pulls the result arrays out of the responses.

use crate::api::Transport;
use crate::error::ApiError;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

pub const PATH_SOURCES: &str = "/v2/sources";
pub const PATH_QUERY: &str = "/v2/query";
pub const PATH_DDS: &str = "/v2/dds/";

/// Kind of content query to make.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Feed,
    Recommendation,
    Survey,
    Search,
    Discovery,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        QueryType::Feed,
        QueryType::Recommendation,
        QueryType::Survey,
        QueryType::Search,
        QueryType::Discovery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Feed => "FEED",
            QueryType::Recommendation => "RECOMMENDATION",
            QueryType::Survey => "SURVEY",
            QueryType::Search => "SEARCH",
            QueryType::Discovery => "DISCOVERY",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much score-contribution detail the server should attach.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "UPPER")]
pub enum ContributionMode {
    #[default]
    None,
    Direct,
    All,
}

/// How DDS should match the query string.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityQueryType {
    ExactMatch,
    PartialMatch,
    EntityId,
}

/// First poll versus follow-up polls.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryMode {
    Initial,
    Update,
}

/// Context API methods for one api key and session.
pub struct QueryClient<T> {
    transport: T,
    api_key: String,
    session_id: String,
}

impl<T: Transport> QueryClient<T> {
    pub fn new(transport: T, api_key: impl Into<String>, session_id: impl Into<String>) -> Self {
        QueryClient {
            transport,
            api_key: api_key.into(),
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Common envelope every request carries.
    fn query_stub(&self) -> Map<String, Value> {
        let mut stub = Map::new();
        stub.insert("apiKey".into(), Value::String(self.api_key.clone()));
        stub.insert("sessionID".into(), Value::String(self.session_id.clone()));
        stub.insert("requestSent".into(), Value::String(timestamp()));
        stub
    }

    fn post_for_array(
        &self,
        path: &str,
        payload: Map<String, Value>,
        field: &'static str,
    ) -> Result<Vec<Value>, ApiError> {
        let mut response = self.transport.post(path, &Value::Object(payload))?;
        match response.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::MissingArray(field)),
        }
    }

    /// Sources the api key is entitled to.
    pub fn list_entitled_sources(&self) -> Result<Vec<Value>, ApiError> {
        self.post_for_array(PATH_SOURCES, self.query_stub(), "sources")
    }

    /// Resolves `query` to entities through DDS.
    pub fn resolve_entities(
        &self,
        query: &str,
        query_type: EntityQueryType,
        max_results: u32,
    ) -> Result<Vec<Value>, ApiError> {
        let mut payload = self.query_stub();
        payload.insert("query".into(), Value::String(query.to_string()));
        payload.insert("queryType".into(), json!(query_type));
        payload.insert("maxResults".into(), json!(max_results));
        self.post_for_array(PATH_DDS, payload, "result")
    }

    /// Queries for recommended content items. An empty `entity_ids` leaves
    /// the query unfiltered.
    pub fn query_recommendations(
        &self,
        query_type: QueryType,
        mode: QueryMode,
        num_items: u32,
        contribution_mode: ContributionMode,
        entity_ids: &[String],
    ) -> Result<Vec<Value>, ApiError> {
        let parameters = json!({
            "queryType": query_type,
            "queryMode": mode,
            "numItems": num_items,
            "contributionMode": contribution_mode,
        });

        let mut interests = Map::new();
        if !entity_ids.is_empty() {
            let entities: Vec<Value> = entity_ids
                .iter()
                .map(|id| json!({"entityID": id, "weight": 1.0}))
                .collect();
            interests.insert("entities".into(), Value::Array(entities));
        }

        let mut payload = self.query_stub();
        payload.insert("parameters".into(), parameters);
        payload.insert("interests".into(), Value::Object(interests));
        self.post_for_array(PATH_QUERY, payload, "recommendations")
    }
}

/// Current UTC time in ISO format at millisecond precision.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

// Time-bounded caching of entity details.
//
// Score contributions reference the same few entities over and over, so
// entity details are cached for a while instead of asking DDS for every
// printed contribution.

use crate::api::Transport;
use crate::error::ApiError;
use crate::query::{EntityQueryType, QueryClient};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Entity details are reused for this long after they were fetched.
pub const ENTITY_DETAILS_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on cached entity details.
pub const ENTITY_DETAILS_CAPACITY: usize = 1000;

/// Source of the current time, so expiry can be tested without sleeping.
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<V> {
    value: V,
    written: Instant,
    last_used: u64,
}

/// Map from string keys to values that expire a fixed time after they were
/// written. Once more than `capacity` live entries exist, the least
/// recently used one is dropped.
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Duration,
    capacity: usize,
    clock: Box<dyn Clock>,
    uses: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, SystemClock)
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: impl Clock + 'static) -> Self {
        TtlCache {
            entries: HashMap::new(),
            ttl,
            capacity,
            clock: Box::new(clock),
            uses: 0,
        }
    }

    /// Number of stored entries, expired ones included until they are
    /// next touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live value for `key`, if any.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => now.duration_since(entry.written) >= self.ttl,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }

        self.uses += 1;
        let uses = self.uses;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = uses;
            entry.value.clone()
        })
    }

    pub fn insert(&mut self, key: &str, value: V) {
        self.uses += 1;
        let entry = Entry {
            value,
            written: self.clock.now(),
            last_used: self.uses,
        };
        self.entries.insert(key.to_string(), entry);
        if self.entries.len() > self.capacity {
            self.evict();
        }
    }

    /// Returns the live value for `key`, computing and storing it with
    /// `loader` on a miss. Loader errors are returned and nothing is stored,
    /// so the next access tries again.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = loader()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn evict(&mut self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.duration_since(entry.written) < ttl);

        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Entity details by entity id, loaded from DDS on demand.
pub struct EntityDetailCache<'a, T> {
    queries: &'a QueryClient<T>,
    details: TtlCache<Map<String, Value>>,
}

impl<'a, T: Transport> EntityDetailCache<'a, T> {
    pub fn new(queries: &'a QueryClient<T>) -> Self {
        Self::with_cache(
            queries,
            TtlCache::new(ENTITY_DETAILS_TTL, ENTITY_DETAILS_CAPACITY),
        )
    }

    pub fn with_cache(queries: &'a QueryClient<T>, details: TtlCache<Map<String, Value>>) -> Self {
        EntityDetailCache { queries, details }
    }

    /// Details of `entity_id`. Fails unless DDS knows exactly one entity by
    /// that id.
    pub fn get(&mut self, entity_id: &str) -> Result<Map<String, Value>, ApiError> {
        let queries = self.queries;
        self.details.get_or_try_insert_with(entity_id, || {
            debug!("Loading details for entity {}", entity_id);
            let mut found = queries.resolve_entities(entity_id, EntityQueryType::EntityId, 1)?;
            if found.len() != 1 {
                return Err(ApiError::EntityLookup {
                    entity_id: entity_id.to_string(),
                    count: found.len(),
                });
            }
            match found.remove(0) {
                Value::Object(details) => Ok(details),
                _ => Err(ApiError::NotAnObject),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PATH_DDS;
    use crate::testing::{ManualClock, ScriptedTransport};
    use serde_json::json;

    #[test]
    fn values_expire_after_ttl() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(60), 10, clock.clone());
        cache.insert("a", 1);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get("a"), Some(1));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn reads_do_not_extend_expiry() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(60), 10, clock.clone());
        cache.insert("a", 1);
        for _ in 0..3 {
            clock.advance(Duration::from_secs(25));
            cache.get("a");
        }
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn least_recently_used_is_evicted_over_capacity() {
        let mut cache = TtlCache::with_clock(Duration::from_secs(60), 2, ManualClock::new());
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn expired_entries_go_before_live_ones() {
        let clock = ManualClock::new();
        let mut cache = TtlCache::with_clock(Duration::from_secs(60), 2, clock.clone());
        cache.insert("old", 1);
        clock.advance(Duration::from_secs(30));
        cache.insert("b", 2);
        cache.get("old");
        clock.advance(Duration::from_secs(30));
        cache.insert("c", 3);

        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn loader_errors_are_not_cached() {
        let mut cache: TtlCache<i32> = TtlCache::with_clock(Duration::from_secs(60), 2, ManualClock::new());
        let mut calls = 0;
        let first: Result<i32, &str> = cache.get_or_try_insert_with("a", || {
            calls += 1;
            Err("nope")
        });
        assert!(first.is_err());
        let second: Result<i32, &str> = cache.get_or_try_insert_with("a", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(second, Ok(7));
        let third: Result<i32, &str> = cache.get_or_try_insert_with("a", || {
            calls += 1;
            Ok(8)
        });
        assert_eq!(third, Ok(7));
        assert_eq!(calls, 2);
    }

    fn entity(id: &str) -> Value {
        json!({"entityID": id, "entityType": "ORG", "displayName": "Name", "description": "Desc"})
    }

    #[test]
    fn entity_lookups_within_ttl_hit_dds_once() {
        let transport = ScriptedTransport::new();
        transport.respond(PATH_DDS, json!({"result": [entity("E1")]}));
        let queries = QueryClient::new(&transport, "key", "session");
        let clock = ManualClock::new();
        let mut cache = EntityDetailCache::with_cache(
            &queries,
            TtlCache::with_clock(ENTITY_DETAILS_TTL, ENTITY_DETAILS_CAPACITY, clock.clone()),
        );

        let first = cache.get("E1").unwrap();
        clock.advance(Duration::from_secs(9 * 60));
        let second = cache.get("E1").unwrap();
        assert_eq!(first, second);

        let requests = transport.requests_to(PATH_DDS);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["query"], "E1");
        assert_eq!(requests[0]["queryType"], "ENTITY_ID");
        assert_eq!(requests[0]["maxResults"], 1);

        clock.advance(Duration::from_secs(61));
        cache.get("E1").unwrap();
        assert_eq!(transport.requests_to(PATH_DDS).len(), 2);
    }

    #[test]
    fn lookups_need_exactly_one_result() {
        for result in [json!([]), json!([entity("E1"), entity("E1")])] {
            let transport = ScriptedTransport::new();
            transport.respond(PATH_DDS, json!({ "result": result }));
            let queries = QueryClient::new(&transport, "key", "session");
            let mut cache = EntityDetailCache::new(&queries);

            let err = cache.get("E1").unwrap_err();
            assert!(matches!(err, ApiError::EntityLookup { ref entity_id, .. } if entity_id == "E1"));
            assert!(cache.get("E1").is_err());
            assert_eq!(transport.requests_to(PATH_DDS).len(), 2);
        }
    }

    #[test]
    fn failed_lookups_are_retried() {
        let transport = ScriptedTransport::new();
        transport.fail(PATH_DDS, "unavailable");
        transport.respond(PATH_DDS, json!({"result": [entity("E1")]}));
        let queries = QueryClient::new(&transport, "key", "session");
        let mut cache = EntityDetailCache::new(&queries);

        assert!(cache.get("E1").is_err());
        assert_eq!(cache.get("E1").unwrap()["entityID"], "E1");
        cache.get("E1").unwrap();
        assert_eq!(transport.requests_to(PATH_DDS).len(), 2);
    }
}

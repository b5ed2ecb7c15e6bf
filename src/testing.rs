// Test doubles for the transport and the clock.

use crate::api::Transport;
use crate::cache::Clock;
use crate::error::ApiError;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

enum Scripted {
    Respond(Value),
    Fail(String),
}

/// Answers each path from a queue of scripted responses; the last
/// response for a path is repeated once the queue runs dry. Every request
/// is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    script: RefCell<HashMap<String, VecDeque<Scripted>>>,
    requests: RefCell<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, response: Value) {
        self.push(path, Scripted::Respond(response));
    }

    /// Makes the next request for `path` fail with a 500 carrying `reason`.
    pub fn fail(&self, path: &str, reason: &str) {
        self.push(path, Scripted::Fail(reason.to_string()));
    }

    fn push(&self, path: &str, entry: Scripted) {
        self.script
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(entry);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.borrow().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Value> {
        self.requests
            .borrow()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn post(&self, path: &str, payload: &Value) -> Result<Map<String, Value>, ApiError> {
        self.requests
            .borrow_mut()
            .push((path.to_string(), payload.clone()));

        let mut script = self.script.borrow_mut();
        let queue = script
            .get_mut(path)
            .unwrap_or_else(|| panic!("no scripted response for {}", path));
        let popped = if queue.len() > 1 {
            queue.pop_front()
        } else {
            None
        };
        let entry = match &popped {
            Some(entry) => entry,
            None => queue.front().expect("empty script"),
        };

        match entry {
            Scripted::Respond(Value::Object(map)) => Ok(map.clone()),
            Scripted::Respond(_) => Err(ApiError::NotAnObject),
            Scripted::Fail(reason) => Err(ApiError::Status {
                code: 500,
                reason: reason.clone(),
                hint: None,
            }),
        }
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        ManualClock(Rc::new(Cell::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

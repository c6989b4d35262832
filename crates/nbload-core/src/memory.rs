// ── In-memory directory ──
//
// A `Directory` backed by plain maps. Filters follow the REST conventions
// the importer relies on: `foo=value` matches the `foo` field, `foo_id=N`
// matches a `foo` field holding `N`. Every call is recorded so callers can
// assert on exactly which operations a reconciliation performed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use crate::directory::{Directory, Record};
use crate::error::CoreError;
use crate::Resource;

/// Directory operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Create,
    Update,
}

/// One recorded directory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub resource: Resource,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    objects: HashMap<Resource, Vec<Map<String, Value>>>,
    calls: Vec<Call>,
    failures: HashMap<(Op, Resource), String>,
}

impl State {
    fn insert(&mut self, resource: Resource, fields: &Value) -> Map<String, Value> {
        self.next_id += 1;
        let mut object = fields.as_object().cloned().unwrap_or_default();
        object.insert("id".into(), Value::from(self.next_id));
        self.objects.entry(resource).or_default().push(object.clone());
        object
    }

    fn check_failure(&self, op: Op, resource: Resource) -> Result<(), CoreError> {
        match self.failures.get(&(op, resource)) {
            Some(message) => Err(CoreError::Api {
                message: message.clone(),
                status: Some(500),
            }),
            None => Ok(()),
        }
    }
}

/// In-memory `Directory` with call recording and failure injection.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<State>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an object without recording a call. Returns its id.
    pub fn seed(&self, resource: Resource, fields: Value) -> u64 {
        let object = self.lock().insert(resource, &fields);
        object.get("id").and_then(Value::as_u64).unwrap_or_default()
    }

    /// Make every subsequent `op` on `resource` fail with `message`.
    pub fn fail_on(&self, op: Op, resource: Resource, message: &str) {
        self.lock().failures.insert((op, resource), message.into());
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of recorded `op` calls against `resource`.
    pub fn count(&self, op: Op, resource: Resource) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op && c.resource == resource)
            .count()
    }

    /// Forget recorded calls (objects are kept).
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Snapshot of every object stored in `resource`.
    pub fn objects(&self, resource: Resource) -> Vec<Value> {
        self.lock()
            .objects
            .get(&resource)
            .map(|objs| objs.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// The stored object `id` in `resource`.
    pub fn object(&self, resource: Resource, id: u64) -> Option<Value> {
        self.lock()
            .objects
            .get(&resource)?
            .iter()
            .find(|o| o.get("id").and_then(Value::as_u64) == Some(id))
            .cloned()
            .map(Value::Object)
    }
}

fn field_matches(object: &Map<String, Value>, key: &str, expected: &str) -> bool {
    let value = object
        .get(key)
        .or_else(|| key.strip_suffix("_id").and_then(|k| object.get(k)));
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn to_record(object: &Map<String, Value>) -> Record {
    let label = ["display", "name", "model", "address"]
        .iter()
        .find_map(|k| object.get(*k).and_then(Value::as_str))
        .map(str::to_owned);
    let id = object.get("id").and_then(Value::as_u64).unwrap_or_default();
    Record {
        id,
        display: label.unwrap_or_else(|| format!("#{id}")),
        device: object.get("device").and_then(Value::as_u64),
        assigned_object_type: object
            .get("assigned_object_type")
            .and_then(Value::as_str)
            .map(str::to_owned),
        assigned_object_id: object.get("assigned_object_id").and_then(Value::as_u64),
    }
}

impl Directory for MemoryDirectory {
    async fn get(
        &self,
        resource: Resource,
        filter: &[(&str, String)],
    ) -> Result<Option<Record>, CoreError> {
        let mut state = self.lock();
        state.calls.push(Call {
            op: Op::Get,
            resource,
        });
        state.check_failure(Op::Get, resource)?;

        let matches: Vec<&Map<String, Value>> = state
            .objects
            .get(&resource)
            .map(|objs| {
                objs.iter()
                    .filter(|o| filter.iter().all(|(k, v)| field_matches(o, k, v)))
                    .collect()
            })
            .unwrap_or_default();

        match matches.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(to_record(one))),
            many => Err(CoreError::Ambiguous {
                entity_type: resource.label().into(),
                count: u64::try_from(many.len()).unwrap_or(u64::MAX),
            }),
        }
    }

    async fn create(&self, resource: Resource, fields: &Value) -> Result<Record, CoreError> {
        let mut state = self.lock();
        state.calls.push(Call {
            op: Op::Create,
            resource,
        });
        state.check_failure(Op::Create, resource)?;

        let object = state.insert(resource, fields);
        Ok(to_record(&object))
    }

    async fn update(&self, resource: Resource, id: u64, fields: &Value) -> Result<(), CoreError> {
        let mut state = self.lock();
        state.calls.push(Call {
            op: Op::Update,
            resource,
        });
        state.check_failure(Op::Update, resource)?;

        let object = state
            .objects
            .get_mut(&resource)
            .and_then(|objs| {
                objs.iter_mut()
                    .find(|o| o.get("id").and_then(Value::as_u64) == Some(id))
            })
            .ok_or_else(|| CoreError::NotFound {
                entity_type: resource.label().into(),
                identifier: id.to_string(),
            })?;

        if let Some(patch) = fields.as_object() {
            for (k, v) in patch {
                object.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

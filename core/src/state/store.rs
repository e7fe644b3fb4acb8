//! Observable path store.
//!
//! A tree of `serde_json::Value` mappings addressed by dotted paths, with
//! per-path subscriptions. Writes that change a value notify the exact
//! path's subscribers synchronously, in subscription order.
//!
//! # Invariants
//!
//! 1. Intermediate segments are created as empty mappings on write (an
//!    absent or null intermediate is replaced by `{}`).
//! 2. Reading through a missing, null, or non-mapping segment yields `None`.
//! 3. Subscribers are notified iff the new value differs from the old one.
//! 4. Notifications are keyed by the exact path; there is no propagation to
//!    ancestors or descendants.
//! 5. A panicking subscriber is isolated: later subscribers still run and
//!    the panic never reaches the writer.
//! 6. A write or removal at a path issued while that path is notifying is
//!    queued and applied after the current round. At most [`MAX_QUEUED_WRITES`] queued
//!    writes are drained per outer write; the rest are dropped.
//!
//! The store is single-threaded: handles share an `Rc<RefCell<..>>` and no
//! borrow is held while subscribers run, so subscribers may freely read,
//! write, subscribe and unsubscribe.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::errors::StateError;
use super::path::StatePath;
use super::schema::{initial_tree, AllowList};

/// Alias for stored values; `serde_json::Value` covers every JSON type.
pub type StateValue = Value;

/// Upper bound on queued same-path writes drained by one outer write.
pub const MAX_QUEUED_WRITES: usize = 64;

type Callback = Rc<dyn Fn(&StateValue, Option<&StateValue>)>;

/// A write deferred while its path was notifying.
#[derive(Debug, Clone)]
enum PendingWrite {
    Set(StateValue),
    Remove,
}

struct Listener {
    id: u64,
    callback: Callback,
}

struct StoreInner {
    tree: Value,
    listeners: HashMap<String, Vec<Listener>>,
    next_id: u64,
    allow: Option<AllowList>,
    /// Paths whose subscribers are currently running.
    notifying: HashSet<String>,
    /// Paths whose queued writes are being drained by an outer frame.
    draining: HashSet<String>,
    /// Writes deferred because their path was notifying.
    queued: HashMap<String, VecDeque<PendingWrite>>,
}


/// Shared handle to an observable path store.
///
/// Cloning an `ObservableStore` creates a new handle to the **same** tree
/// and subscriptions.
#[derive(Clone)]
pub struct ObservableStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl ObservableStore {
    /// Create an empty store that accepts any well-formed path.
    pub fn new() -> Self {
        Self::from_parts(Value::Object(Map::new()), None)
    }

    /// Create a store seeded with `tree`, accepting any well-formed path.
    pub fn with_tree(tree: Map<String, Value>) -> Self {
        Self::from_parts(Value::Object(tree), None)
    }

    /// Create the wallet client's store: seeded with the initial layout and
    /// restricted to the app's known paths.
    pub fn for_app() -> Self {
        Self::from_parts(initial_tree(), Some(AllowList::app()))
    }

    fn from_parts(tree: Value, allow: Option<AllowList>) -> Self {
        ObservableStore {
            inner: Rc::new(RefCell::new(StoreInner {
                tree,
                listeners: HashMap::new(),
                next_id: 0,
                allow,
                notifying: HashSet::new(),
                draining: HashSet::new(),
                queued: HashMap::new(),
            })),
        }
    }

    /// Register `callback` for changes at exactly `path`.
    ///
    /// The callback receives `(new, old)`; `old` is `None` when the path did
    /// not exist before the write. Dropping the returned [`Subscription`]
    /// does not unsubscribe; call [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, path: &str, callback: F) -> Result<Subscription, StateError>
    where
        F: Fn(&StateValue, Option<&StateValue>) + 'static,
    {
        let parsed = self.checked_path(path)?;
        let key = parsed.to_dotted();

        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .listeners
            .entry(key.clone())
            .or_default()
            .push(Listener {
                id,
                callback: Rc::new(callback),
            });
        tracing::debug!(path = %key, id, "state subscribe");

        Ok(Subscription {
            store: Rc::downgrade(&self.inner),
            path: key,
            id,
            active: Cell::new(true),
        })
    }

    /// GET the value at `path`.
    ///
    /// Returns `None` when any segment is missing or a prefix is not a
    /// mapping, and for malformed or disallowed paths.
    pub fn get(&self, path: &str) -> Option<StateValue> {
        let parsed = match self.checked_path(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path, error = %e, "state read rejected");
                return None;
            }
        };
        let inner = self.inner.borrow();
        read_at(&inner.tree, &parsed).cloned()
    }

    /// GET the value at `path` and deserialize it. Missing, null, and
    /// mistyped values all yield `None`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.get(path)? {
            Value::Null => None,
            value => serde_json::from_value(value).ok(),
        }
    }

    /// SET `value` at `path`, creating intermediate mappings as needed, and
    /// notify the path's subscribers if the value changed.
    pub fn set(&self, path: &str, value: StateValue) -> Result<(), StateError> {
        let parsed = self.checked_path(path)?;
        let key = parsed.to_dotted();
        self.write_and_notify(&parsed, &key, PendingWrite::Set(value))?;
        self.drain_queued(&parsed, &key);
        Ok(())
    }

    /// Remove the leaf at `path`, returning the old value. Subscribers see
    /// `Null` as the new value when a non-null value was removed.
    ///
    /// Like `set`, a removal issued while `path` is notifying is queued
    /// behind the current round; it then returns `Ok(None)`.
    pub fn remove(&self, path: &str) -> Result<Option<StateValue>, StateError> {
        let parsed = self.checked_path(path)?;
        let key = parsed.to_dotted();
        let removed = self.write_and_notify(&parsed, &key, PendingWrite::Remove)?;
        self.drain_queued(&parsed, &key);
        Ok(removed)
    }

    /// A copy of the whole tree.
    pub fn snapshot(&self) -> StateValue {
        self.inner.borrow().tree.clone()
    }

    /// Number of live subscriptions at exactly `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        let key = match StatePath::parse(path) {
            Ok(p) => p.to_dotted(),
            Err(_) => return 0,
        };
        self.inner
            .borrow()
            .listeners
            .get(&key)
            .map(Vec::len)
            .unwrap_or(0)
    }

    // -------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------

    fn checked_path(&self, path: &str) -> Result<StatePath, StateError> {
        let parsed = StatePath::parse(path)?;
        if let Some(allow) = &self.inner.borrow().allow {
            if !allow.is_allowed(&parsed) {
                return Err(StateError::UnknownPath {
                    path: parsed.to_dotted(),
                });
            }
        }
        Ok(parsed)
    }

    /// Apply `write` unless `key` is notifying, in which case it is queued.
    /// Returns the previous value at `key` (`None` when queued).
    fn write_and_notify(
        &self,
        path: &StatePath,
        key: &str,
        write: PendingWrite,
    ) -> Result<Option<StateValue>, StateError> {
        let (old, new, changed) = {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying.contains(key) {
                tracing::debug!(path = %key, "state write queued behind notification");
                inner
                    .queued
                    .entry(key.to_string())
                    .or_default()
                    .push_back(write);
                return Ok(None);
            }
            match write {
                PendingWrite::Set(value) => {
                    let old = write_at(&mut inner.tree, path, value.clone())?;
                    let changed = old.as_ref() != Some(&value);
                    (old, value, changed)
                }
                PendingWrite::Remove => {
                    let old = remove_at(&mut inner.tree, path);
                    let changed = old.as_ref().is_some_and(|v| !v.is_null());
                    (old, Value::Null, changed)
                }
            }
        };

        if changed {
            tracing::debug!(path = %key, "state changed");
            self.notify(key, &new, old.as_ref());
        }
        Ok(old)
    }

    fn drain_queued(&self, path: &StatePath, key: &str) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying.contains(key) || !inner.draining.insert(key.to_string()) {
                return;
            }
        }

        let mut drained = 0;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                inner.queued.get_mut(key).and_then(VecDeque::pop_front)
            };
            let Some(write) = next else {
                break;
            };
            if drained == MAX_QUEUED_WRITES {
                let dropped = {
                    let mut inner = self.inner.borrow_mut();
                    inner.queued.remove(key).map(|q| q.len()).unwrap_or(0) + 1
                };
                tracing::warn!(path = %key, dropped, "too many re-entrant state writes; dropping the rest");
                break;
            }
            drained += 1;
            if let Err(e) = self.write_and_notify(path, key, write) {
                tracing::warn!(path = %key, error = %e, "queued state write failed");
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.draining.remove(key);
        if inner.queued.get(key).is_some_and(VecDeque::is_empty) {
            inner.queued.remove(key);
        }
    }

    fn notify(&self, key: &str, new: &StateValue, old: Option<&StateValue>) {
        let callbacks: Vec<(u64, Callback)> = {
            let mut inner = self.inner.borrow_mut();
            let snapshot = match inner.listeners.get(key) {
                Some(list) if !list.is_empty() => list
                    .iter()
                    .map(|l| (l.id, Rc::clone(&l.callback)))
                    .collect(),
                _ => return,
            };
            inner.notifying.insert(key.to_string());
            snapshot
        };

        for (id, callback) in callbacks {
            // A subscriber removed earlier in this round is skipped.
            if !self.is_registered(key, id) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(new, old)));
            if let Err(payload) = outcome {
                tracing::error!(
                    path = %key,
                    id,
                    "state listener panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        self.inner.borrow_mut().notifying.remove(key);
    }

    fn is_registered(&self, key: &str, id: u64) -> bool {
        self.inner
            .borrow()
            .listeners
            .get(key)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }
}

impl Default for ObservableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObservableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableStore")
            .field("tree", &inner.tree)
            .field("paths_with_listeners", &inner.listeners.len())
            .field("allow_list", &inner.allow.is_some())
            .finish()
    }
}


// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle for one registration made by [`ObservableStore::subscribe`].
pub struct Subscription {
    store: Weak<RefCell<StoreInner>>,
    path: String,
    id: u64,
    active: Cell<bool>,
}

impl Subscription {
    /// Remove exactly this registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let mut inner = store.borrow_mut();
        if let Some(list) = inner.listeners.get_mut(&self.path) {
            list.retain(|l| l.id != self.id);
            if list.is_empty() {
                inner.listeners.remove(&self.path);
            }
        }
        tracing::debug!(path = %self.path, id = self.id, "state unsubscribe");
    }

    /// False once `unsubscribe` has been called.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// The normalized path this subscription watches.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}


// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

fn read_at<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    let mut current = root;
    for seg in path.segments() {
        current = match current {
            Value::Object(map) => map.get(seg)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Assign `value` at `path`, returning the previous value. Fails without
/// touching the tree if a non-null leaf sits on the way.
fn write_at(root: &mut Value, path: &StatePath, value: Value) -> Result<Option<Value>, StateError> {
    let segments = path.segments();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(StateError::EmptyPath),
    };

    let mut cursor = &*root;
    for (i, seg) in parents.iter().enumerate() {
        match cursor.get(seg.as_str()) {
            None | Some(Value::Null) => break,
            Some(next @ Value::Object(_)) => cursor = next,
            Some(_) => {
                return Err(StateError::NotAMapping {
                    path: path.to_dotted(),
                    segment: segments[..=i].join("."),
                })
            }
        }
    }

    let mut current = root;
    for seg in parents {
        current = match current {
            Value::Object(map) => {
                let slot = map.entry(seg.clone()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = Value::Object(Map::new());
                }
                slot
            }
            _ => {
                return Err(StateError::NotAMapping {
                    path: path.to_dotted(),
                    segment: seg.clone(),
                })
            }
        };
    }

    match current {
        Value::Object(map) => Ok(map.insert(last.clone(), value)),
        _ => Err(StateError::NotAMapping {
            path: path.to_dotted(),
            segment: last.clone(),
        }),
    }
}

fn remove_at(root: &mut Value, path: &StatePath) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    let mut current = root;
    for seg in parents {
        current = match current {
            Value::Object(map) => map.get_mut(seg)?,
            _ => return None,
        };
    }
    match current {
        Value::Object(map) => map.remove(last),
        _ => None,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,7}", 1..5).prop_map(|segs| segs.join("."))
    }

    fn value_strategy() -> impl Strategy<Value = StateValue> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[ -~]{0,12}".prop_map(Value::from),
            prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(|v| json!(v)),
        ]
    }

    proptest! {
        #[test]
        fn round_trip(path in path_strategy(), value in value_strategy()) {
            let store = ObservableStore::new();
            store.set(&path, value.clone()).unwrap();
            prop_assert_eq!(store.get(&path), Some(value));
        }

        #[test]
        fn unwritten_paths_read_none(path in path_strategy()) {
            let store = ObservableStore::new();
            prop_assert_eq!(store.get(&path), None);
        }

        #[test]
        fn parent_contains_written_key(path in path_strategy(), value in value_strategy()) {
            let store = ObservableStore::new();
            store.set(&path, value).unwrap();
            let parsed = StatePath::parse(&path).unwrap();
            if let Some(parent) = parsed.parent() {
                let node = store.get(&parent.to_dotted()).unwrap();
                prop_assert!(node.as_object().unwrap().contains_key(parsed.last()));
            }
        }

        #[test]
        fn notifies_only_on_change(
            path in path_strategy(),
            v0 in value_strategy(),
            v1 in value_strategy(),
        ) {
            prop_assume!(v0 != v1);
            let store = ObservableStore::new();
            store.set(&path, v0.clone()).unwrap();
            let hits = Rc::new(Cell::new(0));
            let h = Rc::clone(&hits);
            let _sub = store.subscribe(&path, move |_, _| h.set(h.get() + 1)).unwrap();
            store.set(&path, v0).unwrap();
            prop_assert_eq!(hits.get(), 0);
            store.set(&path, v1.clone()).unwrap();
            prop_assert_eq!(hits.get(), 1);
            store.set(&path, v1).unwrap();
            prop_assert_eq!(hits.get(), 1);
        }
    }
}

//! In-flight operation flags kept at `ui.loading`.
//!
//! The flags are a sorted JSON array of operation names. Every change builds
//! a new array and writes it through [`ObservableStore::set`], so adding or
//! removing a name notifies `ui.loading` subscribers, while setting a flag
//! to the state it already has does not.

use serde_json::Value;

use super::errors::StateError;
use super::schema::paths;
use super::store::ObservableStore;

impl ObservableStore {
    /// Mark `operation` as in flight (`true`) or finished (`false`).
    pub fn set_loading(&self, operation: &str, is_loading: bool) -> Result<(), StateError> {
        let mut ops = self.loading_operations();
        let present = ops.iter().any(|o| o == operation);
        match (is_loading, present) {
            (true, false) => {
                ops.push(operation.to_string());
                ops.sort();
            }
            (false, true) => ops.retain(|o| o != operation),
            _ => {}
        }
        self.set(paths::LOADING, Value::from(ops))
    }

    /// True while `operation` is marked in flight.
    pub fn is_loading(&self, operation: &str) -> bool {
        self.loading_operations().iter().any(|o| o == operation)
    }

    /// Names of all in-flight operations, sorted.
    pub fn loading_operations(&self) -> Vec<String> {
        match self.get(paths::LOADING) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

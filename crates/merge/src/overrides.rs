//! Override-list merging for item model JSON.
//!
//! An item model's `overrides` is an ordered list of rules; each rule pairs
//! a predicate (for our purposes, a numeric `custom_model_data` value) with
//! an alternate model reference. The game applies the list first-match-wins,
//! so merging must only ever *append* later sources' rules after earlier
//! ones. All other fields of the model are frozen at first extraction; a
//! later source's differing base model never propagates.

use serde_json::Value;

const OVERRIDES: &str = "overrides";

/// The numeric `custom_model_data` predicate of a single override rule, if
/// it has one. Rules keyed on other predicates (pulling, blocking, ...) are
/// merged all the same but never registered.
pub(crate) fn custom_model_data(rule: &Value) -> Option<i64> {
    rule.get("predicate")?.get("custom_model_data")?.as_i64()
}

/// The override rules of a model, in declaration order.
pub(crate) fn rules(model: &Value) -> &[Value] {
    model.get(OVERRIDES).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Append every override rule of `incoming` to `existing`'s list,
/// initializing the list if absent. Returns the appended rules.
///
/// `existing` is otherwise left untouched.
pub(crate) fn append_rules(existing: &mut Value, incoming: &Value) -> Vec<Value> {
    let appended: Vec<Value> = rules(incoming).to_vec();
    if appended.is_empty() {
        return appended;
    }
    match existing.get_mut(OVERRIDES).and_then(Value::as_array_mut) {
        Some(list) => list.extend(appended.iter().cloned()),
        None => {
            // Also covers a malformed non-array `overrides`: the incoming
            // list wins over garbage.
            existing[OVERRIDES] = Value::Array(appended.clone());
        },
    }
    appended
}

//! Payload merging for write verbs
//!
//! Each function lists its layers lowest precedence first; a later layer
//! overwrites overlapping keys of every earlier one.

use crate::query::FilterCondition;
use crate::repository::Entity;

/// Path-bound values keyed by field
pub fn param_values(param_filters: &[FilterCondition]) -> Entity {
    param_filters
        .iter()
        .map(|filter| (filter.field.clone(), filter.value.clone()))
        .collect()
}

fn layered(layers: &[&Entity]) -> Entity {
    let mut merged = Entity::new();
    for layer in layers {
        for (field, value) in layer.iter() {
            merged.insert(field.clone(), value.clone());
        }
    }
    merged
}

/// `auth ⊕ payload ⊕ params`; `None` when nothing is left to write
pub fn merge_for_create(payload: &Entity, params: &Entity, auth: &Entity) -> Option<Entity> {
    let merged = layered(&[auth, payload, params]);
    (!merged.is_empty()).then_some(merged)
}

/// Partial update
///
/// - params locked: `existing ⊕ payload ⊕ params ⊕ auth`
/// - params overridable: `existing ⊕ payload ⊕ auth`
pub fn merge_for_update(
    existing: &Entity,
    payload: &Entity,
    params: &Entity,
    auth: &Entity,
    allow_params_override: bool,
) -> Entity {
    if allow_params_override {
        layered(&[existing, payload, auth])
    } else {
        layered(&[existing, payload, params, auth])
    }
}

/// Replacement
///
/// - params locked: `existing ⊕ payload ⊕ params ⊕ auth`
/// - params overridable: `existing ⊕ params ⊕ payload ⊕ auth`
pub fn merge_for_replace(
    existing: &Entity,
    payload: &Entity,
    params: &Entity,
    auth: &Entity,
    allow_params_override: bool,
) -> Entity {
    if allow_params_override {
        layered(&[existing, params, payload, auth])
    } else {
        layered(&[existing, payload, params, auth])
    }
}

/// Reorder Engine: apply a client-supplied ordering of IDs to one scope.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::position::Positioned;

/// How an `orderedIds` payload is reconciled with the scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderPolicy {
    /// Merge-preserving-untouched. Each known ID gets its index within
    /// `orderedIds`; unknown IDs are ignored and absent entities keep their
    /// old position, which may then collide with a reassigned one.
    #[default]
    Lenient,
    /// Full replace. `orderedIds` must be a permutation of the scope; the
    /// result is always dense.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("orderedIds has {given} entries but the scope has {expected}")]
    LengthMismatch { expected: usize, given: usize },

    #[error("orderedIds contains unknown id {0}")]
    UnknownId(String),

    #[error("orderedIds contains {0} more than once")]
    DuplicateId(String),
}

/// Reassign positions in `scope` to follow `ordered_ids`.
pub fn reorder<T: Positioned>(
    scope: &mut [&mut T],
    ordered_ids: &[String],
    policy: ReorderPolicy,
) -> Result<(), ReorderError> {
    if policy == ReorderPolicy::Strict {
        validate_permutation(scope, ordered_ids)?;
    }

    for (index, id) in ordered_ids.iter().enumerate() {
        if let Some(item) = scope.iter_mut().find(|item| item.id() == id.as_str()) {
            item.set_position(index as i64);
        }
    }
    Ok(())
}

fn validate_permutation<T: Positioned>(
    scope: &[&mut T],
    ordered_ids: &[String],
) -> Result<(), ReorderError> {
    let known: HashSet<&str> = scope.iter().map(|item| item.id()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        if !known.contains(id.as_str()) {
            return Err(ReorderError::UnknownId(id.clone()));
        }
        if !seen.insert(id.as_str()) {
            return Err(ReorderError::DuplicateId(id.clone()));
        }
    }
    if ordered_ids.len() != scope.len() {
        return Err(ReorderError::LengthMismatch {
            expected: scope.len(),
            given: ordered_ids.len(),
        });
    }
    Ok(())
}

use std::collections::BTreeSet;

use crate::model::FieldMap;

/// Names of the fields whose incoming value differs from the stored one.
///
/// Only fields present in both maps are compared; a field the incoming
/// record does not carry never counts as a difference, so a partial
/// normalization can not blank out stored values. Equality is exact.
pub fn changed_fields(existing: &FieldMap, incoming: &FieldMap) -> BTreeSet<String> {
    incoming
        .iter()
        .filter(|(name, value)| {
            existing
                .get(name.as_str())
                .is_some_and(|current| current != *value)
        })
        .map(|(name, _)| name.clone())
        .collect()
}

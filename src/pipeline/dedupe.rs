use std::collections::HashSet;

use crate::domain::ResourceRecord;

#[derive(Debug, Default)]
pub struct DedupeOutcome {
    pub records: Vec<ResourceRecord>,
    pub removed: usize,
}

/// Concatenates the batches in the given order and keeps the first record
/// seen for each identity key, so an existing dataset passed first takes
/// precedence over a newly ingested batch. The removed count is reported for
/// operator visibility only.
pub fn merge_deduped(batches: Vec<Vec<ResourceRecord>>, include_address: bool) -> DedupeOutcome {
    let mut seen = HashSet::new();
    let mut outcome = DedupeOutcome::default();
    for batch in batches {
        for record in batch {
            if seen.insert(record.identity_key(include_address)) {
                outcome.records.push(record);
            } else {
                outcome.removed += 1;
            }
        }
    }
    outcome
}

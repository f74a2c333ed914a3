use std::collections::HashMap;

use crate::contract::{AccountRegionPair, QueryResultRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub key: AccountRegionPair,
    pub rows: Vec<QueryResultRow>,
}

/// Partitions rows by (account, region).
///
/// Group order follows the first appearance of each key in the source;
/// row order within a group is the source order. Every pushed row lands in
/// exactly one group.
#[derive(Debug, Default)]
pub struct RowGroups {
    groups: Vec<RowGroup>,
    index_by_key: HashMap<AccountRegionPair, usize>,
}

impl RowGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: QueryResultRow) {
        let key = row.account_and_region();
        match self.index_by_key.get(&key) {
            Some(&index) => self.groups[index].rows.push(row),
            None => {
                self.index_by_key.insert(key.clone(), self.groups.len());
                self.groups.push(RowGroup {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<RowGroup> {
        self.groups
    }
}

//! In-memory rollup index store.
//!
//! Keyed two ways, mirroring the persistent metadata service this stands in
//! front of: by index name (save/fetch/remove) and by source-table uid
//! (cursor over index names, whole-bundle retrieval). The persistence layer
//! itself is an external collaborator; this store holds the same key
//! structure in memory.

use std::collections::BTreeMap;

use tempoql_error::{Result, TempoError};
use tempoql_types::{INDEX_NAME_LEN, TableUid};
use tracing::debug;

use crate::{RollupBundle, RollupIndex};

/// In-memory keyed store of rollup index definitions.
#[derive(Debug, Default)]
pub struct RollupStore {
    /// Name → definition. BTreeMap keeps cursor order deterministic.
    by_name: BTreeMap<String, RollupIndex>,
}

impl RollupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Save a definition, overwriting any previous definition of the same
    /// name. The name bound is enforced here, before the definition becomes
    /// visible to any reader.
    pub fn save(&mut self, index: RollupIndex) -> Result<()> {
        if index.index_name.len() >= INDEX_NAME_LEN {
            return Err(TempoError::IdentifierTooLong {
                what: "index name",
                len: index.index_name.len(),
                max: INDEX_NAME_LEN,
            });
        }
        debug!(
            "saving rollup index {} for table uid {}",
            index.index_name, index.table_uid
        );
        self.by_name.insert(index.index_name.clone(), index);
        Ok(())
    }

    /// Fetch a definition by index name.
    pub fn get(&self, name: &str) -> Result<&RollupIndex> {
        self.by_name.get(name).ok_or_else(|| TempoError::IndexNotFound {
            name: name.to_owned(),
        })
    }

    /// Remove a definition by index name, returning it.
    pub fn remove(&mut self, name: &str) -> Result<RollupIndex> {
        match self.by_name.remove(name) {
            Some(index) => {
                debug!("removed rollup index {name}");
                Ok(index)
            }
            None => Err(TempoError::IndexNotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// Cursor over the names of every index defined on `table_uid`.
    #[must_use]
    pub fn cursor(&self, table_uid: TableUid) -> RollupCursor<'_> {
        RollupCursor {
            inner: self.by_name.values(),
            table_uid,
        }
    }

    /// Every definition on `table_uid` as one bundle, or `None` if the table
    /// has no rollup indexes.
    #[must_use]
    pub fn bundle_for_table(&self, table_uid: TableUid) -> Option<RollupBundle> {
        let indexes: Vec<RollupIndex> = self
            .by_name
            .values()
            .filter(|index| index.table_uid == table_uid)
            .cloned()
            .collect();
        if indexes.is_empty() {
            None
        } else {
            Some(RollupBundle { indexes })
        }
    }

    /// Distinct uids of every table that has at least one rollup index.
    #[must_use]
    pub fn table_uids(&self) -> Vec<TableUid> {
        let mut uids: Vec<TableUid> = self.by_name.values().map(|i| i.table_uid).collect();
        uids.sort_unstable();
        uids.dedup();
        uids
    }
}

/// Iterator over the index names of one source table.
#[derive(Debug)]
pub struct RollupCursor<'a> {
    inner: std::collections::btree_map::Values<'a, String, RollupIndex>,
    table_uid: TableUid,
}

impl<'a> Iterator for RollupCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|index| index.table_uid == self.table_uid)
            .map(|index| index.index_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempoql_types::{PRIMARY_TS_COL_ID, TimeUnit};

    use crate::RollupFuncColumns;

    const TB_UID: TableUid = 1_234_567_890;

    fn index(name: &str, uid: TableUid) -> RollupIndex {
        RollupIndex {
            version: 0,
            interval_unit: TimeUnit::Day,
            sliding_unit: TimeUnit::Hour,
            index_name: name.to_owned(),
            timezone: "Asia/Shanghai".to_owned(),
            table_uid: uid,
            interval: 1,
            sliding: 0,
            func_columns: vec![RollupFuncColumns {
                func_id: 1,
                col_ids: (0..10).map(|i| i + PRIMARY_TS_COL_ID).collect(),
            }],
            tags_filter: b"I'm tags filter".to_vec(),
        }
    }

    #[test]
    fn test_save_get_remove_by_name() {
        let mut store = RollupStore::new();
        store.save(index("rollup_index_1", TB_UID)).expect("save 1");

        let mut second = index("rollup_index_2", TB_UID);
        second.version = 1;
        second.interval_unit = TimeUnit::Hour;
        second.sliding_unit = TimeUnit::Minute;
        second.sliding = 5;
        store.save(second).expect("save 2");

        let first = store.get("rollup_index_1").expect("get 1");
        assert_eq!(first.index_name, "rollup_index_1");
        assert_eq!(first.table_uid, TB_UID);

        let second = store.get("rollup_index_2").expect("get 2");
        assert_eq!(second.interval, 1);
        assert_eq!(second.sliding, 5);

        store.remove("rollup_index_1").expect("remove 1");
        store.remove("rollup_index_2").expect("remove 2");
        assert!(store.is_empty());
        assert!(matches!(
            store.get("rollup_index_1"),
            Err(TempoError::IndexNotFound { .. })
        ));
    }

    #[test]
    fn test_cursor_walks_only_matching_table() {
        let mut store = RollupStore::new();
        store.save(index("a_idx", TB_UID)).expect("save");
        store.save(index("b_idx", TB_UID)).expect("save");
        store.save(index("other_idx", 777)).expect("save");

        let names: Vec<&str> = store.cursor(TB_UID).collect();
        assert_eq!(names, ["a_idx", "b_idx"]);
        assert_eq!(store.cursor(42).count(), 0);
    }

    #[test]
    fn test_bundle_for_table() {
        let mut store = RollupStore::new();
        store.save(index("a_idx", TB_UID)).expect("save");
        store.save(index("b_idx", TB_UID)).expect("save");

        let bundle = store.bundle_for_table(TB_UID).expect("bundle");
        assert_eq!(bundle.indexes.len(), 2);
        assert_eq!(bundle.indexes[0].index_name, "a_idx");
        assert_eq!(bundle.indexes[1].index_name, "b_idx");
        assert!(store.bundle_for_table(42).is_none());
    }

    #[test]
    fn test_table_uids_are_distinct() {
        let mut store = RollupStore::new();
        store.save(index("a_idx", TB_UID)).expect("save");
        store.save(index("b_idx", TB_UID)).expect("save");
        assert_eq!(store.table_uids(), [TB_UID]);
    }

    #[test]
    fn test_save_enforces_name_bound() {
        let mut store = RollupStore::new();
        let over = index(&"n".repeat(INDEX_NAME_LEN), TB_UID);
        assert!(matches!(
            store.save(over),
            Err(TempoError::IdentifierTooLong {
                what: "index name",
                ..
            })
        ));
        let under = index(&"n".repeat(INDEX_NAME_LEN - 1), TB_UID);
        store.save(under).expect("save under limit");
    }

    #[test]
    fn test_save_overwrites_same_name() {
        let mut store = RollupStore::new();
        store.save(index("same", TB_UID)).expect("save");
        let mut replacement = index("same", TB_UID);
        replacement.version = 9;
        store.save(replacement).expect("overwrite");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("same").expect("get").version, 9);
    }
}

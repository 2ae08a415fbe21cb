//! Catalog boundary.
//!
//! Resolution passes consume the AST by looking table and column identities
//! up here, keyed by the name strings stored on column/table nodes:
//! `(db, table) → schema` and `(db, table) → vgroup placement`. The [`Catalog`]
//! trait captures that contract; [`MemoryCatalog`] implements it in memory
//! for resolution passes and tests (the persistent catalog service is an
//! external collaborator reached over the wire).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tempoql_error::{Result, TempoError};
use tempoql_types::{ColId, DataType, Precision, TableUid, VgroupId};
use tracing::debug;

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// Kind of a cataloged table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableType {
    Normal,
    /// Super table: schema template plus tag columns for its children.
    Super,
    Child,
}

/// One column (or tag) of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub col_id: ColId,
    pub data_type: DataType,
    /// Storage width; for variable-length types this is the declared width.
    pub bytes: usize,
}

/// Complete metadata of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub uid: TableUid,
    pub table_type: TableType,
    pub precision: Precision,
    pub vgroup_id: VgroupId,
    pub columns: Vec<ColumnSchema>,
    pub tags: Vec<ColumnSchema>,
}

impl TableMeta {
    /// Sum of column widths, the row size a scan materializes.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.columns.iter().map(|c| c.bytes).sum()
    }

    /// Look a column schema up by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One endpoint of a vgroup's replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub fqdn: String,
    pub port: u16,
}

/// Placement of a table: its vgroup and that vgroup's replica endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VgroupInfo {
    pub vgroup_id: VgroupId,
    pub endpoints: Vec<Endpoint>,
    /// Index of the endpoint currently in use.
    pub in_use: usize,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Name-keyed metadata lookups the resolution passes depend on.
pub trait Catalog {
    /// Full metadata of `db`.`table`.
    fn table_meta(&self, db: &str, table: &str) -> Result<TableMeta>;

    /// Placement of `db`.`table`.
    fn table_vgroup(&self, db: &str, table: &str) -> Result<VgroupInfo>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// In-memory [`Catalog`].
#[derive(Debug)]
pub struct MemoryCatalog {
    /// db → table → meta.
    tables: BTreeMap<String, BTreeMap<String, TableMeta>>,
    vgroups: BTreeMap<VgroupId, Vec<Endpoint>>,
    next_uid: TableUid,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            vgroups: BTreeMap::new(),
            next_uid: 1,
        }
    }

    /// Register a vgroup's replica endpoints.
    pub fn add_vgroup(&mut self, vgroup_id: VgroupId, endpoints: Vec<Endpoint>) {
        self.vgroups.insert(vgroup_id, endpoints);
    }

    /// Start building a table in `db`. The table becomes visible at
    /// [`TableBuilder::done`].
    pub fn create_table<'a>(
        &'a mut self,
        db: &str,
        table: &str,
        table_type: TableType,
    ) -> TableBuilder<'a> {
        TableBuilder {
            catalog: self,
            db: db.to_owned(),
            name: table.to_owned(),
            meta: TableMeta {
                uid: 0,
                table_type,
                precision: Precision::default(),
                vgroup_id: 0,
                columns: Vec::new(),
                tags: Vec::new(),
            },
            next_col_id: 1,
        }
    }
}

impl Catalog for MemoryCatalog {
    fn table_meta(&self, db: &str, table: &str) -> Result<TableMeta> {
        let tables = self.tables.get(db).ok_or_else(|| TempoError::DatabaseNotFound {
            db: db.to_owned(),
        })?;
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| TempoError::TableNotFound {
                db: db.to_owned(),
                table: table.to_owned(),
            })
    }

    fn table_vgroup(&self, db: &str, table: &str) -> Result<VgroupInfo> {
        let meta = self.table_meta(db, table)?;
        let endpoints = self
            .vgroups
            .get(&meta.vgroup_id)
            .cloned()
            .unwrap_or_default();
        Ok(VgroupInfo {
            vgroup_id: meta.vgroup_id,
            endpoints,
            in_use: 0,
        })
    }
}

/// Fluent schema builder for one table.
///
/// Column ids are assigned in declaration order starting at 1, so the first
/// added column is the primary timestamp.
#[derive(Debug)]
pub struct TableBuilder<'a> {
    catalog: &'a mut MemoryCatalog,
    db: String,
    name: String,
    meta: TableMeta,
    next_col_id: ColId,
}

impl TableBuilder<'_> {
    /// Add a data column. Fixed-size types ignore `bytes`.
    #[must_use]
    pub fn add_column(mut self, name: &str, data_type: DataType, bytes: usize) -> Self {
        let bytes = data_type.fixed_size().unwrap_or(bytes);
        self.meta.columns.push(ColumnSchema {
            name: name.to_owned(),
            col_id: self.next_col_id,
            data_type,
            bytes,
        });
        self.next_col_id += 1;
        self
    }

    /// Add a tag column. Tags share the column-id sequence.
    #[must_use]
    pub fn add_tag(mut self, name: &str, data_type: DataType, bytes: usize) -> Self {
        let bytes = data_type.fixed_size().unwrap_or(bytes);
        self.meta.tags.push(ColumnSchema {
            name: name.to_owned(),
            col_id: self.next_col_id,
            data_type,
            bytes,
        });
        self.next_col_id += 1;
        self
    }

    /// Place the table in a vgroup.
    #[must_use]
    pub fn vgroup(mut self, vgroup_id: VgroupId) -> Self {
        self.meta.vgroup_id = vgroup_id;
        self
    }

    /// Set the timestamp precision.
    #[must_use]
    pub fn precision(mut self, precision: Precision) -> Self {
        self.meta.precision = precision;
        self
    }

    /// Finish the schema: assign the uid and make the table visible.
    pub fn done(mut self) -> TableUid {
        self.meta.uid = self.catalog.next_uid;
        self.catalog.next_uid += 1;
        debug!("cataloged table {}.{} uid {}", self.db, self.name, self.meta.uid);
        let uid = self.meta.uid;
        self.catalog
            .tables
            .entry(self.db)
            .or_default()
            .insert(self.name, self.meta);
        uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters_catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog.add_vgroup(
            1,
            vec![
                Endpoint {
                    fqdn: "dnode_1".to_owned(),
                    port: 6030,
                },
                Endpoint {
                    fqdn: "dnode_2".to_owned(),
                    port: 6030,
                },
            ],
        );
        let _uid = catalog
            .create_table("power", "meters", TableType::Super)
            .add_column("ts", DataType::Timestamp, 0)
            .add_column("current", DataType::Float, 0)
            .add_column("voltage", DataType::Int, 0)
            .add_column("phase", DataType::Float, 0)
            .add_tag("location", DataType::Binary, 64)
            .add_tag("group_id", DataType::Int, 0)
            .vgroup(1)
            .done();
        catalog
    }

    #[test]
    fn test_table_meta_lookup() {
        let catalog = meters_catalog();
        let meta = catalog.table_meta("power", "meters").expect("meta");
        assert_eq!(meta.table_type, TableType::Super);
        assert_eq!(meta.columns.len(), 4);
        assert_eq!(meta.tags.len(), 2);
        // 8 (ts) + 4 + 4 + 4.
        assert_eq!(meta.row_size(), 20);

        let ts = meta.column("ts").expect("ts");
        assert_eq!(ts.col_id, 1);
        assert_eq!(ts.data_type, DataType::Timestamp);

        let location = &meta.tags[0];
        assert_eq!(location.col_id, 5);
        assert_eq!(location.bytes, 64);
    }

    #[test]
    fn test_vgroup_lookup() {
        let catalog = meters_catalog();
        let vgroup = catalog.table_vgroup("power", "meters").expect("vgroup");
        assert_eq!(vgroup.vgroup_id, 1);
        assert_eq!(vgroup.endpoints.len(), 2);
        assert_eq!(vgroup.endpoints[0].fqdn, "dnode_1");
        assert_eq!(vgroup.in_use, 0);
    }

    #[test]
    fn test_missing_database_and_table() {
        let catalog = meters_catalog();
        assert!(matches!(
            catalog.table_meta("nope", "meters"),
            Err(TempoError::DatabaseNotFound { .. })
        ));
        assert!(matches!(
            catalog.table_meta("power", "nope"),
            Err(TempoError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_uids_are_unique_per_catalog() {
        let mut catalog = meters_catalog();
        let a = catalog
            .create_table("power", "a", TableType::Normal)
            .add_column("ts", DataType::Timestamp, 0)
            .done();
        let b = catalog
            .create_table("power", "b", TableType::Normal)
            .add_column("ts", DataType::Timestamp, 0)
            .done();
        assert_ne!(a, b);
    }
}

//! Document model: named tables of schemaless records.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the reserved identifier field carried by every inserted record.
pub const ID_FIELD: &str = "_id";

/// A single schemaless record.
///
/// Field order is preserved exactly as inserted.
pub type Record = Map<String, Value>;

/// A named, ordered sequence of records.
///
/// Record order is insertion order and is meaningful: "first match"
/// operations walk the table front to back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    name: String,
    records: Vec<Record>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Creates a table with pre-existing records.
    #[must_use]
    pub fn with_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the records in table order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the records for in-place mutation.
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Appends a record at the end of the table.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes every record, keeping the table itself.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Consumes the table, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// The whole persisted state: an ordered mapping of table name to table.
///
/// A document is always read and written as a unit. Table order is the
/// order in which tables were created (or appeared in the file).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    tables: Vec<Table>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if the document has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns `true` if a table with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the named table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the named table for mutation.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// Adds an empty table unless one with this name already exists.
    ///
    /// Returns `true` if the table was created.
    pub fn insert_table(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.tables.push(Table::new(name));
        true
    }

    /// Adds or replaces a table, keeping the position of a replaced table.
    pub fn put_table(&mut self, table: Table) {
        match self.position(table.name()) {
            Some(idx) => self.tables[idx] = table,
            None => self.tables.push(table),
        }
    }

    /// Removes the named table, returning it if it existed.
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.position(name).map(|idx| self.tables.remove(idx))
    }

    /// Iterates over tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Returns the table names in document order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Returns the total number of records across all tables.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == name)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, &table.records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object mapping table names to arrays of records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Document, A::Error> {
        let mut doc = Document::new();
        // A repeated key replaces the earlier table, as JSON.parse would.
        while let Some((name, records)) = access.next_entry::<String, Vec<Record>>()? {
            doc.put_table(Table::with_records(name, records));
        }
        Ok(doc)
    }
}

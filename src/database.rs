use crate::store::Store;
use crate::table::Table;
use ahash::AHashMap;
use log::{debug, warn};

/// A named set of tables, loaded on first request.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub name: String,
    tables: AHashMap<String, Table>,
}

impl Database {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: AHashMap::new(),
        }
    }

    /// Returns the table, loading it from the store the first time.
    pub fn load_table(&mut self, store: &mut dyn Store, table_name: &str) -> &Table {
        self.tables.entry(table_name.to_string()).or_insert_with(|| {
            debug!("loading table {}.{}", self.name, table_name);
            let mut table = Table::new(table_name);
            table.load(store, None);
            table
        })
    }

    /// Reads the table again even if it was loaded before.
    pub fn reload_table(&mut self, store: &mut dyn Store, table_name: &str) -> &Table {
        let mut table = Table::new(table_name);
        table.load(store, None);
        self.tables.insert(table_name.to_string(), table);
        &self.tables[table_name]
    }

    /// Loads every table the store lists that is not loaded yet. Returns the
    /// number of tables held afterwards.
    pub fn load_all_tables(&mut self, store: &mut dyn Store) -> usize {
        match store.list_tables() {
            Ok(names) => {
                for name in names {
                    self.load_table(store, &name);
                }
            }
            Err(e) => warn!("listing tables of {} failed: {}", self.name, e),
        }
        self.tables.len()
    }

    pub fn table(&self, table_name: &str) -> Option<&Table> {
        self.tables.get(table_name)
    }

    pub fn is_loaded(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConnectionSettings, SqliteStore};

    fn store() -> SqliteStore {
        let mut store = SqliteStore::connect(&ConnectionSettings::in_memory()).unwrap();
        store.select_database("journal").unwrap();
        store.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, title TEXT)").unwrap();
        store.execute("CREATE TABLE sections (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
        store.execute("INSERT INTO notes (title) VALUES ('Alpha')").unwrap();
        store
    }

    #[test]
    fn test_load_table_is_idempotent() {
        let mut store = store();
        let mut db = Database::new("journal");
        assert!(!db.is_loaded("notes"));
        assert_eq!(db.load_table(&mut store, "notes").row_count(), 1);

        store.execute("INSERT INTO notes (title) VALUES ('Beta')").unwrap();
        // cached copy is returned
        assert_eq!(db.load_table(&mut store, "notes").row_count(), 1);
        assert_eq!(db.reload_table(&mut store, "notes").row_count(), 2);
    }

    #[test]
    fn test_load_all_tables() {
        let mut store = store();
        let mut db = Database::new("journal");
        assert_eq!(db.load_all_tables(&mut store), 2);
        assert_eq!(db.table_names(), vec!["notes", "sections"]);
        assert!(db.table("sections").unwrap().is_empty());
    }
}

use crate::models::{ReadingTable, Table};

/// Ordered set of tables making up the SQLite schema. Tables are created in
/// the given order and disposed in reverse.
pub struct SchemaManager {
    tables: Vec<Box<dyn Table + Send + Sync>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table + Send + Sync>>) -> Self {
        Self { tables }
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|table| table.name()).collect()
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![Box::new(ReadingTable)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDeviceTable;
    impl Table for MockDeviceTable {
        fn name(&self) -> &'static str {
            "devices"
        }

        fn create(&self) -> String {
            "CREATE TABLE devices;".to_string()
        }

        fn dispose(&self) -> String {
            "DROP TABLE devices;".to_string()
        }
    }

    #[test]
    fn test_dispose_reverses_creation_order() {
        let manager = SchemaManager::new(vec![Box::new(MockDeviceTable), Box::new(ReadingTable)]);

        assert_eq!(manager.table_names(), ["devices", "readings"]);
        assert_eq!(manager.create_schema()[0], "CREATE TABLE devices;");

        let dispose = manager.dispose_schema();
        assert_eq!(dispose[0], "DROP TABLE IF EXISTS readings;");
        assert_eq!(dispose[1], "DROP TABLE devices;");
    }
}

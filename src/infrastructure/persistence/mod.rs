pub mod importer;
pub mod migrations;
pub mod pivot;
pub mod sqlite_store;

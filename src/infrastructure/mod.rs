pub mod import;
pub mod persistence;
pub mod sinks;

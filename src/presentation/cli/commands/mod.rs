pub mod advise;
pub mod clean;
pub mod import;
pub mod query;
pub mod record;
pub mod serve;

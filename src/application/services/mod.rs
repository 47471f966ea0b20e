pub mod advise;
pub mod import;
pub mod topology;

pub mod line;
pub mod pipeline;

pub use line::{parse_line, write_sample};
pub use pipeline::{ImportError, ImportSummary, import_reader};

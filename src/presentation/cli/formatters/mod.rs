pub mod advice_fmt;
pub mod stats_fmt;

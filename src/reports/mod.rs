//! File sinks for monitor output

pub mod alert_log;
pub mod csv_sink;

pub use alert_log::AlertLogSink;
pub use csv_sink::CsvSink;

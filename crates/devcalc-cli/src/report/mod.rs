//! File-based report writer for `devcalc estimate --report-dir`.

pub mod chart;
pub mod file_emitter;

pub use file_emitter::FileReportEmitter;

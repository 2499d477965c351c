//! Stream adapters over decoded packets

pub mod report;

pub use report::{ReportExt, ReportFrames};

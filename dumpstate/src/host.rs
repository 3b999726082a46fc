use crate::dump::RangeDumper;
use anyhow::Result;

/// The inspected-process side of the tool.
///
/// A host hands out the textual memory-map report of the current process
/// and copies address ranges to files. Nothing else about the debugger or
/// OS leaks into the core.
pub trait Host: RangeDumper {
    /// raw "info proc mappings" style report.
    fn mappings_report(&mut self) -> Result<String>;
}

//! Snapshot the address space of an inspected process.
//!
//! The core is split in two: [`mapping::parse`] turns a memory-map report
//! into [`MappingRecord`]s and [`dump::dump`] copies each record's range to
//! its own file. Both are plain functions; the [`Host`] trait is the only
//! seam towards a live process.

pub mod command;
pub mod dump;
pub mod error;
pub mod host;
pub mod mapping;
pub mod registry;

pub use command::DumpState;
pub use dump::{dump, RangeDumper};
pub use error::{Error, Result};
pub use host::Host;
pub use mapping::{parse, MappingRecord};
pub use registry::{CommandTable, HostCommand};

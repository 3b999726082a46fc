use crate::mapping::MappingRecord;
use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Copies the bytes of `[start, end)` out of the inspected process into `path`.
pub trait RangeDumper {
    fn dump_range(&mut self, start: &str, end: &str, path: &Path) -> Result<()>;
}

/// file a record is dumped to: `out_dir/<start>`.
pub fn output_path(out_dir: &Path, record: &MappingRecord) -> PathBuf {
    out_dir.join(record.start())
}

/// Dump every record into `out_dir`, one file per record.
///
/// A failed region is logged and skipped; the remaining regions are still
/// attempted.
pub fn dump<D: RangeDumper + ?Sized>(records: &[MappingRecord], out_dir: &Path, dumper: &mut D) {
    info!("dumping {} regions into {}", records.len(), out_dir.display());

    for record in records {
        let path = output_path(out_dir, record);
        debug!(
            "{}-{} {} {} {} -> {}",
            record.start(),
            record.end(),
            record.size(),
            record.offset(),
            record.objfile(),
            path.display()
        );

        if let Err(e) = dumper.dump_range(record.start(), record.end(), &path) {
            warn!(
                "failed to dump {}-{} ({}): {:#}",
                record.start(),
                record.end(),
                record.objfile(),
                e
            );
        }
    }
}

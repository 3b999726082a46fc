//! The `dumpstate` command.

use crate::dump::dump;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::mapping::parse;
use crate::registry::HostCommand;
use log::info;
use std::path::PathBuf;

pub const NAME: &str = "dumpstate";
pub const USAGE: &str = "dumpstate [optional base_dir]";

/// Save every memory segment of the current process, mapped libraries
/// included, one file per segment named by its start address.
///
/// Only the currently selected context is looked at. Registers are left to
/// the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct DumpState;

impl DumpState {
    /// Resolve and validate the output directory from the raw argument
    /// string. The directory is never created.
    pub fn target_dir(arg: &str) -> Result<PathBuf> {
        let mut args = arg.split_whitespace();
        let dir = match (args.next(), args.next()) {
            (None, _) => PathBuf::from("./"),
            (Some(dir), None) => PathBuf::from(dir),
            (Some(_), Some(_)) => return Err(Error::Usage),
        };

        if !dir.is_dir() {
            return Err(Error::InvalidTargetDirectory(dir));
        }
        Ok(dir)
    }

    /// Run against `host`, returning how many regions were attempted.
    pub fn run<H: Host + ?Sized>(&self, host: &mut H, arg: &str) -> Result<usize> {
        let base_dir = Self::target_dir(arg)?;
        let report = host.mappings_report()?;
        let records = parse(&report);
        dump(&records, &base_dir, host);
        info!("{} regions attempted", records.len());
        Ok(records.len())
    }
}

impl HostCommand for DumpState {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn invoke(&self, host: &mut dyn Host, arg: &str) -> Result<()> {
        self.run(host, arg).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_dir_default() {
        assert_eq!(DumpState::target_dir("").unwrap(), PathBuf::from("./"));
        assert_eq!(DumpState::target_dir("   ").unwrap(), PathBuf::from("./"));
    }

    #[test]
    fn test_target_dir_given() {
        let dir = tempfile::tempdir().unwrap();
        let arg = dir.path().to_str().unwrap();
        assert_eq!(DumpState::target_dir(arg).unwrap(), dir.path());
    }

    #[test]
    fn test_target_dir_too_many() {
        assert!(matches!(DumpState::target_dir("a b"), Err(Error::Usage)));
    }

    #[test]
    fn test_target_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match DumpState::target_dir(missing.to_str().unwrap()) {
            Err(Error::InvalidTargetDirectory(path)) => assert_eq!(path, missing),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!missing.exists());
    }

    #[test]
    fn test_target_dir_is_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            DumpState::target_dir(file.path().to_str().unwrap()),
            Err(Error::InvalidTargetDirectory(_))
        ));
    }
}

use anyhow::{anyhow, bail, Context, Result};
use dumpstate::{Host, RangeDumper};
use log::{debug, info, warn};
use nix::{sys::{ptrace, wait}, unistd::Pid};
use std::fs::{read_to_string, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// bytes copied per read from /proc/<pid>/mem.
const CHUNK: usize = 1 << 20;

/// for /proc/<pid>/maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maps {
    /// start addr of the mapping address block.
    pub start:      u64,

    /// end addr of the mapping address block.
    pub end:        u64,

    /// permissions: `r`, `w`, `x`, `p` (private), `s` (shared).
    pub perms:      String,

    /// offset within the file for file mappings.
    pub offset:     u64,

    /// device id `<major>:<minor>`.
    pub device:     String,

    /// inode for file mappings.
    pub inode:      String,

    /// filesystem path or pseudo path like `[heap]`, may contain spaces.
    pub pathname:   Option<String>,
}

impl Maps {
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// parse the contents of /proc/<pid>/maps, skipping rows that don't parse.
pub fn parse_maps(raw: &str) -> Vec<Maps> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_maps_line(line) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!("skipping maps row {:?}: {}", line, e);
                None
            }
        })
        .collect()
}

fn parse_maps_line(line: &str) -> Result<Maps> {
    let (addr_block, rest) = next_field(line).ok_or_else(|| anyhow!("empty row"))?;
    let (perms, rest) = next_field(rest).ok_or_else(|| anyhow!("missing perms"))?;
    let (offset, rest) = next_field(rest).ok_or_else(|| anyhow!("missing offset"))?;
    let (device, rest) = next_field(rest).ok_or_else(|| anyhow!("missing device"))?;
    let (inode, rest) = next_field(rest).ok_or_else(|| anyhow!("missing inode"))?;

    let (start, end) = addr_block
        .split_once('-')
        .ok_or_else(|| anyhow!("bad address block {}", addr_block))?;

    let pathname = rest.trim();

    Ok(Maps {
        start:      u64::from_str_radix(start, 16).context("failed to parse start addr")?,
        end:        u64::from_str_radix(end, 16).context("failed to parse end addr")?,
        perms:      perms.to_string(),
        offset:     u64::from_str_radix(offset, 16).context("failed to parse offset")?,
        device:     device.to_string(),
        inode:      inode.to_string(),
        pathname:   (!pathname.is_empty()).then(|| pathname.to_string()),
    })
}

fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_at(s.find(char::is_whitespace).unwrap_or(s.len())))
}

/// Render mappings as a debugger "info proc mappings" listing.
pub fn render_report(pid: Pid, mapping: &[Maps]) -> String {
    let mut out = format!(
        "process {}\nMapped address spaces:\n\n{:>18} {:>18} {:>10} {:>10} {}\n",
        pid, "Start Addr", "End Addr", "Size", "Offset", "objfile"
    );

    for map in mapping {
        out.push_str(&format!(
            "{:>18} {:>18} {:>10} {:>10} {}\n",
            format!("{:#x}", map.start),
            format!("{:#x}", map.end),
            format!("{:#x}", map.size()),
            format!("{:#x}", map.offset),
            map.pathname.as_deref().unwrap_or("")
        ));
    }

    out
}

/// hex address with or without a `0x` prefix.
pub fn parse_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid address '{}': {}", s, e))
}

/// live process read through ptrace and /proc/<pid>/mem
pub struct Process {
    /// pid of target process
    pid:        Pid,

    /// whether we hold a ptrace attach on `pid`
    attached:   bool,
}

impl Process {
    pub fn new(pid: i32) -> Self {
        Self {
            pid: Pid::from_raw(pid),
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// attach with ptrace and wait for the process to stop.
    pub fn attach(&mut self) -> Result<()> {
        ptrace::attach(self.pid).with_context(|| format!("ptrace::attach({})", self.pid))?;
        self.attached = true;

        match wait::waitpid(self.pid, None) {
            Ok(wait::WaitStatus::Stopped(_, _)) => {
                info!("ptrace::attach({})", self.pid);
                Ok(())
            }
            Ok(status) => bail!("unexpected wait status after attach: {:?}", status),
            Err(e) => bail!("waitpid({}): {}", self.pid, e),
        }
    }

    pub fn detach(&mut self) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        ptrace::detach(self.pid, None).with_context(|| format!("ptrace::detach({})", self.pid))?;
        info!("ptrace::detach({})", self.pid);
        Ok(())
    }

    /// read /proc/<pid>/maps
    pub fn load_mapping(&self) -> Result<Vec<Maps>> {
        let raw = read_to_string(format!("/proc/{}/maps", self.pid))
            .with_context(|| format!("failed to read mapping of {}", self.pid))?;
        let mapping = parse_maps(&raw);

        for map in &mapping {
            debug!(
                "{:x}-{:x} {} {:x} {} {} {}",
                map.start, map.end,
                map.perms,
                map.offset,
                map.device,
                map.inode,
                map.pathname.as_deref().unwrap_or("")
            );
        }

        Ok(mapping)
    }

    /// copy `[start, end)` of the process memory into `out`.
    pub fn read_range<W: Write>(&self, start: u64, end: u64, out: &mut W) -> Result<u64> {
        if end < start {
            bail!("inverted range {:#x}-{:#x}", start, end);
        }

        // go to start of addr block
        let mut mem_file = File::open(format!("/proc/{}/mem", self.pid))
            .with_context(|| format!("failed to open memory of {}", self.pid))?;
        mem_file.seek(SeekFrom::Start(start))?;

        let mut buf = vec![0u8; CHUNK.min((end - start) as usize)];
        let mut addr = start;
        while addr < end {
            let len = buf.len().min((end - addr) as usize);
            mem_file
                .read_exact(&mut buf[..len])
                .with_context(|| format!("Failed to read memory at {:#x} (+{:#x})", addr, addr - start))?;
            out.write_all(&buf[..len])?;
            addr += len as u64;
        }

        Ok(end - start)
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if let Err(e) = self.detach() {
            warn!("{:#}", e);
        }
    }
}

impl RangeDumper for Process {
    fn dump_range(&mut self, start: &str, end: &str, path: &Path) -> Result<()> {
        let (start, end) = (parse_address(start)?, parse_address(end)?);
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let written = self.read_range(start, end, &mut out)?;
        out.flush()?;
        debug!("wrote {:#x} bytes to {}", written, path.display());
        Ok(())
    }
}

impl Host for Process {
    /// First contact with the process, so this is where it gets stopped.
    fn mappings_report(&mut self) -> Result<String> {
        if !self.attached {
            self.attach()?;
        }
        let mapping = self.load_mapping()?;
        Ok(render_report(self.pid, &mapping))
    }
}

//! Parser for the debugger-style memory-map report.
//!
//! The report looks like this:
//!
//! ```text
//! process 4242
//! Mapped address spaces:
//!
//!           Start Addr           End Addr       Size     Offset objfile
//!             0x400000           0x401000     0x1000        0x0 /usr/bin/cat
//!       0x7ffd3a1e8000     0x7ffd3a209000    0x21000        0x0 [stack]
//! ```
//!
//! Everything up to and including the header line is ignored. Every row
//! after it must start with four hex-looking fields; the rest of the row is
//! the object file.

use log::trace;

/// Column labels of the header line, split into whitespace tokens.
const HEADER: [&str; 7] = ["Start", "Addr", "End", "Addr", "Size", "Offset", "objfile"];

/// One contiguous mapping of the inspected process.
///
/// Fields are kept exactly as the report spelled them, `0x` prefix and hex
/// case included, because `start` doubles as the output file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    start: String,
    end: String,
    size: String,
    offset: String,
    objfile: String,
}

impl MappingRecord {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        size: impl Into<String>,
        offset: impl Into<String>,
        objfile: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            size: size.into(),
            offset: offset.into(),
            objfile: objfile.into(),
        }
    }

    /// start addr of the mapping.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// end addr of the mapping (exclusive).
    pub fn end(&self) -> &str {
        &self.end
    }

    /// size as reported, never checked against `end - start`.
    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn offset(&self) -> &str {
        &self.offset
    }

    /// backing object: a path, a label like `[heap]`, or empty.
    pub fn objfile(&self) -> &str {
        &self.objfile
    }
}

/// Parse a memory-map report into records, in report order.
///
/// A report without the header yields no records.
pub fn parse(report: &str) -> Vec<MappingRecord> {
    let Some(rows) = find_header(report) else {
        trace!("no mapping header in report");
        return Vec::new();
    };

    rows.lines()
        .filter_map(|line| {
            let record = parse_line(line);
            if record.is_none() {
                trace!("skipping row {:?}", line);
            }
            record
        })
        .collect()
}

/// Return the part of `report` following the header line.
pub fn find_header(report: &str) -> Option<&str> {
    let mut rest = report;
    while !rest.is_empty() {
        let (line, tail) = match rest.split_once('\n') {
            Some((line, tail)) => (line, tail),
            None => (rest, ""),
        };
        if is_header(line) {
            return Some(tail);
        }
        rest = tail;
    }
    None
}

fn is_header(line: &str) -> bool {
    line.split_whitespace().eq(HEADER.iter().copied())
}

/// Parse one data row. Returns `None` unless the row starts with four
/// hex-looking fields.
pub fn parse_line(line: &str) -> Option<MappingRecord> {
    let mut rest = line;
    let mut fields: [&str; 4] = [""; 4];

    for field in fields.iter_mut() {
        let (token, tail) = next_token(rest)?;
        if !is_hex_field(token) {
            return None;
        }
        *field = token;
        rest = tail;
    }

    let objfile = rest.trim_start();
    let objfile = objfile.strip_suffix('\r').unwrap_or(objfile);

    let [start, end, size, offset] = fields;
    Some(MappingRecord::new(start, end, size, offset, objfile))
}

/// Split off the first whitespace-delimited token.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(idx) => Some((&s[..idx], &s[idx..])),
        None => Some((s, "")),
    }
}

/// Hex digits with an optional `0x`/`0X` prefix, so `0x1000` and `1000` both pass.
pub fn is_hex_field(token: &str) -> bool {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "process 4242
Mapped address spaces:

          Start Addr           End Addr       Size     Offset objfile
            0x400000           0x401000     0x1000        0x0 /usr/bin/cat
            0x600000           0x601000     0x1000        0x0 /usr/bin/cat
      0x7ffd3a1e8000     0x7ffd3a209000    0x21000        0x0 [stack]
";

    #[test]
    fn test_parse_report() {
        let records = parse(REPORT);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            MappingRecord::new("0x400000", "0x401000", "0x1000", "0x0", "/usr/bin/cat")
        );
        assert_eq!(records[1].start(), "0x600000");
        assert_eq!(records[2].objfile(), "[stack]");
        assert_eq!(records[2].size(), "0x21000");
    }

    #[test]
    fn test_parse_without_header() {
        assert!(parse("").is_empty());
        assert!(parse("0x1000 0x2000 0x1000 0x0 [heap]\n").is_empty());
        assert!(parse("Start Addr End Addr Size Offset Perms objfile\n0x1000 0x2000 0x1000 0x0 rw-p [heap]\n").is_empty());
    }

    #[test]
    fn test_header_with_odd_spacing() {
        let report = "Start Addr\tEnd Addr  Size Offset   objfile  \r\n0x1 0x2 0x1 0x0 a\r\n";
        let records = parse(report);
        assert_eq!(records, vec![MappingRecord::new("0x1", "0x2", "0x1", "0x0", "a")]);
    }

    #[test]
    fn test_header_on_last_line() {
        assert!(parse("Start Addr End Addr Size Offset objfile").is_empty());
    }

    #[test]
    fn test_skips_malformed_rows() {
        let report = "Start Addr End Addr Size Offset objfile
0x1000 0x2000 0x1000 0x0 /lib/a.so
0x2000 0x3000 zz 0x0 /lib/b.so
0x3000 0x4000

(gdb) whatever
0x4000 0x5000 0x1000 0x0
";
        let records = parse(report);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].start(), "0x1000");
        assert_eq!(records[1].start(), "0x4000");
        assert_eq!(records[1].objfile(), "");
    }

    #[test]
    fn test_objfile_keeps_spaces() {
        let record = parse_line("  0x1000 0x2000 0x1000 0x0   [heap] extra").unwrap();
        assert_eq!(record.objfile(), "[heap] extra");

        let record = parse_line("0x1000 0x2000 0x1000 0x0 /tmp/trailing \r").unwrap();
        assert_eq!(record.objfile(), "/tmp/trailing ");

        let record = parse_line("0x1000 0x2000 0x1000 0x0 /home/me/My Programs/a.out").unwrap();
        assert_eq!(record.objfile(), "/home/me/My Programs/a.out");
    }

    #[test]
    fn test_keeps_hex_spelling() {
        let record = parse_line("7FFD0000 7ffd1000 1000 0 x").unwrap();
        assert_eq!(record.start(), "7FFD0000");
        assert_eq!(record.end(), "7ffd1000");
        assert_eq!(record.offset(), "0");
    }

    #[test]
    fn test_parse_line_short() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("x 0x2000 0x1000 0x0 [vdso]"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("0x1000 0x2000 0x1000"), None);
    }

    #[test]
    fn test_is_hex_field() {
        assert!(is_hex_field("0x7fffABCD"));
        assert!(is_hex_field("0X10"));
        assert!(is_hex_field("0"));
        assert!(!is_hex_field(""));
        assert!(!is_hex_field("0x"));
        assert!(!is_hex_field("x"));
        assert!(!is_hex_field("xx"));
        assert!(!is_hex_field("12x4"));
        assert!(!is_hex_field("0x0x10"));
        assert!(!is_hex_field("0x10g0"));
        assert!(!is_hex_field("[heap]"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse(REPORT), parse(REPORT));
    }
}

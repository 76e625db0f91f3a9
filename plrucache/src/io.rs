use std::fs::File;
use std::path::Path;
use log::debug;
use crate::error::{CacheError, Result};

/// Parses a trace file in place
#[cfg(unix)]
fn parse_trace_file(file: File) -> Result<Vec<usize>> {
    use memmap2::{Advice, Mmap};
    // Mapping an empty file fails on some platforms
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // Traces are read front to back exactly once
    let m = unsafe { Mmap::map(&file)? };
    m.advise(Advice::Sequential)?;
    // Only copies if the mapping holds invalid UTF-8
    parse_trace(&String::from_utf8_lossy(&m))
}

/// Compatibility on other systems
#[cfg(not(unix))]
fn parse_trace_file(file: File) -> Result<Vec<usize>> {
    use std::io::{BufReader, Read};
    let mut buf = Vec::new();
    BufReader::new(file).read_to_end(&mut buf)?;
    parse_trace(&String::from_utf8_lossy(&buf))
}

/// Parses a trace: one hexadecimal address per line, with an optional `0x` prefix
///
/// Blank lines and lines starting with `#` are skipped. Line numbers in errors are 1-based
pub fn parse_trace(text: &str) -> Result<Vec<usize>> {
    let mut addresses = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let digits = line
            .strip_prefix("0x")
            .or_else(|| line.strip_prefix("0X"))
            .unwrap_or(line);
        let address = usize::from_str_radix(digits, 16).map_err(|_| CacheError::TraceParse {
            line: number + 1,
            content: line.to_string(),
        })?;
        addresses.push(address);
    }
    Ok(addresses)
}

/// Loads every address of a trace file
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let addresses = parse_trace_file(File::open(path)?)?;
    debug!("Loaded {} addresses from trace {}", addresses.len(), path.display());
    Ok(addresses)
}

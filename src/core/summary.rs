use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    Program,
    Dynamic,
}

/// Memory report printed at the end of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUsage {
    pub region: MemoryRegion,
    pub used_bytes: u64,
    pub percent: Option<u8>,
    pub maximum_bytes: Option<u64>,
}

static RE_PROGRAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"Sketch uses\s+(\d+)\s+bytes\s+(?:\((\d+)%\)\s+)?of program storage space",
        r"(?:.*?Maximum is\s+(\d+)\s+bytes)?",
    ))
    .unwrap()
});
static RE_DYNAMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"Global variables use\s+(\d+)\s+bytes\s+(?:\((\d+)%\)\s+)?of dynamic memory",
        r"(?:.*?Maximum is\s+(\d+)\s+bytes)?",
    ))
    .unwrap()
});

pub fn parse_usage_line(line: &str) -> Option<MemoryUsage> {
    let (region, cap) = if let Some(cap) = RE_PROGRAM.captures(line) {
        (MemoryRegion::Program, cap)
    } else {
        (MemoryRegion::Dynamic, RE_DYNAMIC.captures(line)?)
    };

    let used_bytes = cap.get(1)?.as_str().parse::<u64>().ok()?;
    let percent = cap.get(2).and_then(|m| m.as_str().parse::<u8>().ok());
    let maximum_bytes = cap.get(3).and_then(|m| m.as_str().parse::<u64>().ok());

    Some(MemoryUsage {
        region,
        used_bytes,
        percent,
        maximum_bytes,
    })
}

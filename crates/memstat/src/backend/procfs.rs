use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use memstat_stubs::{SwapMemoryStat, VirtualMemoryStat};

use crate::config::SamplerConfig;
use crate::error::PlatformQueryError;

use super::PlatformQueryBackend;

/// vmstat counters read for swap statistics.
const VMSTAT_KEYS: [&str; 5] =
  ["pswpin", "pswpout", "pgpgin", "pgpgout", "pgfault"];

/// Linux backend reading `meminfo` and `vmstat` under a proc root.
#[derive(Debug, Clone)]
pub struct ProcfsBackend {
  root: PathBuf,
  page_size: u64,
}

impl ProcfsBackend {
  pub fn new<P: Into<PathBuf>>(root: P, page_size: u64) -> Self {
    Self {
      root: root.into(),
      page_size,
    }
  }

  pub fn from_config(config: &SamplerConfig) -> Self {
    Self::new(config.proc_root.clone(), config.page_size)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn read(&self, name: &str) -> Result<(PathBuf, String), PlatformQueryError> {
    let path = self.root.join(name);
    log::debug!("Reading {}", path.display());
    match fs::read_to_string(&path) {
      Ok(content) => Ok((path, content)),
      Err(source) => Err(PlatformQueryError::Io { path, source }),
    }
  }
}

impl PlatformQueryBackend for ProcfsBackend {
  fn name(&self) -> &'static str {
    "procfs"
  }

  fn virtual_memory(&self) -> Result<VirtualMemoryStat, PlatformQueryError> {
    let (path, content) = self.read("meminfo")?;
    let table = MemInfo::parse(&path, &content)?;
    table.virtual_memory()
  }

  fn swap_memory(&self) -> Result<SwapMemoryStat, PlatformQueryError> {
    let (path, content) = self.read("meminfo")?;
    let table = MemInfo::parse(&path, &content)?;
    let (path, content) = self.read("vmstat")?;
    let counters = parse_vmstat(&path, &content)?;
    table.swap_memory(&counters, self.page_size)
  }
}

/// A parsed `meminfo` table, values in bytes except unit-less counts.
struct MemInfo<'a> {
  path: &'a Path,
  values: HashMap<&'a str, u64>,
}

impl<'a> MemInfo<'a> {
  fn parse(
    path: &'a Path,
    content: &'a str,
  ) -> Result<Self, PlatformQueryError> {
    let mut values = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
      let Some((key, rest)) = line.split_once(':') else {
        continue;
      };
      let malformed = |reason: String| PlatformQueryError::Malformed {
        path: path.to_owned(),
        line: idx + 1,
        reason,
      };
      let key = key.trim();
      let mut parts = rest.split_whitespace();
      let raw = parts
        .next()
        .ok_or_else(|| malformed(format!("missing value for {key}")))?;
      let val = raw.parse::<u64>().map_err(|err| {
        malformed(format!("invalid value {raw:?} for {key}: {err}"))
      })?;
      let val = match parts.next() {
        None => val,
        Some("kB") => val
          .checked_mul(1024)
          .ok_or_else(|| malformed(format!("{key} overflows")))?,
        Some(unit) => {
          return Err(malformed(format!("unknown unit {unit:?} for {key}")))
        }
      };
      values.insert(key, val);
    }
    Ok(Self { path, values })
  }

  fn get(&self, key: &str) -> u64 {
    self.values.get(key).copied().unwrap_or(0)
  }

  fn require(&self, key: &'static str) -> Result<u64, PlatformQueryError> {
    self
      .values
      .get(key)
      .copied()
      .ok_or_else(|| PlatformQueryError::MissingField {
        path: self.path.to_owned(),
        field: key,
      })
  }

  fn virtual_memory(&self) -> Result<VirtualMemoryStat, PlatformQueryError> {
    let total = self.require("MemTotal")?;
    let free = self.require("MemFree")?;
    let buffers = self.get("Buffers");
    let sreclaimable = self.get("SReclaimable");
    // reclaimable slab counts as cache
    let cached = self.get("Cached").saturating_add(sreclaimable);
    // MemAvailable only exists since linux 3.14
    let available = match self.values.get("MemAvailable") {
      Some(available) => *available,
      None => free.saturating_add(buffers).saturating_add(cached).min(total),
    };
    let used = total
      .saturating_sub(free)
      .saturating_sub(buffers)
      .saturating_sub(cached);
    let stat = VirtualMemoryStat {
      total,
      available,
      used,
      free,
      active: self.get("Active"),
      inactive: self.get("Inactive"),
      buffers,
      cached,
      writeback: self.get("Writeback"),
      dirty: self.get("Dirty"),
      writeback_tmp: self.get("WritebackTmp"),
      shared: self.get("Shmem"),
      slab: self.get("Slab"),
      sreclaimable,
      page_tables: self.get("PageTables"),
      swap_cached: self.get("SwapCached"),
      commit_limit: self.get("CommitLimit"),
      committed_as: self.get("Committed_AS"),
      high_total: self.get("HighTotal"),
      high_free: self.get("HighFree"),
      low_total: self.get("LowTotal"),
      low_free: self.get("LowFree"),
      swap_total: self.get("SwapTotal"),
      swap_free: self.get("SwapFree"),
      mapped: self.get("Mapped"),
      vmalloc_total: self.get("VmallocTotal"),
      vmalloc_used: self.get("VmallocUsed"),
      vmalloc_chunk: self.get("VmallocChunk"),
      huge_pages_total: self.get("HugePages_Total"),
      huge_pages_free: self.get("HugePages_Free"),
      huge_page_size: self.get("Hugepagesize"),
      ..Default::default()
    };
    Ok(stat.with_used_percent())
  }

  fn swap_memory(
    &self,
    counters: &HashMap<&str, u64>,
    page_size: u64,
  ) -> Result<SwapMemoryStat, PlatformQueryError> {
    let total = self.require("SwapTotal")?;
    let free = self.require("SwapFree")?;
    let counter = |key: &str| counters.get(key).copied().unwrap_or(0);
    let stat = SwapMemoryStat {
      total,
      used: total.saturating_sub(free),
      free,
      sin: counter("pswpin").saturating_mul(page_size),
      sout: counter("pswpout").saturating_mul(page_size),
      pg_in: counter("pgpgin"),
      pg_out: counter("pgpgout"),
      pg_fault: counter("pgfault"),
      ..Default::default()
    };
    Ok(stat.with_used_percent())
  }
}

/// Extract the swap related counters of a `vmstat` table.
///
/// Lines for other counters are not validated.
fn parse_vmstat<'a>(
  path: &Path,
  content: &'a str,
) -> Result<HashMap<&'a str, u64>, PlatformQueryError> {
  let mut counters = HashMap::new();
  for (idx, line) in content.lines().enumerate() {
    let mut parts = line.split_whitespace();
    let (Some(key), raw) = (parts.next(), parts.next()) else {
      continue;
    };
    if !VMSTAT_KEYS.contains(&key) {
      continue;
    }
    let val = raw
      .ok_or_else(|| format!("missing value for {key}"))
      .and_then(|raw| {
        raw
          .parse::<u64>()
          .map_err(|err| format!("invalid value {raw:?} for {key}: {err}"))
      })
      .map_err(|reason| PlatformQueryError::Malformed {
        path: path.to_owned(),
        line: idx + 1,
        reason,
      })?;
    counters.insert(key, val);
  }
  Ok(counters)
}

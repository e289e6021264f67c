use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;
use crate::field::{self, Field, Fields, Snapshot};

/// Memory usage statistics of the host.
///
/// `total`, `available` and `used` are byte amounts meant for human
/// consumption. Every other field is a kernel specific value and stays at
/// zero on platforms that do not expose it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VirtualMemoryStat {
  /// Total amount of RAM.
  pub total: u64,
  /// RAM available for programs to allocate.
  pub available: u64,
  /// RAM used by programs.
  pub used: u64,
  /// Percentage of RAM used, always `used / total * 100`.
  pub used_percent: f64,
  /// The kernel's notion of free memory. `available` is usually the
  /// number you want.
  pub free: u64,
  // BSD and macOS
  pub active: u64,
  pub inactive: u64,
  pub wired: u64,
  // FreeBSD
  pub laundry: u64,
  // Linux
  pub buffers: u64,
  pub cached: u64,
  pub writeback: u64,
  pub dirty: u64,
  pub writeback_tmp: u64,
  pub shared: u64,
  pub slab: u64,
  pub sreclaimable: u64,
  pub page_tables: u64,
  pub swap_cached: u64,
  pub commit_limit: u64,
  pub committed_as: u64,
  pub high_total: u64,
  pub high_free: u64,
  pub low_total: u64,
  pub low_free: u64,
  pub swap_total: u64,
  pub swap_free: u64,
  pub mapped: u64,
  pub vmalloc_total: u64,
  pub vmalloc_used: u64,
  pub vmalloc_chunk: u64,
  /// Number of huge pages, not bytes.
  pub huge_pages_total: u64,
  /// Number of free huge pages, not bytes.
  pub huge_pages_free: u64,
  pub huge_page_size: u64,
}

macro_rules! count {
  ($key:literal, $name:ident) => {
    Field::count(
      $key,
      |stat: &VirtualMemoryStat| stat.$name,
      |stat: &mut VirtualMemoryStat, val: u64| stat.$name = val,
    )
  };
}

static FIELDS: &[Field<VirtualMemoryStat>] = &[
  count!("total", total),
  count!("available", available),
  count!("used", used),
  Field::percent(
    "usedPercent",
    |stat: &VirtualMemoryStat| stat.used_percent,
    |stat: &mut VirtualMemoryStat, val: f64| stat.used_percent = val,
  ),
  count!("free", free),
  count!("active", active),
  count!("inactive", inactive),
  count!("wired", wired),
  count!("laundry", laundry),
  count!("buffers", buffers),
  count!("cached", cached),
  count!("writeback", writeback),
  count!("dirty", dirty),
  count!("writebacktmp", writeback_tmp),
  count!("shared", shared),
  count!("slab", slab),
  count!("sreclaimable", sreclaimable),
  count!("pagetables", page_tables),
  count!("swapcached", swap_cached),
  count!("commitlimit", commit_limit),
  count!("committedas", committed_as),
  count!("hightotal", high_total),
  count!("highfree", high_free),
  count!("lowtotal", low_total),
  count!("lowfree", low_free),
  count!("swaptotal", swap_total),
  count!("swapfree", swap_free),
  count!("mapped", mapped),
  count!("vmalloctotal", vmalloc_total),
  count!("vmallocused", vmalloc_used),
  count!("vmallocchunk", vmalloc_chunk),
  count!("hugepagestotal", huge_pages_total),
  count!("hugepagesfree", huge_pages_free),
  count!("hugepagesize", huge_page_size),
];

impl Snapshot for VirtualMemoryStat {
  fn fields() -> &'static [Field<Self>] {
    FIELDS
  }
}

impl VirtualMemoryStat {
  /// Render the snapshot as a single line key/value object.
  pub fn render(&self) -> String {
    self.to_string()
  }

  /// Recompute `used_percent` from `used` and `total`.
  pub fn with_used_percent(mut self) -> Self {
    self.used_percent = crate::used_percent(self.used, self.total);
    self
  }
}

impl fmt::Display for VirtualMemoryStat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    field::write_fields(self, f)
  }
}

impl FromStr for VirtualMemoryStat {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    field::parse(s)
  }
}

impl Serialize for VirtualMemoryStat {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    Fields(self).serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for VirtualMemoryStat {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let map = Deserialize::deserialize(deserializer)?;
    field::from_map(map).map_err(serde::de::Error::custom)
  }
}

#[cfg(feature = "sysinfo")]
impl From<&sysinfo::System> for VirtualMemoryStat {
  fn from(sys: &sysinfo::System) -> Self {
    Self {
      total: sys.total_memory(),
      available: sys.available_memory(),
      used: sys.used_memory(),
      free: sys.free_memory(),
      swap_total: sys.total_swap(),
      swap_free: sys.free_swap(),
      ..Default::default()
    }
    .with_used_percent()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sixteen_gigs() -> VirtualMemoryStat {
    VirtualMemoryStat {
      total: 16_000_000_000,
      available: 8_000_000_000,
      used: 8_000_000_000,
      free: 4_000_000_000,
      ..Default::default()
    }
    .with_used_percent()
  }

  #[test]
  fn test_render_every_field() {
    let text = sixteen_gigs().render();
    assert!(text.contains("\"total\":16000000000"));
    assert!(text.contains("\"used\":8000000000"));
    assert!(text.contains("\"usedPercent\":50,"));
    for field in VirtualMemoryStat::fields() {
      let key = format!("\"{}\":", field.key());
      assert!(text.contains(&key), "missing {key} in {text}");
    }
    for key in ["hugepagestotal", "hugepagesfree", "hugepagesize", "wired"] {
      assert!(text.contains(&format!("\"{key}\":0")));
    }
  }

  #[test]
  fn test_render_order() {
    let text = VirtualMemoryStat::default().render();
    assert!(text.starts_with(
      "{\"total\":0,\"available\":0,\"used\":0,\"usedPercent\":0,\"free\":0,"
    ));
    assert!(text.ends_with("\"hugepagesfree\":0,\"hugepagesize\":0}"));
    assert_eq!(VirtualMemoryStat::fields().len(), 34);
  }

  #[test]
  fn test_render_deterministic() {
    let stat = VirtualMemoryStat {
      cached: 1_234_567,
      committed_as: 42,
      ..sixteen_gigs()
    };
    assert_eq!(stat.render(), stat.render());
    assert_eq!(stat.render(), serde_json::to_string(&stat).unwrap());
  }

  #[test]
  fn test_parse_rendered() {
    let stat = VirtualMemoryStat {
      used: 5_333_333_333,
      buffers: 1024,
      huge_pages_total: 16,
      huge_page_size: 2_097_152,
      ..sixteen_gigs()
    }
    .with_used_percent();
    let parsed: VirtualMemoryStat = stat.render().parse().unwrap();
    assert_eq!(parsed, stat);
    let de: VirtualMemoryStat =
      serde_json::from_str(&serde_json::to_string(&stat).unwrap()).unwrap();
    assert_eq!(de, stat);
  }

  #[test]
  fn test_parse_missing_key() {
    let text = sixteen_gigs().render().replace("\"laundry\":0,", "");
    let err = text.parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::MissingKey("laundry")));
  }

  #[test]
  fn test_parse_duplicate_key() {
    let text = sixteen_gigs().render().replace('}', ",\"total\":1}");
    let err = text.parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::Json(_)), "{err}");
    assert!(err.to_string().contains("Duplicate key: total"));
  }

  #[test]
  fn test_parse_unknown_key() {
    let text = sixteen_gigs().render().replace('}', ",\"compressed\":0}");
    let err = text.parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::UnknownKey(key) if key == "compressed"));
  }

  #[test]
  fn test_parse_invalid_value() {
    let text = sixteen_gigs()
      .render()
      .replace("\"dirty\":0", "\"dirty\":-1");
    let err = text.parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { key: "dirty", .. }));
    let text = sixteen_gigs()
      .render()
      .replace("\"slab\":0", "\"slab\":1.5");
    let err = text.parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::InvalidValue { key: "slab", .. }));
    let err = "{\"total\":\"12\"}".parse::<VirtualMemoryStat>().unwrap_err();
    assert!(matches!(err, ParseError::Json(_)));
  }

  #[test]
  fn test_used_percent_zero_total() {
    let stat = VirtualMemoryStat {
      used: 10,
      ..Default::default()
    }
    .with_used_percent();
    assert_eq!(stat.used_percent, 0.0);
  }

  #[cfg(feature = "sysinfo")]
  #[test]
  fn test_from_sysinfo() {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let stat = VirtualMemoryStat::from(&sys);
    assert_eq!(stat.total, sys.total_memory());
    assert_eq!(stat.huge_pages_total, 0);
    assert!(stat.used_percent >= 0.0 && stat.used_percent <= 100.0);
  }
}

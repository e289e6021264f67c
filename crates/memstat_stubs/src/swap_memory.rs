use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;
use crate::field::{self, Field, Fields, Snapshot};

/// Swap usage statistics of the host.
///
/// `sin`, `sout` and the paging counters are cumulative since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwapMemoryStat {
  pub total: u64,
  pub used: u64,
  pub free: u64,
  /// Percentage of swap used, always `used / total * 100`.
  pub used_percent: f64,
  /// Bytes swapped in from disk.
  pub sin: u64,
  /// Bytes swapped out to disk.
  pub sout: u64,
  pub pg_in: u64,
  pub pg_out: u64,
  pub pg_fault: u64,
}

macro_rules! count {
  ($key:literal, $name:ident) => {
    Field::count(
      $key,
      |stat: &SwapMemoryStat| stat.$name,
      |stat: &mut SwapMemoryStat, val: u64| stat.$name = val,
    )
  };
}

static FIELDS: &[Field<SwapMemoryStat>] = &[
  count!("total", total),
  count!("used", used),
  count!("free", free),
  Field::percent(
    "usedPercent",
    |stat: &SwapMemoryStat| stat.used_percent,
    |stat: &mut SwapMemoryStat, val: f64| stat.used_percent = val,
  ),
  count!("sin", sin),
  count!("sout", sout),
  count!("pgin", pg_in),
  count!("pgout", pg_out),
  count!("pgfault", pg_fault),
];

impl Snapshot for SwapMemoryStat {
  fn fields() -> &'static [Field<Self>] {
    FIELDS
  }
}

impl SwapMemoryStat {
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

impl fmt::Display for SwapMemoryStat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    field::write_fields(self, f)
  }
}

impl FromStr for SwapMemoryStat {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    field::parse(s)
  }
}

impl Serialize for SwapMemoryStat {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    Fields(self).serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for SwapMemoryStat {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let map = Deserialize::deserialize(deserializer)?;
    field::from_map(map).map_err(serde::de::Error::custom)
  }
}

#[cfg(feature = "sysinfo")]
impl From<&sysinfo::System> for SwapMemoryStat {
  fn from(sys: &sysinfo::System) -> Self {
    Self {
      total: sys.total_swap(),
      used: sys.used_swap(),
      free: sys.free_swap(),
      ..Default::default()
    }
    .with_used_percent()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_render() {
    let stat = SwapMemoryStat {
      total: 2_147_483_648,
      used: 536_870_912,
      free: 1_610_612_736,
      sin: 4096,
      pg_fault: 981_273,
      ..Default::default()
    }
    .with_used_percent();
    assert_eq!(
      stat.render(),
      "{\"total\":2147483648,\"used\":536870912,\"free\":1610612736,\
       \"usedPercent\":25,\"sin\":4096,\"sout\":0,\"pgin\":0,\"pgout\":0,\
       \"pgfault\":981273}"
    );
    assert_eq!(stat.render().parse::<SwapMemoryStat>().unwrap(), stat);
  }

  #[test]
  fn test_no_swap() {
    let stat = SwapMemoryStat::default().with_used_percent();
    assert_eq!(stat.used_percent, 0.0);
    assert!(stat.render().contains("\"usedPercent\":0,"));
  }

  #[test]
  fn test_fractional_percent() {
    let stat = SwapMemoryStat {
      total: 3,
      used: 1,
      free: 2,
      ..Default::default()
    }
    .with_used_percent();
    let text = stat.render();
    assert!(text.contains("\"usedPercent\":33.33333333333333"));
    assert_eq!(text.parse::<SwapMemoryStat>().unwrap(), stat);
  }

  #[test]
  fn test_parse_every_ratio() {
    let stat = SwapMemoryStat {
      total: 13,
      used: 2,
      free: 11,
      ..Default::default()
    }
    .with_used_percent();
    assert!(stat.render().contains("\"usedPercent\":15.384615384615385,"));
    for total in 1..=300u64 {
      for used in 0..=total {
        let stat = SwapMemoryStat {
          total,
          used,
          free: total - used,
          ..Default::default()
        }
        .with_used_percent();
        let parsed = stat.render().parse::<SwapMemoryStat>().unwrap();
        assert_eq!(parsed, stat, "{used}/{total}");
      }
    }
  }

  #[test]
  fn test_deserialize_error() {
    let res = serde_json::from_str::<SwapMemoryStat>("{\"total\":1}");
    let err = res.unwrap_err();
    assert!(err.to_string().contains("Missing key: used"));
  }

  #[cfg(feature = "sysinfo")]
  #[test]
  fn test_from_sysinfo() {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let stat = SwapMemoryStat::from(&sys);
    assert_eq!(stat.total, sys.total_swap());
    assert_eq!(stat.sin, 0);
  }
}

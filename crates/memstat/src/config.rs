use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable overriding the proc filesystem root.
pub const HOST_PROC_ENV: &str = "HOST_PROC";
/// Environment variable selecting the backend.
pub const BACKEND_ENV: &str = "MEMSTAT_BACKEND";
/// Environment variable overriding the page size used for swap counters.
pub const PAGE_SIZE_ENV: &str = "MEMSTAT_PAGE_SIZE";

const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Which platform backend a sampler queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// `procfs` on Linux, `sysinfo` everywhere else.
  #[default]
  Auto,
  Procfs,
  Sysinfo,
}

impl FromStr for BackendKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "auto" => Ok(Self::Auto),
      "procfs" => Ok(Self::Procfs),
      "sysinfo" => Ok(Self::Sysinfo),
      _ => Err(ConfigError::InvalidBackend(s.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
  pub backend: BackendKind,
  /// Root of the proc filesystem read by the `procfs` backend.
  pub proc_root: PathBuf,
  /// Size in bytes of a swapped page.
  pub page_size: u64,
}

impl Default for SamplerConfig {
  fn default() -> Self {
    Self {
      backend: BackendKind::Auto,
      proc_root: PathBuf::from("/proc"),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl SamplerConfig {
  /// Default configuration with the `HOST_PROC`, `MEMSTAT_BACKEND` and
  /// `MEMSTAT_PAGE_SIZE` overrides applied.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::default().merge_env(|key| std::env::var(key).ok())
  }

  fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(root) = lookup(HOST_PROC_ENV) {
      self.proc_root = PathBuf::from(root);
    }
    if let Some(backend) = lookup(BACKEND_ENV) {
      self.backend = backend.parse()?;
    }
    if let Some(page_size) = lookup(PAGE_SIZE_ENV) {
      self.page_size =
        page_size
          .trim()
          .parse()
          .map_err(|err: std::num::ParseIntError| {
            ConfigError::InvalidPageSize {
              value: page_size.clone(),
              reason: err.to_string(),
            }
          })?;
    }
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect::<HashMap<_, _>>();
    move |key: &str| vars.get(key).cloned()
  }

  #[test]
  fn test_default() {
    let config = SamplerConfig::default();
    assert_eq!(config.backend, BackendKind::Auto);
    assert_eq!(config.proc_root, PathBuf::from("/proc"));
    assert_eq!(config.page_size, 4096);
    let config = SamplerConfig::default().merge_env(env(&[])).unwrap();
    assert_eq!(config, SamplerConfig::default());
  }

  #[test]
  fn test_merge_env() {
    let config = SamplerConfig::default()
      .merge_env(env(&[
        (HOST_PROC_ENV, "/host/proc"),
        (BACKEND_ENV, "SysInfo"),
        (PAGE_SIZE_ENV, "16384"),
      ]))
      .unwrap();
    assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
    assert_eq!(config.backend, BackendKind::Sysinfo);
    assert_eq!(config.page_size, 16384);
  }

  #[test]
  fn test_merge_env_invalid() {
    let res = SamplerConfig::default().merge_env(env(&[(BACKEND_ENV, "wmi")]));
    assert!(matches!(res, Err(ConfigError::InvalidBackend(b)) if b == "wmi"));
    let res =
      SamplerConfig::default().merge_env(env(&[(PAGE_SIZE_ENV, "4k")]));
    assert!(matches!(res, Err(ConfigError::InvalidPageSize { .. })));
  }

  #[test]
  fn test_deserialize() {
    let config: SamplerConfig =
      serde_json::from_str(r#"{"backend":"procfs","proc_root":"/rootfs/proc"}"#)
        .unwrap();
    assert_eq!(config.backend, BackendKind::Procfs);
    assert_eq!(config.proc_root, PathBuf::from("/rootfs/proc"));
    assert_eq!(config.page_size, 4096);
  }
}

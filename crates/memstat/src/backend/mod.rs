use memstat_stubs::{SwapMemoryStat, VirtualMemoryStat};

use crate::config::{BackendKind, SamplerConfig};
use crate::error::PlatformQueryError;

mod procfs;
mod system;

pub use procfs::ProcfsBackend;
pub use system::SysinfoBackend;

/// Source of memory statistics for one operating system family.
///
/// A backend fills every field it knows about and leaves the others at
/// zero. It must fail instead of returning a zeroed or partial snapshot.
pub trait PlatformQueryBackend: Send + Sync {
  /// Short name used in logs.
  fn name(&self) -> &'static str;

  fn virtual_memory(&self) -> Result<VirtualMemoryStat, PlatformQueryError>;

  fn swap_memory(&self) -> Result<SwapMemoryStat, PlatformQueryError>;
}

/// Build the backend selected by `config`.
pub fn from_config(config: &SamplerConfig) -> Box<dyn PlatformQueryBackend> {
  match config.backend {
    BackendKind::Procfs => Box::new(ProcfsBackend::from_config(config)),
    BackendKind::Sysinfo => Box::new(SysinfoBackend),
    BackendKind::Auto if cfg!(target_os = "linux") => {
      Box::new(ProcfsBackend::from_config(config))
    }
    BackendKind::Auto => Box::new(SysinfoBackend),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_config() {
    let mut config = SamplerConfig::default();
    config.backend = BackendKind::Sysinfo;
    assert_eq!(from_config(&config).name(), "sysinfo");
    config.backend = BackendKind::Procfs;
    assert_eq!(from_config(&config).name(), "procfs");
    config.backend = BackendKind::Auto;
    let expected = if cfg!(target_os = "linux") {
      "procfs"
    } else {
      "sysinfo"
    };
    assert_eq!(from_config(&config).name(), expected);
  }
}

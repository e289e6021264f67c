use sysinfo::System;

use memstat_stubs::{SwapMemoryStat, VirtualMemoryStat};

use crate::error::PlatformQueryError;

use super::PlatformQueryBackend;

/// Portable backend built on `sysinfo`.
///
/// Only the totals are known to it, kernel specific fields stay at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoBackend;

impl SysinfoBackend {
  fn refresh(&self) -> Result<System, PlatformQueryError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
      return Err(PlatformQueryError::Unsupported(format!(
        "sysinfo does not support {}",
        std::env::consts::OS
      )));
    }
    let mut sys = System::new();
    sys.refresh_memory();
    Ok(sys)
  }
}

impl PlatformQueryBackend for SysinfoBackend {
  fn name(&self) -> &'static str {
    "sysinfo"
  }

  fn virtual_memory(&self) -> Result<VirtualMemoryStat, PlatformQueryError> {
    let sys = self.refresh()?;
    Ok(VirtualMemoryStat::from(&sys))
  }

  fn swap_memory(&self) -> Result<SwapMemoryStat, PlatformQueryError> {
    let sys = self.refresh()?;
    Ok(SwapMemoryStat::from(&sys))
  }
}

use memstat_stubs::{SwapMemoryStat, VirtualMemoryStat};

use crate::backend::{self, PlatformQueryBackend};
use crate::config::SamplerConfig;
use crate::error::PlatformQueryError;

/// Queries the host for memory and swap statistics.
///
/// Holds no state besides its backend: every call is a fresh query and
/// returns its own snapshot. `used_percent` is always recomputed from
/// `used` and `total` so its meaning does not depend on the backend.
pub struct MemorySampler {
  backend: Box<dyn PlatformQueryBackend>,
}

impl MemorySampler {
  /// Sampler using the default backend of the host platform.
  pub fn new() -> Self {
    Self::from_config(&SamplerConfig::default())
  }

  pub fn from_config(config: &SamplerConfig) -> Self {
    let backend = backend::from_config(config);
    log::info!("Sampling memory with the {} backend", backend.name());
    Self { backend }
  }

  pub fn with_backend<B>(backend: B) -> Self
  where
    B: PlatformQueryBackend + 'static,
  {
    log::info!("Sampling memory with the {} backend", backend.name());
    Self {
      backend: Box::new(backend),
    }
  }

  pub fn backend_name(&self) -> &'static str {
    self.backend.name()
  }

  pub fn virtual_memory(
    &self,
  ) -> Result<VirtualMemoryStat, PlatformQueryError> {
    let stat = self
      .backend
      .virtual_memory()
      .map_err(|err| {
        log::error!("Unable to sample virtual memory: {err}");
        err
      })?
      .with_used_percent();
    log::debug!(
      "Virtual memory total: {} used: {} ({:.2}%)",
      stat.total,
      stat.used,
      stat.used_percent
    );
    Ok(stat)
  }

  pub fn swap_memory(&self) -> Result<SwapMemoryStat, PlatformQueryError> {
    let stat = self
      .backend
      .swap_memory()
      .map_err(|err| {
        log::error!("Unable to sample swap memory: {err}");
        err
      })?
      .with_used_percent();
    log::debug!(
      "Swap memory total: {} used: {} ({:.2}%)",
      stat.total,
      stat.used,
      stat.used_percent
    );
    Ok(stat)
  }
}

impl Default for MemorySampler {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for MemorySampler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemorySampler")
      .field("backend", &self.backend.name())
      .finish()
  }
}

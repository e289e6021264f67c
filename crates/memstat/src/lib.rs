//! Host memory and swap sampling.
//!
//! ```no_run
//! let stat = memstat::virtual_memory()?;
//! println!("{stat}");
//! # Ok::<(), memstat::PlatformQueryError>(())
//! ```

mod backend;
mod config;
mod error;
mod sampler;

pub use backend::{PlatformQueryBackend, ProcfsBackend, SysinfoBackend};
pub use config::*;
pub use error::*;
pub use sampler::*;

pub use memstat_stubs::*;

/// Sample virtual memory with the default backend of the host.
pub fn virtual_memory() -> Result<VirtualMemoryStat, PlatformQueryError> {
  MemorySampler::new().virtual_memory()
}

/// Sample swap memory with the default backend of the host.
pub fn swap_memory() -> Result<SwapMemoryStat, PlatformQueryError> {
  MemorySampler::new().swap_memory()
}

mod error;
mod field;
mod swap_memory;
mod virtual_memory;

pub use error::*;
pub use field::{Field, FieldValue, Snapshot};
pub use swap_memory::*;
pub use virtual_memory::*;

/// Percentage of `total` that `used` represents, 0 when `total` is 0.
pub fn used_percent(used: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  used as f64 / total as f64 * 100.0
}

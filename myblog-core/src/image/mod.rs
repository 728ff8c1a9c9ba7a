pub mod resize;

pub use resize::LanczosResizer;

use crate::Result;

/// Scales encoded image bytes. A zero dimension is derived from the other one
/// so the aspect ratio is preserved.
#[cfg_attr(test, mockall::automock)]
pub trait Resizer: Send + Sync {
    fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;
}

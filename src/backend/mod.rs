//! Built-in backends.
//!
//! Native toolkit backends (GTK, Win32, Android, UIKit) live in platform code
//! and install themselves with `register_ops`; this crate ships
//! the in-memory model and a winit desktop backend on top of it.

mod desktop;
mod headless;

use std::sync::Arc;

pub use self::desktop::WinitBackend;
pub use self::headless::{CanvasRecord, HeadlessBackend, MenuEntry, WindowRecord};

use crate::config::{BackendKind, Config};
use crate::ops::PlatformOps;

/// Instantiate a built-in backend. Kinds without a built-in implementation
/// get the in-memory model.
pub fn create(kind: BackendKind, config: &Config) -> Arc<dyn PlatformOps> {
    match kind {
        BackendKind::Winit => Arc::new(WinitBackend::new(config)),
        BackendKind::Headless => Arc::new(HeadlessBackend::new(config)),
        other => {
            log::debug!("backend::create: no built-in {:?} backend, using headless", other);
            Arc::new(HeadlessBackend::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_headless() {
        assert_eq!(create(BackendKind::Headless, &Config::headless()).name(), "headless");
        assert_eq!(create(BackendKind::Android, &Config::headless()).name(), "headless");
    }
}

//! Runtime configuration.
//!
//! Backend selection is explicit: a [`Config`] names the backend, and only
//! when nothing was configured does the compile-time default apply.

use std::str::FromStr;

use crate::input::NativeFamily;
use crate::layout::LayoutMetrics;
use crate::registry::RegistryMode;

/// Environment variable selecting the backend (`headless`, `winit`, `gtk`,
/// `win32`, `android`, `uikit`).
pub const ENV_BACKEND: &str = "NG_PLATFORM_BACKEND";

/// Environment variable overriding registry capacity. `0` or `unbounded`
/// selects map-backed registries.
pub const ENV_REGISTRY_CAPACITY: &str = "NG_PLATFORM_REGISTRY_CAPACITY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory model; no windowing system required.
    Headless,
    /// winit event loop wrapping the in-memory model.
    Winit,
    /// Native backends supplied by platform code through `register_ops`.
    Gtk,
    Win32,
    Android,
    UiKit,
}

impl BackendKind {
    /// Compile-time default for the target platform.
    pub fn for_current_platform() -> Self {
        if cfg!(any(
            target_os = "linux",
            target_os = "windows",
            target_os = "macos",
            target_os = "android",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly",
        )) {
            BackendKind::Winit
        } else {
            BackendKind::Headless
        }
    }

    /// Whether this crate ships an implementation of the backend.
    pub fn is_builtin(self) -> bool {
        matches!(self, BackendKind::Headless | BackendKind::Winit)
    }

    /// Native input vocabulary the backend reports events in.
    pub fn native_family(self) -> NativeFamily {
        match self {
            BackendKind::Headless | BackendKind::Winit => NativeFamily::Canonical,
            BackendKind::Gtk => NativeFamily::Gdk,
            BackendKind::Win32 => NativeFamily::Win32,
            BackendKind::Android => NativeFamily::Android,
            BackendKind::UiKit => NativeFamily::UiKit,
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headless" => Ok(BackendKind::Headless),
            "winit" => Ok(BackendKind::Winit),
            "gtk" | "linux" => Ok(BackendKind::Gtk),
            "win32" | "windows" => Ok(BackendKind::Win32),
            "android" => Ok(BackendKind::Android),
            "uikit" | "ios" => Ok(BackendKind::UiKit),
            other => Err(format!("unknown backend `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: BackendKind,
    pub registry: RegistryMode,
    pub layout: LayoutMetrics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::for_current_platform(),
            registry: RegistryMode::default(),
            layout: LayoutMetrics::default(),
        }
    }
}

impl Config {
    pub fn headless() -> Self {
        Self::default().with_backend(BackendKind::Headless)
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_registry(mut self, registry: RegistryMode) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`. Malformed values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BACKEND) {
            match value.parse() {
                Ok(backend) => config.backend = backend,
                Err(e) => log::warn!("{}: {}", ENV_BACKEND, e),
            }
        }

        if let Some(value) = lookup(ENV_REGISTRY_CAPACITY) {
            match parse_registry_mode(&value) {
                Some(mode) => config.registry = mode,
                None => log::warn!("{}: invalid capacity `{}`", ENV_REGISTRY_CAPACITY, value),
            }
        }

        config
    }
}

fn parse_registry_mode(value: &str) -> Option<RegistryMode> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("unbounded") {
        return Some(RegistryMode::Unbounded);
    }
    match value.parse::<usize>().ok()? {
        0 => Some(RegistryMode::Unbounded),
        n => Some(RegistryMode::Bounded(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_REGISTRY_CAPACITY;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.registry, RegistryMode::Bounded(DEFAULT_REGISTRY_CAPACITY));
        assert_eq!(config.layout.padding, 12.0);
        assert_eq!(config.backend, BackendKind::for_current_platform());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BACKEND, "Headless"),
            (ENV_REGISTRY_CAPACITY, "16"),
        ]));
        assert_eq!(config.backend, BackendKind::Headless);
        assert_eq!(config.registry, RegistryMode::Bounded(16));

        let config = Config::from_lookup(lookup(&[(ENV_REGISTRY_CAPACITY, "unbounded")]));
        assert_eq!(config.registry, RegistryMode::Unbounded);
        let config = Config::from_lookup(lookup(&[(ENV_REGISTRY_CAPACITY, "0")]));
        assert_eq!(config.registry, RegistryMode::Unbounded);
    }

    #[test]
    fn test_malformed_env_is_ignored() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BACKEND, "motif"),
            (ENV_REGISTRY_CAPACITY, "lots"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_backend_families() {
        assert_eq!("win32".parse::<BackendKind>().unwrap().native_family(), NativeFamily::Win32);
        assert_eq!(BackendKind::Gtk.native_family(), NativeFamily::Gdk);
        assert!(BackendKind::Winit.is_builtin());
        assert!(!BackendKind::UiKit.is_builtin());
    }
}

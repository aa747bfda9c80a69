//! Native GUI platform core
//!
//! This crate sits between a host language runtime and whatever native
//! toolkit a platform provides. It owns the parts every backend shares:
//! opaque handles, the pluggable operation table, canonical input events,
//! cursor grab state and box/split layout.
//!
//! # Architecture
//!
//! ```text
//! host runtime → ng_platform_* (C ABI) → Platform → dyn PlatformOps → toolkit
//!                                            ↑                          ↓
//!                      EventQueue ← EventForwarder ← ng_invoke_* / winit events
//!                                            ↓
//!                                     LayoutEngine (cosmic-text)
//! ```
//!
//! # Backends
//!
//! - `winit`: desktop windows driven by a winit event loop
//! - `headless`: in-memory model used for tests and as a fallback
//! - native toolkits: registered at startup with [`ffi::register_ops`]
//!
//! Operations a backend does not implement report
//! [`NgError::Unsupported`]; the C ABI turns that into the operation's
//! documented default.

// =============================================================================
// Modules
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod ffi;
pub mod forward;
pub mod handle;
pub mod input;
pub mod layout;
pub mod ops;
pub mod platform;
pub mod registry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{BackendKind, Config};
pub use error::{NgError, NgResult};
pub use events::{Event, EventQueue, EventSink, LifecycleEvent, WidgetEvent, WindowEvent};
pub use forward::{EventForwarder, NativeEvent, ScaleCallback};
pub use handle::{Handle, MenuHandle};
pub use input::{GrabMode, KeyCode, ModifierFlags, MouseButton, NativeFamily};
pub use layout::{Frame, LayoutEngine, LayoutMetrics, Orientation};
pub use ops::{CanvasBuffer, OpsRegistry, PlatformOps};
pub use platform::Platform;
pub use registry::{Registration, RegistryMode, WindowRegistry};

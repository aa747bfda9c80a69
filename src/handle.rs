//! Opaque handles for native objects.
//!
//! A handle names exactly one native window, widget or menu owned by the
//! backend that created it. Generic code never dereferences a handle; it only
//! passes it back into backend calls. Zero is reserved for "no object", so the
//! typed API cannot express a null handle at all and the C boundary rejects
//! NULL before anything reaches a backend.

use std::fmt;
use std::num::NonZeroUsize;
use std::os::raw::c_void;

/// Handle to a native window or widget (`NGHandle` on the C side).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroUsize);

/// Handle to a native menu or submenu (`NGMenuHandle` on the C side).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MenuHandle(NonZeroUsize);

macro_rules! impl_handle {
    ($name:ident, $label:literal) => {
        impl $name {
            /// Wrap a raw pointer-sized value. Returns `None` for zero.
            pub fn from_raw(raw: usize) -> Option<Self> {
                NonZeroUsize::new(raw).map(Self)
            }

            /// Wrap a C pointer. Returns `None` for NULL.
            pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                Self::from_raw(ptr as usize)
            }

            pub fn raw(self) -> usize {
                self.0.get()
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.get() as *mut c_void
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({:#x})"), self.0.get())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0.get())
            }
        }
    };
}

impl_handle!(Handle, "Handle");
impl_handle!(MenuHandle, "MenuHandle");

/// Convert an optional handle to its C representation (NULL for `None`).
pub fn to_ptr<H: Into<Option<Handle>>>(handle: H) -> *mut c_void {
    handle
        .into()
        .map(Handle::as_ptr)
        .unwrap_or(std::ptr::null_mut())
}

/// Monotonic allocator for backends that mint their own handle values.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: usize,
}

impl HandleAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    pub(crate) fn next_raw(&mut self) -> NonZeroUsize {
        let raw = NonZeroUsize::new(self.next).unwrap_or(NonZeroUsize::MIN);
        self.next = self.next.wrapping_add(1).max(1);
        raw
    }

    pub(crate) fn handle(&mut self) -> Handle {
        Handle(self.next_raw())
    }

    pub(crate) fn menu(&mut self) -> MenuHandle {
        MenuHandle(self.next_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_handle() {
        assert!(Handle::from_raw(0).is_none());
        assert!(MenuHandle::from_ptr(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn test_pointer_round_trip_preserves_identity() {
        let h = Handle::from_raw(0xBEEF).unwrap();
        assert_eq!(Handle::from_ptr(h.as_ptr()), Some(h));
        assert_eq!(to_ptr(None), std::ptr::null_mut());
    }

    #[test]
    fn test_allocator_never_yields_zero() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.handle();
        let b = alloc.menu();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
    }
}

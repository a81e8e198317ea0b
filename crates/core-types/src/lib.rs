use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the recorder crates.
#[derive(Debug, Error, Clone)]
pub enum TraceError {
    #[error("{message}")]
    Message { message: String },
}

impl TraceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

fn guid() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifier of one traced browser context, unique for the process lifetime.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContextId(pub String);

impl ContextId {
    pub fn new() -> Self {
        Self(format!("context@{}", guid()))
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier a tracer assigns to a page the first time it observes it.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(format!("page@{}", guid()))
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Frame identifier as reported by the automation engine.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId(pub String);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Process-local identity of an engine object (context, page, element).
///
/// Engine objects are referenced, never owned, by the recorder; the handle is
/// what keys its bookkeeping maps.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl HandleId {
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static CLOCK_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Milliseconds on the process monotonic clock.
pub fn monotonic_time() -> f64 {
    CLOCK_ORIGIN.elapsed().as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_kind_prefix() {
        let ctx = ContextId::new();
        let page = PageId::new();
        assert!(ctx.0.starts_with("context@"));
        assert!(page.0.starts_with("page@"));
        assert_eq!(ctx.0.len(), "context@".len() + 32);
        assert_ne!(page, PageId::new());
    }

    #[test]
    fn monotonic_time_never_goes_backwards() {
        let a = monotonic_time();
        let b = monotonic_time();
        assert!(b >= a);
    }

    #[test]
    fn handles_are_unique() {
        assert_ne!(HandleId::next(), HandleId::next());
    }
}

#![forbid(unsafe_code)]

//! Browser host for BlogSphere pages
//!
//! This crate runs the `libblogsphere` controllers inside a web page. It
//! implements the `Dom` and `Window` traits over `web-sys`, installs one
//! delegated listener per native event type on the document and feeds every
//! event through `App::dispatch`, spawning the returned request futures on the
//! browser's microtask queue.
//!
//! Page setup and the native event table are plain Rust and tested natively.
//! The `web-sys` glue is only compiled on `wasm32` targets.

pub mod listeners;
pub mod offsets;
pub mod setup;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::start;

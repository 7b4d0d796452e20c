//! This module handles platform specific code. Depending on the compilation target different
//! parts of this module are used

#[cfg(not(target_arch = "wasm32"))]
pub use noweb::*;

#[cfg(not(target_arch = "wasm32"))]
mod noweb;

//! The host half of the Windows API forwarding layer.
//!
//! A host registers the native areas it can back with [`runtime::HostRuntime`], which turns them
//! into a call-id table and hands out the gate guest threads cross through.

#![allow(clippy::missing_safety_doc)]

pub mod config;
pub mod d3d11;
pub mod logging;
pub mod runtime;
pub mod synthetic;
pub mod user32;

#[cfg(test)]
mod tests;

//! docpreview - local preview server for generated documentation
//!
//! Serves a directory of pre-built static files over loopback HTTP, with a
//! MIME registry that maps `.wasm` to `application/wasm` so browsers will
//! instantiate WebAssembly modules during local testing.

pub mod config;
pub mod files;
pub mod http;
pub mod server;

//! Integration test common infrastructure.
//!
//! Provides utilities for spawning test servers, minting tokens, and
//! driving plain TCP clients line by line.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

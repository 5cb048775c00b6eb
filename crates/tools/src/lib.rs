//! Deploy Tools Library
//!
//! Loads and validates the compiler and network configuration consumed by
//! the contract build/deploy toolchain.

pub mod config;
pub mod env;
pub mod logging;

pub use config::{Config, ConfigError, Credential, NetworkEndpoint};
pub use env::{EnvFile, EnvSource, Layered, ProcessEnv};

//! Type definitions for MachPay runtime configuration

mod runtime_config;

pub use runtime_config::*;

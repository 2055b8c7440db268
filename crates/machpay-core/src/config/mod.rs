//! Configuration loading and management

mod hierarchical_loader;
mod user_config;

pub use hierarchical_loader::HierarchicalConfigLoader;
pub use user_config::{AuthSection, GatewaySection, UserConfig, VendorSection};

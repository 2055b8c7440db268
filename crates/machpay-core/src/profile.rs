//! Contracts for the credential and profile stores
//!
//! The lifecycle manager never talks to these stores itself; CLI commands
//! consult them before deciding whether and how to start the gateway.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role the user configured during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Vendor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Agent => write!(f, "agent"),
            Role::Vendor => write!(f, "vendor"),
        }
    }
}

/// Network the CLI is pointed at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Devnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Devnet => write!(f, "devnet"),
        }
    }
}

/// Source of authentication state
pub trait CredentialStore {
    fn is_authenticated(&self) -> bool;

    fn access_token(&self) -> Option<&str>;
}

/// Source of the user's role and vendor settings
pub trait ProfileStore {
    fn role(&self) -> Option<Role>;

    fn network(&self) -> Network;

    /// Upstream API the gateway should proxy to
    fn upstream_url(&self) -> Option<&str>;

    /// Port recorded for the gateway, if the user chose one
    fn gateway_port(&self) -> Option<u16>;
}

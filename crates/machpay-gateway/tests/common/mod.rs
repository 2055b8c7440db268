//! Common test infrastructure for machpay-gateway tests
//!
//! # Modules
//!
//! - `constants`: Tags, repository, payloads and digests
//! - `builders`: Fluent builder for registry release payloads
//! - `mock_server`: Wiremock registry and asset endpoints
//! - `fixtures`: In-memory release tarballs and fake gateway scripts

// Each test binary uses a different subset of the helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod fixtures;
pub mod mock_server;

pub use builders::*;
pub use constants::*;
pub use fixtures::*;
pub use mock_server::*;

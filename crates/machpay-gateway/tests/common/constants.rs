//! Shared constants for test infrastructure

use machpay_gateway::Platform;

// Release tags
pub const TAG_V1_0_0: &str = "v1.0.0";
pub const TAG_V1_2_0: &str = "v1.2.0";
pub const VERSION_1_2_0: &str = "1.2.0";

pub const TEST_REPO: &str = "machpay/machpay-gateway";

/// Asset name for [`test_platform`]
pub const LINUX_AMD64_ASSET: &str = "machpay-gateway_linux_amd64.tar.gz";

pub const CHECKSUMS_ASSET: &str = "checksums.txt";

pub const HELLO_WORLD_SHA256: &str =
    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

pub const WRONG_CHECKSUM: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

pub const OLD_BINARY_CONTENT: &[u8] = b"previously installed gateway";

/// Installs in tests always target linux/amd64 so asset names are fixed
pub fn test_platform() -> Platform {
    Platform::new("linux", "amd64")
}

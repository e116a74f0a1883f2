//! Shared constants for test infrastructure

// Repository
pub const SLUG: &str = "phoenix-cli/phoenix";
pub const OWNER: &str = "phoenix-cli";
pub const REPO: &str = "phoenix";
pub const INVALID_SLUG: &str = "not-a-slug";

// Versions
pub const CURRENT_VERSION: &str = "v1.2.0";
pub const TAG_V1_1_0: &str = "v1.1.0";
pub const TAG_V1_2_0: &str = "v1.2.0";
pub const TAG_V1_3_0: &str = "v1.3.0";
pub const TAG_V1_10_0: &str = "v1.10.0";

// Platform used by every resolver under test
pub const TEST_OS: &str = "linux";
pub const TEST_ARCH: &str = "x86_64";

// Asset naming
pub const EXECUTABLE_NAME: &str = "phoenix";
pub const LINUX_ASSET: &str = "phoenix_linux_amd64.tar.gz";
pub const DARWIN_ASSET: &str = "phoenix_darwin_arm64.tar.gz";
pub const VALIDATION_SUFFIX: &str = ".sha256";

// Binary contents
pub const OLD_BINARY: &[u8] = b"\x7fELF phoenix v1.2.0";
pub const NEW_BINARY: &[u8] = b"\x7fELF phoenix v1.3.0 with more features";

// Checksum constants
pub const WRONG_CHECKSUM: &str = "0000000000000000000000000000000000000000000000000000000000000000";

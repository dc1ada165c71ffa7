//! Diagnostic codes reported while interpreting and validating descriptors
//!
//! Ranges:
//! - K1xxx: lexer (kiln-syntax)
//! - K2xxx: parser (kiln-syntax)
//! - K30xx: interpretation errors
//! - K31xx: interpretation warnings
//! - K40xx: validation errors
//! - K41xx: validation warnings
//! - K5xxx: TOML descriptor form

// K30xx - Interpretation errors
pub const UNKNOWN_CONFIGURATION: &str = "K3001";
pub const INVALID_COORDINATE: &str = "K3002";
pub const UNSUPPORTED_NOTATION: &str = "K3003";
pub const UNKNOWN_TASK: &str = "K3004";
pub const DUPLICATE_REGISTRATION: &str = "K3005";
pub const UNDEFINED_VARIABLE: &str = "K3006";
pub const INVALID_PLUGIN: &str = "K3007";
pub const INVALID_REPOSITORY: &str = "K3008";
pub const UNKNOWN_TEST_EVENT: &str = "K3009";
pub const UNSUPPORTED_STATEMENT: &str = "K3010";
pub const INVALID_VALUE: &str = "K3011";
pub const MISSING_JAVA_PLUGIN: &str = "K3012";

// K31xx - Interpretation warnings
pub const IGNORED_STATEMENT: &str = "K3100";
pub const DUPLICATE_DEPENDENCY_DECLARATION: &str = "K3101";

// K40xx - Validation errors
pub const API_WITHOUT_LIBRARY: &str = "K4001";
pub const NO_CONFIGURATION_PLUGIN: &str = "K4002";
pub const NO_REPOSITORY: &str = "K4003";
pub const DUPLICATE_PLUGIN: &str = "K4004";
pub const UNKNOWN_TASK_REFERENCE: &str = "K4005";
pub const TASK_CYCLE: &str = "K4006";
pub const DUPLICATE_TASK: &str = "K4007";

// K41xx - Validation warnings
pub const DUPLICATE_DEPENDENCY: &str = "K4101";

// K5xxx - TOML form
pub const TOML_SYNTAX: &str = "K5001";

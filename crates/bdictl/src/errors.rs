//! Exit codes for bdictl

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when input was rejected (no consent or empty text)
pub const EXIT_VALIDATION: i32 = 2;

/// Exit code when the model endpoint is unreachable or the model is missing
pub const EXIT_MODEL_UNAVAILABLE: i32 = 70;

/// Exit code when the run was interrupted with Ctrl-C
pub const EXIT_CANCELLED: i32 = 130;

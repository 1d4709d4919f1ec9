//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                   |
//! |------|-----------|-----------------------------------------------|
//! | 0    | Universal | Success (all units reconciled)                |
//! | 1    | Universal | General error (unspecified)                   |
//! | 2    | Universal | Usage or config error (bad args, bad TOML)    |
//! | 3    | run       | Divergences found                             |
//! | 4    | run       | No valid report/sheet pairs in the input      |
//! | 5    | run       | Consolidated report could not be written      |
//! | 6    | prepare   | Prepare/split run failed                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (unreadable input, write failure).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing file, invalid config.
pub const EXIT_USAGE: u8 = 2;

/// Reconciliation found divergences (outside tolerance).
/// Like `diff(1)`, a nonzero code here means "sides differ", not "crashed".
pub const EXIT_DIVERGENCES: u8 = 3;

/// No valid report/sheet pairs: nothing matched by unit digits.
pub const EXIT_NO_PAIRS: u8 = 4;

/// The consolidated report PDF could not be rendered or saved.
pub const EXIT_REPORT_WRITE: u8 = 5;

/// Prepare/split run failed (unreadable workbook, bad MATRIZ, write error).
pub const EXIT_PREPARE: u8 = 6;

//! Process exit codes, taken from BSD `sysexits.h`.

pub const OK: i32 = 0;

/// Bad flags or no subcommand.
pub const USAGE: i32 = 64;

/// Dataset is unreadable as a table of records.
pub const DATAERR: i32 = 65;

/// Reading or writing a file failed.
pub const IOERR: i32 = 74;

/// Settings file missing or malformed, or tree options invalid.
pub const CONFIG: i32 = 78;

/// Exit codes for the bmstore CLI, following BSD sysexits where possible.
///
/// Successful termination
pub const SUCCESS: i32 = 0;

/// Command line usage error: invalid arguments, malformed search query
pub const USAGE: i32 = 64;

/// The bookmark URL is already stored
pub const DUP: i32 = 65;

/// The database file cannot be opened or migrated
pub const UNAVAILABLE: i32 = 69;

/// Internal error: unexpected storage fault
pub const SOFTWARE: i32 = 70;

/// The database stayed locked past the busy timeout; retry later
pub const TEMPFAIL: i32 = 75;

/// Configuration file unreadable or invalid
pub const CONFIG: i32 = 78;

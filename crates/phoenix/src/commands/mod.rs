//! Command implementations

pub mod upgrade;
pub mod version;

/// Exit status after an interrupt, as shells report SIGINT
pub const EXIT_CANCELLED: u8 = 130;

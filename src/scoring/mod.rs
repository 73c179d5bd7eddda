//! Pure scoring engines for race weekends and the season championship.

/// Championship top-three scoring.
pub mod championship;
/// Race weekend scoring rules and constants.
pub mod race;

//! Shared primitive IDs and identifier tokens.

/// Pool member identifier.
pub type UserId = u64;
/// Season round number identifying a race weekend.
pub type RaceId = u32;
/// Monotonic operation sequence number.
pub type OpSeq = u64;
/// Monotonic standings snapshot identifier.
pub type SnapshotId = u64;

/// Canonical driver token from the seasonal roster.
///
/// Compared by string identity only; resolution from free-form feed names
/// happens in [`crate::resolve`].
pub type DriverId = String;
/// Canonical constructor token from the seasonal roster.
pub type TeamId = String;

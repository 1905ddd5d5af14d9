//! Hard bounds on request shape and wire framing.

/// Upper bound on hours in a single reserve request (one day of slots).
pub const MAX_HOURS_PER_REQUEST: usize = 24;

/// Upper bound on space/user identifier length.
pub const MAX_ID_LEN: usize = 128;

/// Chunk size for batch user lookups (backends cap batch reads).
pub const BATCH_LOOKUP_CHUNK: usize = 100;

/// Largest accepted wire frame (one JSON request line).
pub const MAX_WIRE_FRAME_BYTES: usize = 64 * 1024;

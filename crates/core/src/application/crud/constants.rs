// CRUD service constants (no magic values)

/// Page size applied by `find_paged` when the caller gives no limit
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;

/// Upper bound on create attempts inside one upsert/resert call.
/// The second attempt only runs after the first insert lost a race.
pub const MAX_MERGE_ATTEMPTS: u32 = 2;

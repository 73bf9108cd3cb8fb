/// Prefix of every physical partition name. Existing data depends on it.
pub const PARTITION_PREFIX: &str = "snds_";

/// Request header carrying the tenant code.
pub const TENANT_HEADER: &str = "x-tenant-code";

/// Request header carrying the caller's resolved role.
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

/// Request header carrying the caller's granted permissions, comma separated.
pub const CALLER_PERMISSIONS_HEADER: &str = "x-caller-permissions";

/// Counter used for plan sequence numbers.
pub const PLAN_SEQUENCE: &str = "plan";

/// Counter used for need codes.
pub const NEED_SEQUENCE: &str = "need";

/// Prefix of formatted need codes.
pub const NEED_CODE_PREFIX: &str = "NEED";

/// Attempts made when a freshly allocated code collides with an existing row.
pub const SEQUENCE_RETRY_ATTEMPTS: usize = 3;

/// Month and day on which every school year ends.
pub const SCHOOL_YEAR_END_MONTH: u32 = 5;
pub const SCHOOL_YEAR_END_DAY: u32 = 31;

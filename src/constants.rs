/// Column that partitions every data table by user
pub const USER_COLUMN: &str = "usuario";

/// Default session lifetime in seconds (12 hours)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 43_200;

/// bcrypt accepts costs in this range only
pub const MIN_PASSWORD_HASH_COST: u32 = 4;
pub const MAX_PASSWORD_HASH_COST: u32 = 31;

// =============================================================================
// Users roster values
// =============================================================================

/// Profile granted access to the users roster
pub const PROFILE_ADMIN: &str = "admin";

/// Profile assigned when the roster leaves it blank
pub const PROFILE_USER: &str = "user";

/// Status value of an account allowed to log in
pub const STATUS_ACTIVE: &str = "ativo";

/// Status value of a disabled account
pub const STATUS_INACTIVE: &str = "inativo";

// =============================================================================
// Reports & projections
// =============================================================================

/// Monthly report that can no longer be overwritten
pub const REPORT_STATUS_FINAL: &str = "Finalizado";

/// Monthly report still open for changes
pub const REPORT_STATUS_DRAFT: &str = "Rascunho";

/// Projection horizon in months (10 years)
pub const PROJECTION_MONTHS: u32 = 120;

/// A projection keeps running at least this many months even after the
/// target is reached
pub const MIN_PROJECTION_MONTHS: u32 = 12;

/// Longest horizon accepted for a contribution plan
pub const MAX_CONTRIBUTION_YEARS: u32 = 100;

/// Family name shown when the config table doesn't set one
pub const DEFAULT_FAMILY_NAME: &str = "Família";

/// Columns coerced to numbers when a table is loaded
pub const NUMERIC_COLUMNS: [&str; 4] = ["valor", "valor_atual", "valor_alvo", "rendimento_mensal"];

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for an empty user identifier
pub const ERR_EMPTY_USER: &str = "User identifier must not be empty";

/// Error message for a missing username or password on user creation
pub const ERR_USER_AND_PASSWORD_REQUIRED: &str = "Username and password are required";

/// Error message for a row belonging to someone other than the session user
pub const ERR_FOREIGN_ROW: &str = "Rows must belong to the authenticated user";

/// Error message for writes to the users roster through the data routes
pub const ERR_USERS_TABLE_READ_ONLY: &str = "The users table is managed through /api/admin/users";

/// Error message for a roster row without a username
pub const ERR_ROSTER_BLANK_USER: &str = "Every roster row needs a username";

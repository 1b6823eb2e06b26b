//! Domain-level constants.
//!
//! These constants define business rules and the field names shared by every
//! persisted collection.

// =============================================================================
// Roles
// =============================================================================

/// Superuser role, allowed to act on any record
pub const ROLE_ADMIN: &str = "ADMIN";

/// Coach role
pub const ROLE_COACH: &str = "COACH";

/// Athlete role
pub const ROLE_ATHLETE: &str = "ATHLETE";

// =============================================================================
// Document fields
// =============================================================================

/// Owner field set to the creating user
pub const FIELD_CREATED_BY: &str = "createdBy";

/// Subject field for records kept on behalf of another user
pub const FIELD_USER_ID: &str = "userId";

/// Soft delete timestamp field
pub const FIELD_DELETED_AT: &str = "deletedAt";

pub const FIELD_COACH_ID: &str = "coachId";
pub const FIELD_ATHLETE_ID: &str = "athleteId";
pub const FIELD_IS_ACTIVE: &str = "is_active";

// =============================================================================
// Pagination
// =============================================================================

/// Default page number (1-based)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound for a single page
pub const MAX_PAGE_SIZE: u64 = 100;

// =============================================================================
// Migrations
// =============================================================================

/// Collection holding one record per applied migration
pub const DEFAULT_MIGRATION_COLLECTION: &str = "migrations_applied";

/// Default number of updates sent per bulk write during backfills
pub const DEFAULT_MIGRATION_BATCH_SIZE: usize = 500;

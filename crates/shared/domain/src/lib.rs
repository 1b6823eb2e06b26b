//! Domain layer - Core governance rules and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! roles and sessions, the ownership-based authorization decider, entity
//! kinds and their owner fields, coach-athlete visibility windows and
//! migration bookkeeping.

pub mod authorization;
pub mod coach_athlete;
pub mod constants;
pub mod entity;
pub mod error;
pub mod migration;
pub mod naming;
pub mod session;

pub use authorization::{can_act, Action, OwnershipCheck};
pub use coach_athlete::CoachAthleteLink;
pub use constants::*;
pub use entity::{normalize_owner, EntityKind, EntityState, OwnerField};
pub use error::{DomainError, DomainResult};
pub use migration::{follows_id_convention, MigrationRecord};
pub use naming::humanize_slug;
pub use session::{Role, Session};

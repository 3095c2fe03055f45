//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod entity_type;
mod grant;
mod linkage;
mod permission;

pub use access::AccessibleIds;
pub use entity_type::EntityTypeDeclaration;
pub use grant::{ActorKind, PermissionGrant};
pub use linkage::RelationshipLink;
pub use permission::{AccessOperation, NO_ACCESS_LEVEL, PermissionLevel};

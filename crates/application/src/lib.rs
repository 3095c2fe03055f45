//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod entity_list_service;
mod parent_scope_gate;
mod permission_resolution_service;
mod query_fragments;
mod rbac_gate;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    EntityRecord, EntityRecordReader, EntityTypeCatalog, GrantQuery, LinkQuery, PermissionStore,
    RelationshipStore,
};
pub use entity_list_service::{
    EntityListRequest, EntityListService, EntityPage, MAX_PAGE_SIZE, ParentContext,
};
pub use parent_scope_gate::scope_to_parent;
pub use permission_resolution_service::PermissionResolutionService;
pub use query_fragments::{
    AccessPredicate, EntityQuery, ParentScopeJoin, QueryAlias, RecordPredicate,
};
pub use rbac_gate::RbacGate;

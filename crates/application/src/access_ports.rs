mod records;
mod stores;

pub use records::{EntityRecord, EntityRecordReader};
pub use stores::{EntityTypeCatalog, GrantQuery, LinkQuery, PermissionStore, RelationshipStore};

pub mod arrow;
pub mod classify;
pub mod derive;
pub mod lattice;
pub mod types;
pub mod write;

pub use self::arrow::{build_arrow_schema, emit_schema, map_to_storage_type, ColumnSpec, StorageType};
pub use classify::classify;
pub use derive::{derive_types, DEFAULT_SAMPLE_LIMIT};
pub use lattice::join;
pub use types::{ColumnStructure, TypeTag};
pub use write::write_structure;

// ── Record model ──

pub mod entity_id;
pub mod record;

pub use entity_id::EntityId;
pub use record::{FormValues, HasId, ID_FIELD, Record};

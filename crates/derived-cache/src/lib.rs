//! # Derived Cache
//!
//! 依賴快照、變更偵測與記憶化衍生屬性存取器

pub mod detection;
pub mod policy;
pub mod property;
pub mod snapshot;

// Re-export 主要類型
pub use detection::{needs_recompute, refresh_all};
pub use policy::{default_get_value, default_is_unchanged, resolve_path, strict_identity, Resolution};
pub use property::{derived_property, DerivedProperty};
pub use snapshot::SnapshotStore;

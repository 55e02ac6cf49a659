//! # Derived
//!
//! 記憶化的衍生屬性：依賴變更時才重新計算的唯讀存取器

pub use derived_cache::{
    default_get_value, default_is_unchanged, derived_property, needs_recompute, refresh_all,
    resolve_path, strict_identity, DerivedProperty, Resolution, SnapshotStore,
};
pub use derived_core::{
    Accessor, Array, DerivedConfig, DerivedError, DerivedOptions, Function, GetValue, Getter,
    IsUnchanged, Object, Path, Property, PropertyDescriptor, Result, Segment, Value,
};

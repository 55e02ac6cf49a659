//! # Derived Core
//!
//! 宿主物件模型、設定與錯誤類型

pub mod config;
pub mod function;
pub mod object;
pub mod path;
pub mod value;

// Re-export 主要類型
pub use config::{DerivedConfig, DerivedOptions, GetValue, Getter, IsUnchanged};
pub use function::Function;
pub use object::{Accessor, Object, Property, PropertyDescriptor};
pub use path::{Path, Segment};
pub use value::{Array, Value};

/// 衍生屬性錯誤類型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivedError {
    /// 工廠呼叫時設定缺少或型別錯誤，訊息包含欄位名稱
    #[error("無效的設定 `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// 對衍生屬性寫入
    #[error("`{property}` 是衍生屬性（derived property），無法直接設定")]
    ReadOnlyViolation { property: String },

    #[error("屬性 `{property}` 不可重新設定（non-configurable）")]
    NonConfigurable { property: String },
}

impl DerivedError {
    /// 建立設定錯誤
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DerivedError>;

//! 衍生屬性存取器

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use derived_core::{
    Accessor, DerivedConfig, DerivedError, GetValue, Getter, IsUnchanged, Object,
    PropertyDescriptor, Result, Value,
};

use crate::detection;
use crate::policy;
use crate::snapshot::SnapshotStore;

/// 存取器共享狀態
struct DerivedInner {
    getter: Getter,
    dependencies: Vec<String>,
    cache_enabled: bool,
    get_value: GetValue,
    is_unchanged: IsUnchanged,
    store: RefCell<SnapshotStore>,
}

/// 衍生屬性
///
/// 一次工廠呼叫產生一份快照與快取值。複製 `DerivedProperty`、
/// 或把同一個描述子安裝到多個宿主（或同一宿主的多個屬性名稱）時，
/// 它們共用同一份快取：交錯讀取不同宿主會看到彼此的快取值。
/// 需要每個宿主獨立快取時請使用 [`fork`](DerivedProperty::fork)。
#[derive(Clone)]
pub struct DerivedProperty {
    inner: Rc<DerivedInner>,
}

impl DerivedProperty {
    /// 驗證設定並建立存取器
    pub fn new(config: DerivedConfig) -> Result<Self> {
        config.validate()?;

        let DerivedConfig {
            getter,
            dependencies,
            cache_enabled,
            get_value,
            is_unchanged,
            ..
        } = config;

        let getter = getter.ok_or_else(|| {
            DerivedError::invalid_config("getter", "expected `getter` to be a function")
        })?;

        tracing::debug!(
            dependencies = ?dependencies,
            cache_enabled,
            "建立衍生屬性"
        );

        Ok(Self {
            inner: Rc::new(DerivedInner {
                getter,
                dependencies,
                cache_enabled,
                get_value: get_value.unwrap_or_else(policy::default_get_value),
                is_unchanged: is_unchanged.unwrap_or_else(policy::default_is_unchanged),
                store: RefCell::new(SnapshotStore::new()),
            }),
        })
    }

    /// 由動態設定物件建立
    pub fn from_object(options: &Object) -> Result<Self> {
        Self::new(DerivedConfig::from_object(options)?)
    }

    /// 讀取衍生值
    ///
    /// 停用快取、尚未計算過，或（有依賴且）任一依賴變更時重新計算；
    /// 否則直接回傳快取值，不呼叫計算函式，也不更動快照。
    pub fn get(&self, host: &Object) -> Value {
        let inner = &self.inner;
        let computed_once = inner.store.borrow().is_computed_once();

        let recompute = if !inner.cache_enabled || !computed_once {
            detection::refresh_all(host, &inner.dependencies, &inner.store, &inner.get_value);
            true
        } else if inner.dependencies.is_empty() {
            false
        } else {
            detection::needs_recompute(
                host,
                &inner.dependencies,
                &inner.store,
                &inner.get_value,
                &inner.is_unchanged,
            )
        };

        if !recompute {
            tracing::trace!("使用快取值");
            return inner.store.borrow().cached_value();
        }

        let args = inner.store.borrow().values_for(&inner.dependencies);
        tracing::debug!(
            dependencies = ?inner.dependencies,
            cache_enabled = inner.cache_enabled,
            first = !computed_once,
            "重新計算衍生屬性"
        );

        let value = (inner.getter)(host, &args);
        inner.store.borrow_mut().commit(value.clone());
        value
    }

    /// 屬性描述子（可設定、可列舉，共用本存取器的快取）
    pub fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor::new(Rc::new(self.clone()))
    }

    /// 安裝到宿主物件
    pub fn install(&self, host: &Object, name: &str) -> Result<()> {
        host.define_property(name, self.descriptor())
    }

    /// 以相同設定建立新的存取器，快照與快取為空
    pub fn fork(&self) -> Self {
        let inner = &self.inner;
        Self {
            inner: Rc::new(DerivedInner {
                getter: Rc::clone(&inner.getter),
                dependencies: inner.dependencies.clone(),
                cache_enabled: inner.cache_enabled,
                get_value: Rc::clone(&inner.get_value),
                is_unchanged: Rc::clone(&inner.is_unchanged),
                store: RefCell::new(SnapshotStore::new()),
            }),
        }
    }

    /// 清除快取，下次讀取時重新計算
    pub fn invalidate(&self) {
        self.inner.store.borrow_mut().clear();
    }

    /// 是否已有快取值
    pub fn is_computed(&self) -> bool {
        self.inner.store.borrow().is_computed_once()
    }

    /// 計算次數
    pub fn version(&self) -> u64 {
        self.inner.store.borrow().version()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.inner.dependencies
    }

    pub fn cache_enabled(&self) -> bool {
        self.inner.cache_enabled
    }

    /// 是否與另一個存取器共用快取
    pub fn shares_cache_with(&self, other: &DerivedProperty) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Accessor for DerivedProperty {
    fn get(&self, this: &Object) -> Value {
        DerivedProperty::get(self, this)
    }

    fn set(&self, _this: &Object, property: &str, _value: Value) -> Result<()> {
        Err(DerivedError::ReadOnlyViolation {
            property: property.to_string(),
        })
    }
}

impl fmt::Debug for DerivedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.inner.store.borrow();
        f.debug_struct("DerivedProperty")
            .field("dependencies", &self.inner.dependencies)
            .field("cache_enabled", &self.inner.cache_enabled)
            .field("computed", &store.is_computed_once())
            .field("version", &store.version())
            .finish()
    }
}

/// 衍生屬性工廠：驗證設定後回傳屬性描述子
pub fn derived_property(config: DerivedConfig) -> Result<PropertyDescriptor> {
    Ok(DerivedProperty::new(config)?.descriptor())
}

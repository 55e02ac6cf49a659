//! 宿主物件與屬性描述子

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::value::Value;
use crate::{DerivedError, Result};

/// 存取器屬性的讀寫行為
pub trait Accessor {
    /// 讀取屬性，`this` 為正在被讀取的宿主物件
    fn get(&self, this: &Object) -> Value;

    /// 寫入屬性
    fn set(&self, this: &Object, property: &str, value: Value) -> Result<()>;
}

/// 存取器屬性描述子
#[derive(Clone)]
pub struct PropertyDescriptor {
    /// 是否可重新定義或刪除
    pub configurable: bool,

    /// 是否出現在 `keys()` 中
    pub enumerable: bool,

    /// 讀寫行為
    pub accessor: Rc<dyn Accessor>,
}

impl PropertyDescriptor {
    /// 創建新的描述子（可設定、可列舉）
    pub fn new(accessor: Rc<dyn Accessor>) -> Self {
        Self {
            configurable: true,
            enumerable: true,
            accessor,
        }
    }

    /// 建構器模式：設置是否可重新定義
    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// 建構器模式：設置是否可列舉
    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// 兩個描述子是否共用同一個存取器
    pub fn shares_accessor_with(&self, other: &PropertyDescriptor) -> bool {
        Rc::ptr_eq(&self.accessor, &other.accessor)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("configurable", &self.configurable)
            .field("enumerable", &self.enumerable)
            .finish_non_exhaustive()
    }
}

/// 物件屬性
#[derive(Debug, Clone)]
pub enum Property {
    /// 資料屬性
    Data(Value),
    /// 存取器屬性
    Accessor(PropertyDescriptor),
}

/// 宿主物件
///
/// 屬性表以 `Rc<RefCell<..>>` 共享，複製 `Object` 得到的是同一個物件的另一個
/// 參照（身分相同）。鍵依字典序排列。
#[derive(Clone, Default)]
pub struct Object {
    properties: Rc<RefCell<BTreeMap<String, Property>>>,
}

impl Object {
    /// 創建空物件
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 JSON 物件建立，非物件回傳 `None`
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    /// 讀取屬性
    ///
    /// 存取器屬性以本物件作為 `this` 呼叫；不存在的屬性回傳 `Undefined`。
    pub fn get(&self, key: &str) -> Value {
        let property = self.properties.borrow().get(key).cloned();
        match property {
            Some(Property::Data(value)) => value,
            Some(Property::Accessor(descriptor)) => descriptor.accessor.get(self),
            None => Value::Undefined,
        }
    }

    /// 寫入屬性
    ///
    /// 存取器屬性交由其 `set` 處理（衍生屬性一律拒絕）；其餘情況寫入資料屬性。
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let accessor = match self.properties.borrow().get(key) {
            Some(Property::Accessor(descriptor)) => Some(Rc::clone(&descriptor.accessor)),
            _ => None,
        };

        match accessor {
            Some(accessor) => accessor.set(self, key, value.into()),
            None => {
                self.properties
                    .borrow_mut()
                    .insert(key.to_string(), Property::Data(value.into()));
                Ok(())
            }
        }
    }

    /// 定義存取器屬性
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> Result<()> {
        let mut properties = self.properties.borrow_mut();
        Self::ensure_configurable(&properties, key)?;
        properties.insert(key.to_string(), Property::Accessor(descriptor));
        Ok(())
    }

    /// 刪除屬性，回傳是否存在
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut properties = self.properties.borrow_mut();
        Self::ensure_configurable(&properties, key)?;
        Ok(properties.remove(key).is_some())
    }

    fn ensure_configurable(properties: &BTreeMap<String, Property>, key: &str) -> Result<()> {
        match properties.get(key) {
            Some(Property::Accessor(existing)) if !existing.configurable => {
                Err(DerivedError::NonConfigurable {
                    property: key.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// 是否有此屬性（不論是否可列舉）
    pub fn contains(&self, key: &str) -> bool {
        self.properties.borrow().contains_key(key)
    }

    /// 取得屬性本身（不呼叫存取器）
    pub fn property(&self, key: &str) -> Option<Property> {
        self.properties.borrow().get(key).cloned()
    }

    /// 可列舉的鍵
    pub fn keys(&self) -> Vec<String> {
        self.properties
            .borrow()
            .iter()
            .filter(|(_, property)| match property {
                Property::Data(_) => true,
                Property::Accessor(descriptor) => descriptor.enumerable,
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }

    /// 是否為同一個物件
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.properties, &other.properties)
    }

    pub(crate) fn deep_clone_with(&self, seen: &mut HashMap<usize, Value>) -> Object {
        let key = Rc::as_ptr(&self.properties) as usize;
        if let Some(Value::Object(copy)) = seen.get(&key) {
            return copy.clone();
        }

        let copy = Object::new();
        seen.insert(key, Value::Object(copy.clone()));

        let entries: Vec<(String, Property)> = self
            .properties
            .borrow()
            .iter()
            .map(|(key, property)| (key.clone(), property.clone()))
            .collect();

        let mut cloned = BTreeMap::new();
        for (key, property) in entries {
            let property = match property {
                Property::Data(value) => Property::Data(value.deep_clone_with(seen)),
                accessor => accessor,
            };
            cloned.insert(key, property);
        }
        *copy.properties.borrow_mut() = cloned;

        copy
    }

    /// 轉為 JSON（讀取可列舉屬性，會呼叫存取器）
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key).to_json();
                (key, value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Object {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let properties: BTreeMap<String, Property> = map
            .into_iter()
            .map(|(key, value)| (key, Property::Data(Value::from(value))))
            .collect();
        Self {
            properties: Rc::new(RefCell::new(properties)),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("keys", &self.keys()).finish()
    }
}

//! 依賴快照儲存

use std::collections::HashMap;

use derived_core::Value;

/// 依賴快照
///
/// 每個存取器一份：記錄每個依賴最近一次觀察到的值（深層複製）、
/// 是否已計算過，以及快取的計算結果。
#[derive(Debug, Default)]
pub struct SnapshotStore {
    values: HashMap<String, Value>,
    computed_once: bool,
    cached_value: Value,
    version: u64,
}

impl SnapshotStore {
    /// 創建空的快照
    pub fn new() -> Self {
        Self::default()
    }

    /// 讀取依賴快照，未記錄時為 `Undefined`
    pub fn get(&self, dependency: &str) -> Value {
        self.values.get(dependency).cloned().unwrap_or_default()
    }

    /// 記錄依賴值（深層複製，避免與宿主共用可變結構）
    pub fn record(&mut self, dependency: &str, value: &Value) {
        self.values.insert(dependency.to_string(), value.deep_clone());
    }

    /// 依宣告順序取出依賴快照
    pub fn values_for(&self, dependencies: &[String]) -> Vec<Value> {
        dependencies
            .iter()
            .map(|dependency| self.get(dependency))
            .collect()
    }

    /// 保存計算結果
    pub fn commit(&mut self, value: Value) {
        self.cached_value = value;
        self.computed_once = true;
        self.version += 1;
    }

    pub fn is_computed_once(&self) -> bool {
        self.computed_once
    }

    /// 快取值（未計算前為 `Undefined`）
    pub fn cached_value(&self) -> Value {
        self.cached_value.clone()
    }

    /// 計算次數
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 已記錄的依賴數量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 清除快照與快取值，計算次數保留
    pub fn clear(&mut self) {
        self.values.clear();
        self.computed_once = false;
        self.cached_value = Value::Undefined;
    }
}

//! 動態值模型

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::function::Function;
use crate::object::Object;

/// 共享陣列（以身分比較）
pub type Array = Rc<RefCell<Vec<Value>>>;

/// 宿主物件上的動態值
///
/// 原始值（布林、數字、字串）以值比較；陣列、物件、函式以身分比較，
/// 與 `===` 的語意一致。`PartialEq` 即為嚴格相等，因此 `NaN != NaN`。
#[derive(Clone, Default)]
pub enum Value {
    /// 未設定
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Function),
}

impl Value {
    /// 由元素建立新的陣列值
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// 嚴格相等（`===`）
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// 深層複製
    ///
    /// 陣列與物件產生新的身分，循環參照對應到同一份複本。
    /// 函式不可變，直接共享；存取器屬性沿用原描述子。
    pub fn deep_clone(&self) -> Value {
        self.deep_clone_with(&mut HashMap::new())
    }

    pub(crate) fn deep_clone_with(&self, seen: &mut HashMap<usize, Value>) -> Value {
        match self {
            Value::Array(items) => {
                let key = Rc::as_ptr(items) as usize;
                if let Some(copy) = seen.get(&key) {
                    return copy.clone();
                }

                let copy: Array = Rc::new(RefCell::new(Vec::new()));
                seen.insert(key, Value::Array(Rc::clone(&copy)));

                let source: Vec<Value> = items.borrow().clone();
                let cloned: Vec<Value> = source
                    .iter()
                    .map(|item| item.deep_clone_with(seen))
                    .collect();
                *copy.borrow_mut() = cloned;

                Value::Array(copy)
            }
            Value::Object(object) => Value::Object(object.deep_clone_with(seen)),
            other => other.clone(),
        }
    }

    /// 型別名稱（用於錯誤訊息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// 真值判斷
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// 轉為屬性鍵
    pub fn to_property_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// `undefined` 或 `null`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// 轉為 JSON
    ///
    /// `undefined` 與函式輸出為 `null`，無法表示的數字（NaN、無限大）亦同。
    /// 整數輸出為 JSON 整數。循環結構不支援。
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.borrow().iter().map(Value::to_json).collect())
            }
            Value::Object(object) => object.to_json(),
        }
    }
}

/// 可安全以 `i64` 表示的整數輸出為 JSON 整數，其餘以浮點數輸出
fn number_to_json(n: f64) -> serde_json::Value {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if n.is_finite() && n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&n) {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// 數字轉字串，整數不帶小數點
///
/// 絕對值不小於 1e21 或小於 1e-6 時使用指數表示（`1e+21`、`1.5e-7`）。
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        n.to_string()
    }
}

/// 以逗號串接陣列元素，已在串接中的陣列輸出為空字串
fn join_array(items: &Array, visiting: &mut Vec<usize>) -> String {
    let key = Rc::as_ptr(items) as usize;
    if visiting.contains(&key) {
        return String::new();
    }

    visiting.push(key);
    let parts: Vec<String> = items
        .borrow()
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(nested) => join_array(nested, visiting),
            other => other.to_string(),
        })
        .collect();
    visiting.pop();

    parts.join(",")
}

/// 除錯輸出用的包裝，記錄正在輸出的陣列
struct DebugEntry<'a> {
    value: &'a Value,
    visiting: &'a RefCell<Vec<usize>>,
}

impl fmt::Debug for DebugEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = match self.value {
            Value::Array(items) => items,
            other => return write!(f, "{:?}", other),
        };

        let key = Rc::as_ptr(items) as usize;
        if self.visiting.borrow().contains(&key) {
            return write!(f, "[...]");
        }

        self.visiting.borrow_mut().push(key);
        let result = f
            .debug_list()
            .entries(items.borrow().iter().map(|item| DebugEntry {
                value: item,
                visiting: self.visiting,
            }))
            .finish();
        self.visiting.borrow_mut().pop();

        result
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => write!(f, "{}", join_array(items, &mut Vec::new())),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(_) => write!(f, "function"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(_) => {
                let visiting = RefCell::new(Vec::new());
                let entry = DebugEntry {
                    value: self,
                    visiting: &visiting,
                };
                fmt::Debug::fmt(&entry, f)
            }
            Value::Object(object) => write!(f, "{:?}", object),
            Value::Function(function) => write!(f, "{:?}", function),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(Object::from(map)),
        }
    }
}

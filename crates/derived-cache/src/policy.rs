//! 預設取值與比較策略

use std::rc::Rc;

use derived_core::{Function, GetValue, IsUnchanged, Object, Path, Segment, Value};

/// 依賴值解析方式
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 直接使用欄位值
    Field(Value),
    /// 無參數方法：以父物件為 `this` 呼叫後使用回傳值
    Invoke(Function),
}

impl Resolution {
    /// 依能力判斷解析方式：只有無必要參數的函式會被呼叫
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Function(function) if function.arity() == 0 => Resolution::Invoke(function),
            other => Resolution::Field(other),
        }
    }

    /// 取得最終值
    pub fn resolve(self, parent: &Value) -> Value {
        match self {
            Resolution::Field(value) => value,
            Resolution::Invoke(function) => function.call(parent, &[]),
        }
    }
}

/// 依路徑解析宿主物件上的值
///
/// 完整鍵（即使含 `.`）存在時直接使用；否則逐段走訪，
/// 每一段遇到無參數方法都會以其父物件為 `this` 呼叫。
/// 中途遇到 `undefined`／`null` 時回傳 `Undefined`。
pub fn resolve_path(host: &Object, name: &str) -> Value {
    let root = Value::Object(host.clone());

    if host.contains(name) {
        return Resolution::classify(host.get(name)).resolve(&root);
    }

    let path = Path::parse(name);
    let mut current = root;
    for segment in path.segments() {
        if current.is_nullish() {
            return Value::Undefined;
        }
        let raw = lookup(&current, segment);
        current = Resolution::classify(raw).resolve(&current);
    }
    current
}

/// 讀取單一路徑片段
fn lookup(parent: &Value, segment: &Segment) -> Value {
    match (parent, segment) {
        (Value::Object(object), Segment::Key(key)) => object.get(key),
        (Value::Object(object), Segment::Index(index)) => object.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => {
            items.borrow().get(*index).cloned().unwrap_or_default()
        }
        (Value::Array(items), Segment::Key(key)) if key == "length" => {
            Value::from(items.borrow().len())
        }
        (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
            Ok(index) => items.borrow().get(index).cloned().unwrap_or_default(),
            Err(_) => Value::Undefined,
        },
        (Value::String(s), Segment::Key(key)) if key == "length" => {
            Value::from(s.chars().count())
        }
        _ => Value::Undefined,
    }
}

/// 嚴格相等比較：內容相同但身分不同的物件視為已變更
pub fn strict_identity(old: &Value, new: &Value) -> bool {
    old.strict_equals(new)
}

/// 預設取值策略
pub fn default_get_value() -> GetValue {
    Rc::new(resolve_path)
}

/// 預設比較策略
pub fn default_is_unchanged() -> IsUnchanged {
    Rc::new(strict_identity)
}

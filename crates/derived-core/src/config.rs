//! 衍生屬性設定

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::object::Object;
use crate::value::Value;
use crate::{DerivedError, Result};

/// 計算函式：`this` 為正在讀取的宿主物件，參數依宣告順序傳入依賴值
pub type Getter = Rc<dyn Fn(&Object, &[Value]) -> Value>;

/// 依賴取值策略：`(宿主物件, 依賴名稱) -> 值`
pub type GetValue = Rc<dyn Fn(&Object, &str) -> Value>;

/// 比較策略：`(舊值, 新值) -> 是否未變更`
pub type IsUnchanged = Rc<dyn Fn(&Value, &Value) -> bool>;

/// 可序列化的設定部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivedOptions {
    /// 監看的依賴路徑
    pub dependencies: Vec<String>,

    /// 是否快取計算結果
    pub cache_enabled: bool,
}

impl Default for DerivedOptions {
    fn default() -> Self {
        Self {
            dependencies: Vec::new(),
            cache_enabled: true,
        }
    }
}

/// 衍生屬性設定
///
/// 由工廠在建立存取器前驗證；驗證失敗不會產生任何存取器。
#[derive(Clone)]
pub struct DerivedConfig {
    /// 宿主物件（僅用於提前驗證，讀取時以實際的 `this` 為準）
    pub host: Option<Object>,

    /// 是否要求提供宿主物件
    pub host_required: bool,

    /// 計算函式
    pub getter: Option<Getter>,

    /// 監看的依賴路徑（宣告順序）
    pub dependencies: Vec<String>,

    /// 是否快取
    pub cache_enabled: bool,

    /// 自訂取值策略，`None` 使用路徑與方法感知的預設策略
    pub get_value: Option<GetValue>,

    /// 自訂比較策略，`None` 使用嚴格相等
    pub is_unchanged: Option<IsUnchanged>,
}

impl DerivedConfig {
    /// 創建空設定（快取預設開啟）
    pub fn new() -> Self {
        Self {
            host: None,
            host_required: false,
            getter: None,
            dependencies: Vec::new(),
            cache_enabled: true,
            get_value: None,
            is_unchanged: None,
        }
    }

    /// 建構器模式：設置計算函式
    pub fn with_getter(mut self, getter: impl Fn(&Object, &[Value]) -> Value + 'static) -> Self {
        self.getter = Some(Rc::new(getter));
        self
    }

    /// 建構器模式：追加依賴（多次呼叫會依序攤平）
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// 建構器模式：追加單一依賴
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// 建構器模式：設置是否快取
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// 建構器模式：設置取值策略
    pub fn with_get_value(mut self, get_value: impl Fn(&Object, &str) -> Value + 'static) -> Self {
        self.get_value = Some(Rc::new(get_value));
        self
    }

    /// 建構器模式：設置比較策略，參數順序為 `(舊值, 新值)`
    pub fn with_is_unchanged(
        mut self,
        is_unchanged: impl Fn(&Value, &Value) -> bool + 'static,
    ) -> Self {
        self.is_unchanged = Some(Rc::new(is_unchanged));
        self
    }

    /// 建構器模式：設置宿主物件
    pub fn with_host(mut self, host: Object) -> Self {
        self.host = Some(host);
        self
    }

    /// 建構器模式：要求提供宿主物件
    pub fn require_host(mut self) -> Self {
        self.host_required = true;
        self
    }

    /// 建構器模式：套用可序列化設定
    pub fn with_options(mut self, options: DerivedOptions) -> Self {
        self.dependencies.extend(options.dependencies);
        self.cache_enabled = options.cache_enabled;
        self
    }

    /// 取出可序列化部分
    pub fn options(&self) -> DerivedOptions {
        DerivedOptions {
            dependencies: self.dependencies.clone(),
            cache_enabled: self.cache_enabled,
        }
    }

    /// 驗證設定
    pub fn validate(&self) -> Result<()> {
        if self.getter.is_none() {
            return Err(DerivedError::invalid_config(
                "getter",
                "expected `getter` to be a function but got undefined",
            ));
        }

        if self.host_required && self.host.is_none() {
            return Err(DerivedError::invalid_config(
                "obj",
                "expected `obj` to be an object",
            ));
        }

        Ok(())
    }

    /// 由動態設定物件建立
    ///
    /// 可辨識的鍵：`getter`、`obj`／`host`（必填）、`dependencies`、
    /// `cache`／`cacheEnabled`、`getMethod`／`getValue`、
    /// `compareMethod`／`isUnchanged`。型別錯誤回傳 `InvalidConfig`。
    pub fn from_object(options: &Object) -> Result<Self> {
        let getter = match options.get("getter") {
            Value::Function(function) => function,
            other => {
                return Err(DerivedError::invalid_config(
                    "getter",
                    format!(
                        "expected `getter` to be a function but got {}",
                        other.type_name()
                    ),
                ));
            }
        };

        let (host_key, host) = first_defined(options, &["obj", "host"]);
        let host = match host {
            Value::Object(object) => object,
            other => {
                return Err(DerivedError::invalid_config(
                    host_key,
                    format!("expected `{}` to be an object but got {}", host_key, other.type_name()),
                ));
            }
        };

        let (get_value_key, get_value) = first_defined(options, &["getMethod", "getValue"]);
        let get_value: Option<GetValue> = match get_value {
            Value::Undefined => None,
            Value::Function(function) => Some(Rc::new(move |host: &Object, name: &str| {
                let this = Value::Object(host.clone());
                function.call(&this, &[this.clone(), Value::from(name)])
            })),
            other => {
                return Err(DerivedError::invalid_config(
                    get_value_key,
                    format!(
                        "expected `{}` to be a function but got {}",
                        get_value_key,
                        other.type_name()
                    ),
                ));
            }
        };

        let (is_unchanged_key, is_unchanged) =
            first_defined(options, &["compareMethod", "isUnchanged"]);
        let is_unchanged: Option<IsUnchanged> = match is_unchanged {
            Value::Undefined => None,
            Value::Function(function) => Some(Rc::new(move |old: &Value, new: &Value| {
                function
                    .call(&Value::Undefined, &[old.clone(), new.clone()])
                    .truthy()
            })),
            other => {
                return Err(DerivedError::invalid_config(
                    is_unchanged_key,
                    format!(
                        "expected `{}` to be a function but got {}",
                        is_unchanged_key,
                        other.type_name()
                    ),
                ));
            }
        };

        let (_, cache) = first_defined(options, &["cache", "cacheEnabled"]);
        let cache_enabled = match cache {
            Value::Undefined => true,
            other => other.truthy(),
        };

        let getter: Getter = Rc::new(move |this: &Object, args: &[Value]| {
            getter.call(&Value::Object(this.clone()), args)
        });

        Ok(Self {
            host: Some(host),
            host_required: true,
            getter: Some(getter),
            dependencies: flatten_dependencies(&options.get("dependencies")),
            cache_enabled,
            get_value,
            is_unchanged,
        })
    }
}

impl Default for DerivedConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DerivedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedConfig")
            .field("host", &self.host)
            .field("host_required", &self.host_required)
            .field("has_getter", &self.getter.is_some())
            .field("dependencies", &self.dependencies)
            .field("cache_enabled", &self.cache_enabled)
            .field("custom_get_value", &self.get_value.is_some())
            .field("custom_is_unchanged", &self.is_unchanged.is_some())
            .finish()
    }
}

/// 依序找出第一個有值的鍵，皆無值時回傳第一個鍵名
fn first_defined(options: &Object, keys: &[&'static str]) -> (&'static str, Value) {
    for &key in keys {
        let value = options.get(key);
        if !value.is_undefined() {
            return (key, value);
        }
    }
    (keys[0], Value::Undefined)
}

/// 依賴清單攤平一層；`undefined`／`null` 視為空清單
fn flatten_dependencies(value: &Value) -> Vec<String> {
    match value {
        Value::Undefined | Value::Null => Vec::new(),
        Value::Array(items) => {
            let mut dependencies = Vec::new();
            for item in items.borrow().iter() {
                match item {
                    Value::Array(nested) => dependencies
                        .extend(nested.borrow().iter().map(Value::to_property_key)),
                    other => dependencies.push(other.to_property_key()),
                }
            }
            dependencies
        }
        other => vec![other.to_property_key()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use rstest::rstest;
    use serde_json::json;

    fn getter() -> Value {
        Value::from(Function::new(0, |_this, _args| Value::Undefined))
    }

    fn options(entries: Vec<(&str, Value)>) -> Object {
        let object = Object::new();
        for (key, value) in entries {
            object.set(key, value).unwrap();
        }
        object
    }

    fn field_of(err: DerivedError) -> &'static str {
        match err {
            DerivedError::InvalidConfig { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = DerivedConfig::new();

        assert!(config.cache_enabled);
        assert!(config.dependencies.is_empty());
        assert!(config.get_value.is_none());
        assert!(config.is_unchanged.is_none());
        assert!(!config.host_required);
    }

    #[test]
    fn test_builder_flattens_dependencies() {
        let config = DerivedConfig::new()
            .with_dependencies(["dirname", "ext"])
            .with_dependencies(vec!["name.first".to_string()])
            .with_dependency("stem")
            .with_cache(false);

        assert_eq!(
            config.dependencies,
            vec!["dirname", "ext", "name.first", "stem"]
        );
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_validate_missing_getter() {
        let err = DerivedConfig::new().validate().unwrap_err();

        assert_eq!(field_of(err.clone()), "getter");
        assert!(err.to_string().contains("getter"));
    }

    #[test]
    fn test_validate_required_host() {
        let config = DerivedConfig::new()
            .with_getter(|_this, _args| Value::Undefined)
            .require_host();

        let err = config.clone().validate().unwrap_err();
        assert!(err.to_string().contains("obj"));

        assert!(config.with_host(Object::new()).validate().is_ok());
    }

    #[test]
    fn test_options_from_json() {
        let options: DerivedOptions =
            serde_json::from_str(r#"{ "dependencies": ["dirname"] }"#).unwrap();
        assert_eq!(options.dependencies, vec!["dirname"]);
        assert!(options.cache_enabled);

        let options: DerivedOptions = serde_json::from_value(json!({ "cacheEnabled": false })).unwrap();
        assert!(options.dependencies.is_empty());
        assert!(!options.cache_enabled);

        let config = DerivedConfig::new().with_options(options.clone());
        assert_eq!(config.options(), options);
    }

    #[rstest]
    #[case::missing_getter(vec![], "getter")]
    #[case::string_getter(vec![("getter", Value::from(""))], "getter")]
    #[case::missing_obj(vec![("getter", getter())], "obj")]
    #[case::string_obj(vec![("getter", getter()), ("obj", Value::from(""))], "obj")]
    #[case::numeric_get_method(
        vec![("getter", getter()), ("obj", Value::from(Object::new())), ("getMethod", Value::from(1))],
        "getMethod"
    )]
    #[case::numeric_get_value(
        vec![("getter", getter()), ("host", Value::from(Object::new())), ("getValue", Value::from(true))],
        "getValue"
    )]
    #[case::string_compare_method(
        vec![("getter", getter()), ("obj", Value::from(Object::new())), ("compareMethod", Value::from("==="))],
        "compareMethod"
    )]
    fn test_from_object_rejects(#[case] entries: Vec<(&str, Value)>, #[case] field: &str) {
        let err = DerivedConfig::from_object(&options(entries)).unwrap_err();

        assert!(err.to_string().contains(field), "{err}");
        assert_eq!(field_of(err), field);
    }

    #[test]
    fn test_from_object_accepts() {
        let host = Object::from_json(json!({ "dirname": "views" })).unwrap();
        let config = DerivedConfig::from_object(&options(vec![
            ("getter", getter()),
            ("obj", Value::from(host.clone())),
            ("getMethod", Value::from(Function::new(2, |_this, args| args[1].clone()))),
        ]))
        .unwrap();

        assert!(config.host.unwrap().ptr_eq(&host));
        assert!(config.cache_enabled);
        assert!(config.dependencies.is_empty());

        let get_value = config.get_value.unwrap();
        assert_eq!(get_value(&Object::new(), "dirname"), Value::from("dirname"));
    }

    #[test]
    fn test_from_object_dependencies_and_cache() {
        let dependencies = Value::from(json!(["dirname", ["name.first", "ext"], 3]));
        let config = DerivedConfig::from_object(&options(vec![
            ("getter", getter()),
            ("obj", Value::from(Object::new())),
            ("dependencies", dependencies),
            ("cache", Value::from(false)),
        ]))
        .unwrap();

        assert_eq!(config.dependencies, vec!["dirname", "name.first", "ext", "3"]);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_from_object_compare_method_argument_order() {
        let compare = Function::new(2, |_this, args| {
            let old = args[0].as_number().unwrap_or(0.0);
            let new = args[1].as_number().unwrap_or(0.0);
            Value::from(new == old + 1.0)
        });
        let config = DerivedConfig::from_object(&options(vec![
            ("getter", getter()),
            ("obj", Value::from(Object::new())),
            ("compareMethod", Value::from(compare)),
        ]))
        .unwrap();

        let is_unchanged = config.is_unchanged.unwrap();
        assert!(is_unchanged(&Value::from(1), &Value::from(2)));
        assert!(!is_unchanged(&Value::from(2), &Value::from(1)));
    }
}

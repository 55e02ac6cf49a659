//! 可呼叫值

use std::fmt;
use std::rc::Rc;

use crate::value::Value;

type Callable = dyn Fn(&Value, &[Value]) -> Value;

/// 函式值
///
/// 以 `this` 綁定與位置參數呼叫。`arity` 為必要參數數量，
/// 預設的依賴取值策略只會自動呼叫 `arity == 0` 的函式。
#[derive(Clone)]
pub struct Function {
    arity: usize,
    callable: Rc<Callable>,
}

impl Function {
    /// 創建新的函式值
    pub fn new(arity: usize, callable: impl Fn(&Value, &[Value]) -> Value + 'static) -> Self {
        Self {
            arity,
            callable: Rc::new(callable),
        }
    }

    /// 無參數方法，只接收 `this`
    pub fn method(callable: impl Fn(&Value) -> Value + 'static) -> Self {
        Self::new(0, move |this, _args| callable(this))
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// 呼叫函式
    pub fn call(&self, this: &Value, args: &[Value]) -> Value {
        (self.callable)(this, args)
    }

    /// 是否為同一個函式
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.callable, &other.callable)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

//! JavaScript runtime implementation using Boa engine

use super::JsValue;
use crate::utils::error::JsError;
use crate::utils::Result;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsString, JsValue as BoaJsValue, NativeFunction, Source};
use std::collections::HashMap;

/// JavaScript runtime context using Boa engine
///
/// One runtime backs one loaded document. Dropping it discards every
/// global the document or an injected agent installed.
pub struct JsRuntime {
    context: Context,
}

impl JsRuntime {
    /// Create a new JavaScript runtime with only the language builtins
    pub fn new() -> Self {
        Self {
            context: Context::default(),
        }
    }

    /// Execute JavaScript code
    pub fn execute(&mut self, code: &str) -> Result<JsValue> {
        if code.trim().is_empty() {
            return Ok(JsValue::Undefined);
        }

        let source = Source::from_bytes(code);
        match self.context.eval(source) {
            Ok(result) => Ok(Self::convert_boa_value(&result, &mut self.context)),
            Err(e) => Err(JsError::Execution(e.to_string()).into()),
        }
    }

    /// Register a native function as a global
    pub fn register_global_callable(
        &mut self,
        name: &str,
        length: usize,
        function: NativeFunction,
    ) -> Result<()> {
        self.context
            .register_global_builtin_callable(JsString::from(name), length, function)
            .map_err(|e| JsError::Registration(format!("{}: {}", name, e)).into())
    }

    /// Register a global property
    pub fn register_global_property(&mut self, name: &str, value: impl Into<BoaJsValue>) -> Result<()> {
        self.context
            .register_global_property(JsString::from(name), value, Attribute::all())
            .map_err(|e| JsError::Registration(format!("{}: {}", name, e)).into())
    }

    /// Whether a global binding with this name exists and is not undefined
    pub fn has_global(&mut self, name: &str) -> bool {
        let global = self.context.global_object();
        global
            .get(JsString::from(name), &mut self.context)
            .map(|v| !v.is_undefined())
            .unwrap_or(false)
    }

    /// Access the underlying Boa context
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Convert Boa JsValue to our JsValue
    fn convert_boa_value(value: &BoaJsValue, context: &mut Context) -> JsValue {
        if value.is_undefined() {
            JsValue::Undefined
        } else if value.is_null() {
            JsValue::Null
        } else if let Some(b) = value.as_boolean() {
            JsValue::Boolean(b)
        } else if let Some(n) = value.as_number() {
            JsValue::Number(n)
        } else if let Some(s) = value.as_string() {
            JsValue::String(s.to_std_string_escaped())
        } else if let Some(object) = value.as_object() {
            if object.is_array() {
                let length = object
                    .get(JsString::from("length"), context)
                    .ok()
                    .and_then(|l| l.as_number())
                    .unwrap_or(0.0);
                let mut items = Vec::new();
                for i in 0..length as u32 {
                    if let Ok(item) = object.get(i, context) {
                        items.push(Self::convert_boa_value(&item, context));
                    }
                }
                return JsValue::Array(items);
            }
            JsValue::Object(HashMap::new())
        } else {
            JsValue::Undefined
        }
    }
}

impl Default for JsRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_numbers() {
        let mut runtime = JsRuntime::new();
        assert_eq!(runtime.execute("42").unwrap(), JsValue::Number(42.0));
        assert_eq!(runtime.execute("2 + 2").unwrap(), JsValue::Number(4.0));
    }

    #[test]
    fn test_eval_strings() {
        let mut runtime = JsRuntime::new();
        assert_eq!(
            runtime.execute("\"hello\" + \" world\"").unwrap(),
            JsValue::String("hello world".to_string())
        );
    }

    #[test]
    fn test_globals_persist() {
        let mut runtime = JsRuntime::new();
        runtime.execute("var x = 10;").unwrap();
        assert_eq!(runtime.execute("x + 5").unwrap(), JsValue::Number(15.0));
        assert!(runtime.has_global("x"));
        assert!(!runtime.has_global("y"));
    }

    #[test]
    fn test_eval_arrays() {
        let mut runtime = JsRuntime::new();
        let result = runtime.execute("[1, 'two', null]").unwrap();
        assert_eq!(
            result,
            JsValue::Array(vec![
                JsValue::Number(1.0),
                JsValue::String("two".into()),
                JsValue::Null
            ])
        );
    }

    #[test]
    fn test_execution_error() {
        let mut runtime = JsRuntime::new();
        let err = runtime.execute("undefinedVar.x").unwrap_err();
        assert!(err.to_string().contains("undefinedVar"));
    }

    #[test]
    fn test_empty_code() {
        let mut runtime = JsRuntime::new();
        assert_eq!(runtime.execute("   ").unwrap(), JsValue::Undefined);
    }
}

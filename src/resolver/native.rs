//! Callables backed by statically compiled Rust closures.

use super::{Call, InvocationError, Outcome, Probe, Resolver, Session, Source, HOOK_ARITY};
use crate::builder::CompileError;
use crate::core::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Callback = Arc<dyn Fn(&str, &str, &Value) -> Outcome + Send + Sync>;

#[derive(Clone)]
enum Export {
    Function {
        /// `None` for variadic callables.
        arity: Option<usize>,
        callback: Callback,
    },
    Constant(Value),
}

/// Named set of native callables and constants.
///
/// Closures must be `Fn + Send + Sync`, so a module is reentrant and every run
/// can share it without further isolation.
///
/// # Example
///
/// ```rust
/// use statescript::resolver::{NativeModule, Outcome};
///
/// let module = NativeModule::new()
///     .function("truthy", |_, _, v| Outcome::replace(v.is_truthy()))
///     .function("shout", |src, dst, v| {
///         Outcome::replace(format!("{src} -> {dst}: {v}"))
///     })
///     .constant("limits", vec![1, 2, 3]);
///
/// assert!(module.contains("truthy"));
/// assert_eq!(
///     module.constant_value("limits").and_then(|v| v.as_array()).map(|items| items.len()),
///     Some(3)
/// );
/// ```
#[derive(Clone, Default)]
pub struct NativeModule {
    exports: HashMap<String, Export>,
}

impl NativeModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a hook taking `(src, dst, value)`.
    pub fn function<F>(self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str, &str, &Value) -> Outcome + Send + Sync + 'static,
    {
        self.function_with_arity(name, HOOK_ARITY, callback)
    }

    /// Export a callable that declares a different parameter count.
    ///
    /// Validation rejects it when referenced by a hook unless `arity` is 3,
    /// and an unvalidated machine fails when it tries to call it.
    pub fn function_with_arity<F>(mut self, name: impl Into<String>, arity: usize, callback: F) -> Self
    where
        F: Fn(&str, &str, &Value) -> Outcome + Send + Sync + 'static,
    {
        self.exports.insert(
            name.into(),
            Export::Function {
                arity: Some(arity),
                callback: Arc::new(callback),
            },
        );
        self
    }

    /// Export a builtin-style callable with no fixed parameter list.
    pub fn variadic<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str, &str, &Value) -> Outcome + Send + Sync + 'static,
    {
        self.exports.insert(
            name.into(),
            Export::Function {
                arity: None,
                callback: Arc::new(callback),
            },
        );
        self
    }

    /// Export plain data under `name`.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exports.insert(name.into(), Export::Constant(value.into()));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    /// Data exported with [`constant`](Self::constant), if `name` is one.
    ///
    /// Hooks cannot call a constant, but host code can read it back, e.g. to
    /// share configuration between the module and its callbacks.
    pub fn constant_value(&self, name: &str) -> Option<&Value> {
        match self.exports.get(name) {
            Some(Export::Constant(value)) => Some(value),
            _ => None,
        }
    }

    fn call(&self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
        let callback = match self.exports.get(call.function) {
            None => return Err(InvocationError::NotFound(call.function.to_string())),
            Some(Export::Constant(_)) => {
                return Err(InvocationError::NotCallable(call.function.to_string()))
            }
            Some(Export::Function { arity, callback }) => match arity {
                Some(n) if *n != HOOK_ARITY => {
                    return Err(InvocationError::WrongArity {
                        name: call.function.to_string(),
                        want: *n,
                        got: HOOK_ARITY,
                    })
                }
                _ => callback,
            },
        };

        catch_unwind(AssertUnwindSafe(|| callback(call.src, call.dst, call.value))).map_err(
            |_| InvocationError::Panicked {
                function: call.function.to_string(),
            },
        )
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("NativeModule").field("exports", &names).finish()
    }
}

struct NativeSession<'a> {
    module: &'a NativeModule,
}

impl Session for NativeSession<'_> {
    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
        self.module.call(call)
    }
}

impl Resolver for NativeModule {
    fn probe(&self, name: &str) -> Probe {
        match self.exports.get(name) {
            None => Probe::NotFound,
            Some(Export::Constant(_)) => Probe::NotCallable,
            Some(Export::Function { arity: Some(n), .. }) => Probe::Arity(*n),
            Some(Export::Function { arity: None, .. }) => Probe::Variadic,
        }
    }

    fn session(&self) -> Result<Box<dyn Session + '_>, InvocationError> {
        Ok(Box::new(NativeSession { module: self }))
    }
}

impl Source for NativeModule {
    type Program = NativeModule;

    fn load(&self) -> Result<NativeModule, CompileError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> NativeModule {
        NativeModule::new()
            .function("fn1", |_, _, _| Outcome::Unchanged)
            .function("fn2", |_, _, _| Outcome::replace("foobar"))
            .function_with_arity("fn3", 2, |_, _, _| Outcome::Unchanged)
            .variadic("printf", |_, _, _| Outcome::Unchanged)
            .function("boom", |_, _, _| panic!("callback bug"))
            .constant("foo", vec![1, 2, 3])
    }

    fn invoke(module: &NativeModule, function: &str) -> Result<Outcome, InvocationError> {
        let value = Value::Int(123);
        let mut session = module.session().unwrap();
        session.invoke(&Call {
            function,
            src: "s1",
            dst: "s2",
            value: &value,
        })
    }

    #[test]
    fn probe_reports_export_shape() {
        let m = module();
        assert_eq!(m.probe("fn1"), Probe::Arity(3));
        assert_eq!(m.probe("fn3"), Probe::Arity(2));
        assert_eq!(m.probe("printf"), Probe::Variadic);
        assert_eq!(m.probe("foo"), Probe::NotCallable);
        assert_eq!(m.probe("fn4"), Probe::NotFound);
    }

    #[test]
    fn invoke_passes_arguments_through() {
        let m = NativeModule::new().function("echo", |src, dst, v| {
            Outcome::replace(format!("{src}->{dst}:{v}"))
        });
        assert_eq!(
            invoke(&m, "echo").unwrap(),
            Outcome::replace("s1->s2:123")
        );
    }

    #[test]
    fn invoke_fails_lazily_for_bad_references() {
        let m = module();
        assert_eq!(
            invoke(&m, "fn4"),
            Err(InvocationError::NotFound("fn4".into()))
        );
        assert_eq!(
            invoke(&m, "foo"),
            Err(InvocationError::NotCallable("foo".into()))
        );
        assert!(matches!(
            invoke(&m, "fn3"),
            Err(InvocationError::WrongArity { want: 2, got: 3, .. })
        ));
    }

    #[test]
    fn panicking_callback_becomes_invocation_error() {
        assert_eq!(
            invoke(&module(), "boom"),
            Err(InvocationError::Panicked {
                function: "boom".into()
            })
        );
    }

    #[test]
    fn constants_are_readable_but_not_callable() {
        let m = module();
        assert_eq!(
            m.constant_value("foo"),
            Some(&Value::from(vec![1, 2, 3]))
        );
        assert_eq!(m.constant_value("fn1"), None);
        assert_eq!(m.constant_value("missing"), None);
    }

    #[test]
    fn debug_lists_export_names() {
        let rendered = format!("{:?}", NativeModule::new().constant("b", 1).constant("a", 2));
        assert_eq!(rendered, r#"NativeModule { exports: ["a", "b"] }"#);
    }
}

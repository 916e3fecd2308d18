use std::collections::HashMap;

use crate::value::Value;

/// Name of the local that carries the nearest controller-like object.
pub const CONTROLLER_LOCAL: &str = "controller";

/// Evaluation scope of a template node: a receiver plus named locals.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    self_value: Value,
    locals: HashMap<String, Value>,
}

impl Scope {
    pub fn new(self_value: impl Into<Value>) -> Self {
        Self {
            self_value: self_value.into(),
            locals: HashMap::new(),
        }
    }

    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_local(name, value);
        self
    }

    pub fn with_controller(self, controller: impl Into<Value>) -> Self {
        self.with_local(CONTROLLER_LOCAL, controller)
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.insert(name.into(), value.into());
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn self_value(&self) -> &Value {
        &self.self_value
    }

    pub fn controller(&self) -> Value {
        self.local(CONTROLLER_LOCAL).cloned().unwrap_or_default()
    }
}

/// A positional or named argument as written in the template.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Quoted literal, used as-is.
    Literal(Value),
    /// Bound path, resolved against the scope on every read.
    Path(String),
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Expr::Path(path.into())
    }
}

/// Template-expression evaluator consumed by the binding resolver.
pub trait Hooks {
    /// Resolve a bound path to its current value.
    fn get(&self, scope: &Scope, path: &str) -> Value;

    fn read(&self, scope: &Scope, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(value) => value.clone(),
            Expr::Path(path) => self.get(scope, path),
        }
    }
}

/// Resolves dotted paths: the head is `this`, a local, or a property of
/// `self`; every further segment is a property lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathHooks;

impl Hooks for PathHooks {
    fn get(&self, scope: &Scope, path: &str) -> Value {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let mut current = match head {
            "this" => scope.self_value().clone(),
            name => match scope.local(name) {
                Some(value) => value.clone(),
                None => scope.self_value().get(name),
            },
        };
        for segment in segments {
            current = current.get(segment);
        }
        current
    }
}

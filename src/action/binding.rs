use tracing::debug;

use crate::error::ActionError;
use crate::scope::{Expr, Hooks, Scope};
use crate::value::Value;

use super::gate::AllowList;

/// The resolved `(target, action name, arguments)` triple of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBinding {
    pub target: Value,
    pub action_name: String,
    pub action_args: Vec<Value>,
}

/// Where the `target` option points.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOption {
    /// Written as a string: a path resolved against the scope.
    Path(String),
    /// Anything else, read as-is.
    Value(Expr),
}

/// Named options declared on an action binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOptions {
    pub on: Option<String>,
    pub bubbles: Option<bool>,
    pub prevent_default: Option<bool>,
    pub allowed_keys: Option<AllowList>,
    pub target: Option<TargetOption>,
}

impl ActionOptions {
    pub fn on(mut self, event_name: impl Into<String>) -> Self {
        self.on = Some(event_name.into());
        self
    }

    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = Some(bubbles);
        self
    }

    pub fn prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = Some(prevent_default);
        self
    }

    pub fn allowed_keys(mut self, allowed_keys: AllowList) -> Self {
        self.allowed_keys = Some(allowed_keys);
        self
    }

    pub fn target_path(mut self, path: impl Into<String>) -> Self {
        self.target = Some(TargetOption::Path(path.into()));
        self
    }

    pub fn target_value(mut self, value: impl Into<Value>) -> Self {
        self.target = Some(TargetOption::Value(Expr::Literal(value.into())));
        self
    }

    /// Event to listen for; an unset or empty `on` falls back to `default`.
    pub fn event_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.on
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(default)
    }

    pub fn should_bubble(&self) -> bool {
        self.bubbles.unwrap_or(true)
    }

    pub fn should_prevent_default(&self) -> bool {
        self.prevent_default.unwrap_or(true)
    }

    /// Parse options from the template hash, in declaration order.
    ///
    /// `allowedKeys` and `withKeyCode` are aliases; whichever comes last
    /// wins. Unrecognised keys are ignored.
    pub fn from_hash<I, K>(hash: I) -> Result<Self, ActionError>
    where
        I: IntoIterator<Item = (K, Expr)>,
        K: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, expr) in hash {
            match key.as_ref() {
                "on" => options.on = Some(literal_string("on", expr)?),
                "bubbles" => options.bubbles = Some(literal_bool("bubbles", expr)?),
                "preventDefault" => {
                    options.prevent_default = Some(literal_bool("preventDefault", expr)?)
                }
                "allowedKeys" => options.allowed_keys = Some(allow_list("allowedKeys", expr)?),
                "withKeyCode" => options.allowed_keys = Some(allow_list("withKeyCode", expr)?),
                "target" => {
                    options.target = Some(match expr {
                        Expr::Literal(Value::String(path)) => TargetOption::Path(path),
                        other => TargetOption::Value(other),
                    })
                }
                other => debug!(option = other, "ignoring unknown action option"),
            }
        }
        Ok(options)
    }
}

fn literal_string(name: &'static str, expr: Expr) -> Result<String, ActionError> {
    match expr {
        Expr::Literal(Value::String(value)) => Ok(value),
        _ => Err(ActionError::InvalidOption {
            name,
            expected: "a quoted string",
        }),
    }
}

fn literal_bool(name: &'static str, expr: Expr) -> Result<bool, ActionError> {
    match expr {
        Expr::Literal(Value::Bool(value)) => Ok(value),
        _ => Err(ActionError::InvalidOption {
            name,
            expected: "true or false",
        }),
    }
}

fn allow_list(name: &'static str, expr: Expr) -> Result<AllowList, ActionError> {
    let invalid = || ActionError::InvalidOption {
        name,
        expected: "a list of modifier names",
    };
    match expr {
        Expr::Literal(Value::String(raw)) => raw.parse(),
        Expr::Literal(Value::List(items)) => {
            let keys = items
                .into_iter()
                .map(|item| match item {
                    Value::String(key) => Ok(key),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowList::parse(keys)
        }
        _ => Err(invalid()),
    }
}

/// A full action invocation as written in a template:
/// positional params followed by named options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInvocation {
    pub params: Vec<Expr>,
    pub options: ActionOptions,
}

impl ActionInvocation {
    pub fn new(action_name: impl Into<Value>) -> Self {
        Self {
            params: vec![Expr::Literal(action_name.into())],
            options: ActionOptions::default(),
        }
    }

    /// First param given as a path instead of a quoted name.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            params: vec![Expr::Path(path.into())],
            options: ActionOptions::default(),
        }
    }

    pub fn arg(mut self, arg: Expr) -> Self {
        self.params.push(arg);
        self
    }

    pub fn with_options(mut self, options: ActionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Resolve the binding of one node from its scope and arguments.
///
/// Pure: calling it again after a re-render yields a fresh binding
/// reflecting the current values.
pub fn setup_state<H>(
    hooks: &H,
    scope: &Scope,
    params: &[Expr],
    options: &ActionOptions,
) -> Result<ActionBinding, ActionError>
where
    H: Hooks + ?Sized,
{
    let mut values = params.iter().map(|param| hooks.read(scope, param));
    let action_name = match values.next() {
        Some(Value::String(name)) if !name.is_empty() => name,
        Some(Value::String(_)) => return Err(ActionError::EmptyActionName),
        other => {
            return Err(ActionError::NonStringActionName {
                found: other.as_ref().map_or("undefined", Value::type_name),
            })
        }
    };
    let action_args = values.collect();
    let target = resolve_target(hooks, scope, options.target.as_ref());

    Ok(ActionBinding {
        target,
        action_name,
        action_args,
    })
}

fn resolve_target<H>(hooks: &H, scope: &Scope, target: Option<&TargetOption>) -> Value
where
    H: Hooks + ?Sized,
{
    match target {
        Some(TargetOption::Path(path)) => hooks.get(scope, path),
        Some(TargetOption::Value(expr)) => hooks.read(scope, expr),
        None => {
            let controller = scope.controller();
            if controller.is_truthy() {
                controller
            } else {
                scope.self_value().clone()
            }
        }
    }
}

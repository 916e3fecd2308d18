use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map as JsonMap, Value as JsonValue};

/// A method exposed by a target under the action's name.
pub type ActionMethod = Rc<dyn Fn(&[Value]) -> anyhow::Result<()>>;

/// Shared handle to an object that can receive actions.
pub type TargetRef = Rc<dyn ActionTarget>;

type SendFn = Box<dyn Fn(&str, &[Value]) -> anyhow::Result<()>>;

/// Anything a bound template expression can evaluate to.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Object(TargetRef),
}

impl Value {
    pub fn object(target: impl ActionTarget + 'static) -> Self {
        Value::Object(Rc::new(target))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::String(value) => !value.is_empty(),
            Value::List(_) | Value::Object(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&TargetRef> {
        match self {
            Value::Object(target) => Some(target),
            _ => None,
        }
    }

    /// Property lookup; anything but an object yields `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(target) => target.get(key),
            _ => Value::Undefined,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Undefined | Value::Null => JsonValue::Null,
            Value::Bool(value) => JsonValue::Bool(*value),
            Value::Number(value) => serde_json::Number::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(value) => JsonValue::String(value.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(target) => {
                let mut map = JsonMap::new();
                map.insert("object".to_string(), JsonValue::String(target.describe()));
                JsonValue::Object(map)
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(value) => write!(f, "Bool({value})"),
            Value::Number(value) => write!(f, "Number({value})"),
            Value::String(value) => write!(f, "String({value:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(target) => write!(f, "Object({})", target.describe()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Objects compare by identity.
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<TargetRef> for Value {
    fn from(target: TargetRef) -> Self {
        Value::Object(target)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(value) => Value::Bool(value),
            JsonValue::Number(value) => value.as_f64().map(Value::Number).unwrap_or(Value::Null),
            JsonValue::String(value) => Value::String(value),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                let target = ObjectTarget::new("object");
                for (key, value) in map {
                    target.set_property(key, Value::from(value));
                }
                Value::object(target)
            }
        }
    }
}

/// Generic message-send capability: `target.send(name, ...args)`.
pub trait ActionSender {
    fn send(&self, action_name: &str, args: &[Value]) -> anyhow::Result<()>;
}

/// An object an action can be invoked on.
pub trait ActionTarget {
    /// Short label used in diagnostics.
    fn describe(&self) -> String;

    fn sender(&self) -> Option<&dyn ActionSender> {
        None
    }

    fn method(&self, _name: &str) -> Option<ActionMethod> {
        None
    }

    fn get(&self, _key: &str) -> Value {
        Value::Undefined
    }
}

/// How a target will receive a given action, decided once at invocation time.
pub enum Capability<'a> {
    Send(&'a dyn ActionSender),
    NamedMethod(ActionMethod),
    Neither,
}

impl<'a> Capability<'a> {
    pub fn resolve(target: &'a Value, action_name: &str) -> Self {
        let Some(target) = target.as_object() else {
            return Capability::Neither;
        };
        if let Some(sender) = target.sender() {
            return Capability::Send(sender);
        }
        match target.method(action_name) {
            Some(method) => Capability::NamedMethod(method),
            None => Capability::Neither,
        }
    }
}

struct SendHandler(SendFn);

impl ActionSender for SendHandler {
    fn send(&self, action_name: &str, args: &[Value]) -> anyhow::Result<()> {
        (self.0)(action_name, args)
    }
}

/// General purpose target with an optional `send`, named methods and properties.
pub struct ObjectTarget {
    name: String,
    send: Option<SendHandler>,
    methods: HashMap<String, ActionMethod>,
    properties: RefCell<HashMap<String, Value>>,
}

impl ObjectTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            send: None,
            methods: HashMap::new(),
            properties: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_send<F>(mut self, send: F) -> Self
    where
        F: Fn(&str, &[Value]) -> anyhow::Result<()> + 'static,
    {
        self.send = Some(SendHandler(Box::new(send)));
        self
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<()> + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.borrow_mut().insert(key.into(), value.into());
    }
}

impl ActionTarget for ObjectTarget {
    fn describe(&self) -> String {
        format!("<{}>", self.name)
    }

    fn sender(&self) -> Option<&dyn ActionSender> {
        self.send.as_ref().map(|send| send as &dyn ActionSender)
    }

    fn method(&self, name: &str) -> Option<ActionMethod> {
        self.methods.get(name).cloned()
    }

    fn get(&self, key: &str) -> Value {
        self.properties
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined)
    }
}

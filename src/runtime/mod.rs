mod context;
mod error;

pub use context::{Context, DummyContext, SimpleContext};
pub use error::RuntimeError;

use crate::statement::Statement;
use compact_str::{CompactString, CompactStringExt};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const INIT_METHOD: &str = "__init__";
pub const STR_METHOD: &str = "__str__";
pub const EQ_METHOD: &str = "__eq__";
pub const LT_METHOD: &str = "__lt__";
pub const ADD_METHOD: &str = "__add__";

/// A flat mapping from identifier to value. The same type serves as the
/// global scope, the local frame of a method call and an instance's field
/// table.
pub type Closure = HashMap<CompactString, Value>;

/// A method owned by its defining class.
#[derive(Debug)]
pub struct Method {
    pub name: CompactString,
    pub formal_params: Vec<CompactString>,
    /// A `MethodBody` node.
    pub body: Statement,
}

/// A user-defined class with an optional parent.
///
/// Instances hold an `Arc` to their class, so a class structurally outlives
/// every instance derived from it.
#[derive(Debug)]
pub struct Class {
    pub name: CompactString,
    /// Own methods in declaration order.
    pub methods: Vec<Arc<Method>>,
    pub parent: Option<Arc<Class>>,
    /// Flattened name lookup built at construction; child methods shadow
    /// parent methods of the same name.
    method_table: HashMap<CompactString, Arc<Method>>,
}

impl Class {
    pub fn new(name: CompactString, methods: Vec<Method>, parent: Option<Arc<Class>>) -> Self {
        assert!(!name.is_empty(), "Class names are non-empty.");
        let methods: Vec<Arc<Method>> = methods.into_iter().map(Arc::new).collect();
        let mut method_table = match &parent {
            Some(parent) => parent.method_table.clone(),
            None => HashMap::new(),
        };
        for method in &methods {
            method_table.insert(method.name.clone(), method.clone());
        }
        Self {
            name,
            methods,
            parent,
            method_table,
        }
    }

    /// Resolves a method through the inheritance chain.
    pub fn get_method(&self, name: &str) -> Option<&Arc<Method>> {
        self.method_table.get(name)
    }
}

/// A class instance: a reference to its class plus a field table.
#[derive(Debug)]
pub struct Instance {
    pub class: Arc<Class>,
    pub fields: Mutex<Closure>,
}

impl Instance {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            fields: Mutex::new(Closure::new()),
        }
    }

    /// True iff the class chain has a method of this name whose formal
    /// parameter count equals `arity`.
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.class
            .get_method(name)
            .is_some_and(|m| m.formal_params.len() == arity)
    }

    /// Dispatches a method on `instance`. The method body runs in a fresh
    /// closure binding `self` to the instance itself and each formal
    /// parameter to the corresponding argument.
    pub fn call(
        instance: &Arc<Instance>,
        name: &str,
        args: &[Value],
        ctx: &mut dyn Context,
    ) -> Result<Value, RuntimeError> {
        let method = match instance.class.get_method(name) {
            Some(method) if method.formal_params.len() == args.len() => method.clone(),
            _ => {
                return Err(RuntimeError::UnknownMethod {
                    class: instance.class.name.clone(),
                    method: name.into(),
                    arity: args.len(),
                })
            }
        };
        let mut locals = Closure::new();
        locals.insert("self".into(), Value::Instance(instance.clone()));
        for (param, arg) in method.formal_params.iter().zip(args) {
            locals.insert(param.clone(), arg.clone());
        }
        Ok(method.body.execute(&mut locals, ctx)?.into_value())
    }
}

/// A runtime value. `Value::None` is the unique representation of `None`;
/// cloning a `Class` or `Instance` value aliases the same object.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Number(i64),
    String(CompactString),
    Bool(bool),
    Class(Arc<Class>),
    Instance(Arc<Instance>),
}

impl Value {
    /// Truthiness: a non-zero number, a non-empty string or `True`.
    /// Everything else, classes and instances included, is false.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Number(value) => *value != 0,
            Value::String(value) => !value.is_empty(),
            Value::Bool(value) => *value,
            _ => false,
        }
    }

    /// Writes the printed form. Instances with a nullary `__str__` delegate
    /// to it; anything else prints its `Display` form.
    pub fn write_to(
        &self,
        out: &mut dyn Write,
        ctx: &mut dyn Context,
    ) -> Result<(), RuntimeError> {
        match self {
            Value::Instance(instance) if instance.has_method(STR_METHOD, 0) => {
                let rendered = Instance::call(instance, STR_METHOD, &[], ctx)?;
                rendered.write_to(out, ctx)
            }
            other => write!(out, "{other}").map_err(|e| RuntimeError::Io(e.to_string())),
        }
    }
}

// Whole-number arithmetic
impl Value {
    pub fn subtract(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs - rhs)),
            (lhs, rhs) => Err(RuntimeError::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs * rhs)),
            (lhs, rhs) => Err(RuntimeError::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value, RuntimeError> {
        match (self, other) {
            (Value::Number(_), Value::Number(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs / rhs)),
            (lhs, rhs) => Err(RuntimeError::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{}", if *value { "True" } else { "False" }),
            Value::Class(class) => write!(f, "Class {}", class.name),
            Value::Instance(instance) => {
                write!(
                    f,
                    "<{} object at {:p}>",
                    instance.class.name,
                    Arc::as_ptr(instance)
                )
            }
        }
    }
}

/// number + number, string + string, or `__add__` dispatch when the left
/// operand is an instance.
pub fn add(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String([a, b].concat_compact())),
        (Value::Instance(instance), _) if instance.has_method(ADD_METHOD, 1) => {
            Instance::call(instance, ADD_METHOD, std::slice::from_ref(rhs), ctx)
        }
        _ => Err(RuntimeError::NonAddable(lhs.clone(), rhs.clone())),
    }
}

/// Scalar equality for numbers, strings and bools, `None == None`, and
/// `__eq__` dispatch for instances. The magic method must return a `Bool`.
pub fn equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> Result<bool, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(a == b),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::None, Value::None) => Ok(true),
        (Value::Instance(instance), _) if instance.has_method(EQ_METHOD, 1) => {
            dispatch_comparison(instance, EQ_METHOD, rhs, ctx)
        }
        _ => Err(RuntimeError::Incomparable(lhs.clone(), rhs.clone())),
    }
}

/// Scalar ordering for numbers, strings and bools, and `__lt__` dispatch for
/// instances.
pub fn less(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> Result<bool, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(a < b),
        (Value::String(a), Value::String(b)) => Ok(a < b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a < b),
        (Value::Instance(instance), _) if instance.has_method(LT_METHOD, 1) => {
            dispatch_comparison(instance, LT_METHOD, rhs, ctx)
        }
        _ => Err(RuntimeError::Incomparable(lhs.clone(), rhs.clone())),
    }
}

fn dispatch_comparison(
    instance: &Arc<Instance>,
    method: &'static str,
    rhs: &Value,
    ctx: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    match Instance::call(instance, method, std::slice::from_ref(rhs), ctx)? {
        Value::Bool(value) => Ok(value),
        value => Err(RuntimeError::NonBoolComparison { method, value }),
    }
}

pub fn not_equal(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, ctx)?)
}

pub fn greater(lhs: &Value, rhs: &Value, ctx: &mut dyn Context) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, ctx)? && !equal(lhs, rhs, ctx)?)
}

pub fn less_or_equal(
    lhs: &Value,
    rhs: &Value,
    ctx: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    Ok(!greater(lhs, rhs, ctx)?)
}

pub fn greater_or_equal(
    lhs: &Value,
    rhs: &Value,
    ctx: &mut dyn Context,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, ctx)?)
}

/// Names one of the comparison operations above; carried by comparison AST
/// nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparator {
    pub fn compare(
        &self,
        lhs: &Value,
        rhs: &Value,
        ctx: &mut dyn Context,
    ) -> Result<bool, RuntimeError> {
        match self {
            Comparator::Equal => equal(lhs, rhs, ctx),
            Comparator::NotEqual => not_equal(lhs, rhs, ctx),
            Comparator::Less => less(lhs, rhs, ctx),
            Comparator::LessOrEqual => less_or_equal(lhs, rhs, ctx),
            Comparator::Greater => greater(lhs, rhs, ctx),
            Comparator::GreaterOrEqual => greater_or_equal(lhs, rhs, ctx),
        }
    }
}

use super::Value;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeError {
    #[error("Undefined name: {0}")]
    UndefinedName(CompactString),
    #[error("Undefined field {field} on {class} instance")]
    UndefinedField {
        class: CompactString,
        field: CompactString,
    },
    #[error("Expected two numbers but got {0} and {1}")]
    NonNumerics(Value, Value),
    #[error("Expected two numbers or two strings but got {0} and {1}")]
    NonAddable(Value, Value),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Cannot compare {0} and {1}")]
    Incomparable(Value, Value),
    #[error("Expected a class instance but got {0}")]
    NonInstance(Value),
    #[error("Class {class} has no method {method} taking {arity} argument(s)")]
    UnknownMethod {
        class: CompactString,
        method: CompactString,
        arity: usize,
    },
    #[error("{method} must return a Bool but returned {value}")]
    NonBoolComparison {
        method: &'static str,
        value: Value,
    },
    #[error("Failed to write output: {0}")]
    Io(String),
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedName(_) => "RT001",
            RuntimeError::UndefinedField { .. } => "RT002",
            RuntimeError::NonNumerics(_, _) => "RT003",
            RuntimeError::NonAddable(_, _) => "RT004",
            RuntimeError::DivisionByZero => "RT005",
            RuntimeError::Incomparable(_, _) => "RT006",
            RuntimeError::NonInstance(_) => "RT007",
            RuntimeError::UnknownMethod { .. } => "RT008",
            RuntimeError::NonBoolComparison { .. } => "RT009",
            RuntimeError::Io(_) => "RT010",
        }
    }
}

use crate::runtime::{
    self, Class, Closure, Comparator, Context, Instance, RuntimeError, Value, INIT_METHOD,
};
use compact_str::CompactString;
use std::sync::Arc;

/// Result of executing a node: either a normal value or a `return` signal
/// travelling outwards to the nearest enclosing `MethodBody`.
#[derive(Debug)]
pub enum Flow {
    Value(Value),
    Return(Value),
}

impl Flow {
    /// The carried value, whichever way the node completed.
    pub fn into_value(self) -> Value {
        match self {
            Flow::Value(value) | Flow::Return(value) => value,
        }
    }
}

/// An executable AST node. Statements and expressions share one node set;
/// expression nodes always complete with `Flow::Value`.
#[derive(Debug)]
pub enum Statement {
    NumericConst(i64),
    StringConst(CompactString),
    BoolConst(bool),
    None,
    /// A dotted read `id1.id2.…`: the first identifier resolves in the
    /// scope, each subsequent one in the field table of the instance reached
    /// so far.
    VariableValue { dotted_ids: Vec<CompactString> },
    Assignment {
        var: CompactString,
        rv: Box<Statement>,
    },
    FieldAssignment {
        object: Box<Statement>,
        field: CompactString,
        rv: Box<Statement>,
    },
    Print { args: Vec<Statement> },
    MethodCall {
        object: Box<Statement>,
        method: CompactString,
        args: Vec<Statement>,
    },
    Stringify { argument: Box<Statement> },
    Add {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Sub {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Mult {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Div {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    /// Both operands are always evaluated; the result is a fresh `Bool`.
    Or {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    And {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Not { argument: Box<Statement> },
    Comparison {
        cmp: Comparator,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    NewInstance {
        class: Arc<Class>,
        args: Vec<Statement>,
    },
    Compound { statements: Vec<Statement> },
    /// Wraps a method's body and intercepts the `Return` signal.
    MethodBody { body: Box<Statement> },
    Return { statement: Box<Statement> },
    IfElse {
        condition: Box<Statement>,
        if_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },
    ClassDefinition { class: Arc<Class> },
}

impl Statement {
    pub fn execute(
        &self,
        closure: &mut Closure,
        ctx: &mut dyn Context,
    ) -> Result<Flow, RuntimeError> {
        let result = match self {
            Statement::NumericConst(value) => Flow::Value(Value::Number(*value)),
            Statement::StringConst(value) => Flow::Value(Value::String(value.clone())),
            Statement::BoolConst(value) => Flow::Value(Value::Bool(*value)),
            Statement::None => Flow::Value(Value::None),
            Statement::VariableValue { dotted_ids } => {
                Flow::Value(read_dotted(dotted_ids, closure)?)
            }
            Statement::Assignment { var, rv } => {
                let value = rv.evaluate(closure, ctx)?;
                closure.insert(var.clone(), value.clone());
                Flow::Value(value)
            }
            Statement::FieldAssignment { object, field, rv } => {
                let target = object.evaluate(closure, ctx)?;
                let Value::Instance(instance) = target else {
                    return Err(RuntimeError::NonInstance(target));
                };
                let value = rv.evaluate(closure, ctx)?;
                instance
                    .fields
                    .lock()
                    .unwrap()
                    .insert(field.clone(), value.clone());
                Flow::Value(value)
            }
            Statement::Print { args } => Flow::Value(execute_print(args, closure, ctx)?),
            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let target = object.evaluate(closure, ctx)?;
                let Value::Instance(instance) = target else {
                    return Err(RuntimeError::NonInstance(target));
                };
                let mut actual = Vec::with_capacity(args.len());
                for arg in args {
                    actual.push(arg.evaluate(closure, ctx)?);
                }
                Flow::Value(Instance::call(&instance, method, &actual, ctx)?)
            }
            Statement::Stringify { argument } => {
                let value = argument.evaluate(closure, ctx)?;
                let mut buffer = Vec::new();
                value.write_to(&mut buffer, ctx)?;
                Flow::Value(Value::String(CompactString::from_utf8_lossy(&buffer)))
            }
            Statement::Add { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(runtime::add(&lhs, &rhs, ctx)?)
            }
            Statement::Sub { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(lhs.subtract(&rhs)?)
            }
            Statement::Mult { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(lhs.multiply(&rhs)?)
            }
            Statement::Div { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(lhs.divide(&rhs)?)
            }
            Statement::Or { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(Value::Bool(lhs.is_true() || rhs.is_true()))
            }
            Statement::And { lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(Value::Bool(lhs.is_true() && rhs.is_true()))
            }
            Statement::Not { argument } => {
                Flow::Value(Value::Bool(!argument.evaluate(closure, ctx)?.is_true()))
            }
            Statement::Comparison { cmp, lhs, rhs } => {
                let lhs = lhs.evaluate(closure, ctx)?;
                let rhs = rhs.evaluate(closure, ctx)?;
                Flow::Value(Value::Bool(cmp.compare(&lhs, &rhs, ctx)?))
            }
            Statement::NewInstance { class, args } => {
                let instance = Arc::new(Instance::new(class.clone()));
                // Without a matching __init__ the instance is created bare
                // and the arguments are never evaluated.
                if instance.has_method(INIT_METHOD, args.len()) {
                    let mut actual = Vec::with_capacity(args.len());
                    for arg in args {
                        actual.push(arg.evaluate(closure, ctx)?);
                    }
                    Instance::call(&instance, INIT_METHOD, &actual, ctx)?;
                }
                Flow::Value(Value::Instance(instance))
            }
            Statement::Compound { statements } => {
                for statement in statements {
                    if let Flow::Return(value) = statement.execute(closure, ctx)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Flow::Value(Value::None)
            }
            Statement::MethodBody { body } => match body.execute(closure, ctx)? {
                Flow::Return(value) => Flow::Value(value),
                Flow::Value(_) => Flow::Value(Value::None),
            },
            Statement::Return { statement } => Flow::Return(statement.evaluate(closure, ctx)?),
            Statement::IfElse {
                condition,
                if_body,
                else_body,
            } => {
                if condition.evaluate(closure, ctx)?.is_true() {
                    if_body.execute(closure, ctx)?
                } else if let Some(else_body) = else_body {
                    else_body.execute(closure, ctx)?
                } else {
                    Flow::Value(Value::None)
                }
            }
            Statement::ClassDefinition { class } => {
                closure.insert(class.name.clone(), Value::Class(class.clone()));
                Flow::Value(Value::Class(class.clone()))
            }
        };
        Ok(result)
    }

    /// Executes the node in expression position and takes its value.
    pub fn evaluate(
        &self,
        closure: &mut Closure,
        ctx: &mut dyn Context,
    ) -> Result<Value, RuntimeError> {
        Ok(self.execute(closure, ctx)?.into_value())
    }
}

fn read_dotted(dotted_ids: &[CompactString], closure: &Closure) -> Result<Value, RuntimeError> {
    let (first, rest) = dotted_ids
        .split_first()
        .expect("Dotted chains contain at least one identifier.");
    let mut value = closure
        .get(first)
        .cloned()
        .ok_or_else(|| RuntimeError::UndefinedName(first.clone()))?;
    for id in rest {
        let Value::Instance(instance) = value else {
            return Err(RuntimeError::NonInstance(value));
        };
        let field = instance.fields.lock().unwrap().get(id).cloned();
        value = field.ok_or_else(|| RuntimeError::UndefinedField {
            class: instance.class.name.clone(),
            field: id.clone(),
        })?;
    }
    Ok(value)
}

/// Evaluates the arguments left to right and writes their space-joined
/// printed forms followed by a newline. Returns the last evaluated value.
fn execute_print(
    args: &[Statement],
    closure: &mut Closure,
    ctx: &mut dyn Context,
) -> Result<Value, RuntimeError> {
    let mut last = Value::None;
    for (index, arg) in args.iter().enumerate() {
        last = arg.evaluate(closure, ctx)?;
        let mut rendered = Vec::new();
        if index > 0 {
            rendered.push(b' ');
        }
        last.write_to(&mut rendered, ctx)?;
        ctx.output()
            .write_all(&rendered)
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
    }
    ctx.output()
        .write_all(b"\n")
        .map_err(|e| RuntimeError::Io(e.to_string()))?;
    Ok(last)
}

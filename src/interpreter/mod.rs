use crate::parser::Program;
use crate::runtime::{Closure, Context, RuntimeError};
use crate::statement::Flow;

/// Tree-walking driver: executes a program's top-level statements in order
/// against a root scope and a host context.
pub struct Interpreter<C> {
    globals: Closure,
    context: C,
}

impl<C: Context> Interpreter<C> {
    pub fn new(context: C) -> Self {
        Self {
            globals: Closure::new(),
            context,
        }
    }

    /// Runs the program to completion and hands the context back. A
    /// top-level `return` terminates execution early.
    pub fn run(mut self, program: &Program) -> Result<C, RuntimeError> {
        for statement in program.statements() {
            match statement.execute(&mut self.globals, &mut self.context)? {
                Flow::Value(_) => {}
                Flow::Return(_) => break,
            }
        }
        Ok(self.context)
    }
}

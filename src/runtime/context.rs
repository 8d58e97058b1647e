use std::io::Write;

/// Host-provided execution context. The only service the runtime needs from
/// its host is the stream that `print` writes to.
pub trait Context {
    fn output(&mut self) -> &mut dyn Write;
}

/// Collects output in an in-memory buffer. Used by the test suite.
pub struct DummyContext {
    output: Vec<u8>,
}

impl DummyContext {
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    pub fn into_data(self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Context for DummyContext {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

/// Forwards output to a stream supplied by the host.
pub struct SimpleContext<W> {
    output: W,
}

impl<W: Write> SimpleContext<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Context for SimpleContext<W> {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}

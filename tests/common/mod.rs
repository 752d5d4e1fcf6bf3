#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::runner::{self, Diagnostics};
use rox::Interpreter;

/// `Write` sink whose contents stay readable after the interpreter took a
/// boxed clone of it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("interpreter wrote invalid UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fresh interpreter writing into a buffer the test can inspect.
pub fn capturing_interpreter() -> (Interpreter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    (interpreter, buffer)
}

/// Run `source`, returning printed output and the run outcome.
pub fn run(source: &str) -> (String, Result<(), Diagnostics>) {
    let (mut interpreter, buffer) = capturing_interpreter();
    let result = runner::run_source(&mut interpreter, source.as_bytes());
    (buffer.contents(), result)
}

/// Run `source`, which must succeed, and return its output.
pub fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(diagnostics) = result {
        let messages: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        panic!("program failed: {:?}\noutput so far:\n{}", messages, output);
    }
    output
}

/// Run `source`, which must fail, and return output plus the rendered errors.
pub fn run_err(source: &str) -> (String, Vec<String>) {
    let (output, result) = run(source);
    match result {
        Ok(()) => panic!("program unexpectedly succeeded; output:\n{}", output),
        Err(diagnostics) => (
            output,
            diagnostics.iter().map(ToString::to_string).collect(),
        ),
    }
}

/// Expected stdout for a list of printed lines.
pub fn lines(expected: &[&str]) -> String {
    expected.iter().map(|line| format!("{line}\n")).collect()
}

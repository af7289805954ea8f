//! An interpreter for a small LOGO dialect that drives a turtle around a canvas.
//!
//! Programs are submitted one unit of text at a time. Each unit is parsed completely before any of
//! it runs; procedures defined in one unit stay available to the following ones.

pub mod ast;
pub mod canvas;
pub mod context;
pub mod error;
pub mod keyword;
pub mod parse;
pub mod source;
pub mod symbols;
pub mod token;

pub use canvas::{Canvas, CanvasOp, Recorder};
pub use context::{Context, Turtle};
pub use error::Error;
pub use source::Position;

use token::Lexer;

#[derive(Debug)]
pub struct Interpreter {
    lexer: Lexer,
    ctx: Context,
}

impl Interpreter {
    pub fn new(canvas: impl Canvas + 'static) -> Interpreter {
        Interpreter {
            lexer: Lexer::default(),
            ctx: Context::new(canvas),
        }
    }

    /// Parse and run one unit of program text.
    ///
    /// Returns everything that was printed, and the error messages, as `(log, error_log)`.
    /// Both logs are cleared afterwards.
    pub fn submit(&mut self, text: &str) -> (String, String) {
        self.lexer.load(text);
        match parse::parse_unit(&mut self.lexer, &mut self.ctx.functions) {
            Ok(prog) => {
                for statement in &prog {
                    // Top-level `output`s are just ignored.
                    if let Err(e) = statement.exec(&mut self.ctx) {
                        log::debug!("runtime error: {e}");
                        self.ctx.write_error(&e);
                        break;
                    }
                }
            }
            Err(e) => self.ctx.write_error(&e),
        }
        self.ctx.take_logs()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(units: &[&str]) -> (String, String) {
        let mut interp = Interpreter::new(Recorder::default());
        let mut log = String::new();
        let mut errors = String::new();
        for unit in units {
            let (l, e) = interp.submit(unit);
            log += &l;
            errors += &e;
        }
        (log, errors)
    }

    #[test]
    fn runtime_error_keeps_earlier_effects() {
        let mut interp = Interpreter::new(Recorder::default());
        let (log, errors) = interp.submit("make \"a\" 4 print a print 1 / 0 print 7");
        assert_eq!(log, "4\n");
        assert_eq!(errors, "division by zero\n");
        assert_eq!(interp.context().scopes.get("a"), Some(4));
    }

    #[test]
    fn parse_error_runs_nothing() {
        let (log, errors) = run(&["print 1 print (2"]);
        assert_eq!(log, "");
        assert!(errors.starts_with("line 1, column 17:"), "{errors}");
    }

    #[test]
    fn procedures_persist_across_units() {
        let (log, errors) = run(&["to twice n output n * 2 end", "print twice twice 3"]);
        assert_eq!(errors, "");
        assert_eq!(log, "12\n");
    }

    #[test]
    fn failed_redefinition_keeps_old_one() {
        let mut interp = Interpreter::new(Recorder::default());
        interp.submit("to f output 1 end");
        let (_, errors) = interp.submit("to f output 2 end print $");
        assert!(!errors.is_empty());
        assert_eq!(interp.submit("print f"), ("1\n".to_owned(), String::new()));
    }

    #[test]
    fn output_value_feeds_expressions() {
        let (log, _) = run(&[
            "to inner output 5 end",
            "to outer make \"x\" inner print x output x + 1 end",
            "print outer",
        ]);
        assert_eq!(log, "5\n6\n");
    }

    #[test]
    fn output_from_called_statement_stops_caller() {
        let (log, errors) = run(&[
            "to g output 5 end",
            "to f g print 1 end",
            "to h f print 3 output 4 end",
            "f",
            "print h",
        ]);
        assert_eq!(errors, "");
        assert_eq!(log, "5\n");
    }

    #[test]
    fn runaway_recursion_is_an_error() {
        // Unoptimized frames are big; give the full call depth some room.
        let errors = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| run(&["to f f end", "f"]).1)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(errors, "call stack too deep (calling f)\n");
    }

    #[test]
    fn missing_output() {
        let (_, errors) = run(&["to f fd 1 end", "print f + 1"]);
        assert_eq!(errors, "f didn't output a value\n");
    }

    #[test]
    fn scan_reads_from_canvas() {
        let rec = Recorder::with_inputs([42]);
        let mut interp = Interpreter::new(rec.clone());
        assert_eq!(
            interp.submit("scan \"n\" print n * 2"),
            ("84\n".to_owned(), String::new())
        );
        assert_eq!(
            interp.submit("scan n"),
            (
                String::new(),
                "line 1, column 6: no value was provided for n\n".to_owned()
            )
        );
        rec.push_input(3);
        assert_eq!(interp.submit("to g local scan \"v\" output v end print g").0, "3\n");
        assert_eq!(interp.context().scopes.get("v"), None);
    }
}

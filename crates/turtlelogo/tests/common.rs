use std::path::Path;

use turtlelogo::{CanvasOp, Interpreter, Recorder};

#[derive(Default, Clone)]
pub struct TestCase {
    input: String,
    expected: String,
}

/// Runs every unit of `s` (units are separated by `;;` lines), returning the combined logs.
fn exec_units(s: &str) -> (String, String) {
    let mut interp = Interpreter::new(Recorder::default());
    let mut log = String::new();
    let mut errors = String::new();
    for unit in s.split(";;\n") {
        let (l, e) = interp.submit(dbg!(unit));
        log += &l;
        errors += &e;
    }
    (log, errors)
}

impl TestCase {
    fn exec(&self) {
        let (log, errors) = exec_units(&self.input);
        assert_eq!(errors, "", "unexpected errors in\n{}", self.input);
        assert_eq!(log, self.expected);
    }

    fn exec_failure(&self) {
        let (_, errors) = exec_units(&self.input);
        assert_eq!(errors, self.expected, "while running\n{}", self.input);
    }
}

pub fn read_tests(path: impl AsRef<Path>) -> Vec<TestCase> {
    let text = std::fs::read_to_string(path).unwrap();
    let mut ret = Vec::new();
    let mut in_input = true;
    let mut cur = TestCase::default();

    fn separator_line(line: &str, ch: u8) -> bool {
        line.trim().len() >= 2 && line.trim().bytes().all(|c| c == ch)
    }

    for line in text.split_inclusive('\n') {
        if in_input {
            if separator_line(line, b'-') {
                in_input = false;
            } else {
                cur.input += line;
            }
        } else if separator_line(line, b'=') {
            in_input = true;
            ret.push(std::mem::take(&mut cur));
        } else {
            cur.expected += line;
        }
    }
    ret
}

#[test]
fn text_tests() {
    let tests = read_tests("tests/basic.txt");
    assert!(!tests.is_empty());
    for test in tests {
        test.exec();
    }
}

#[test]
fn exec_failures() {
    let tests = read_tests("tests/exec-failures.txt");
    assert!(!tests.is_empty());
    for test in tests {
        test.exec_failure();
    }
}

#[test]
fn square() {
    let rec = Recorder::default();
    let mut interp = Interpreter::new(rec.clone());
    let (_, errors) = interp.submit("to square s repeat 4 [fd s lt 900] end\nsquare 10");
    assert_eq!(errors, "");
    assert_eq!(
        rec.ops(),
        vec![
            CanvasOp::Line {
                from: (250, 250),
                to: (260, 250)
            },
            CanvasOp::Line {
                from: (260, 250),
                to: (260, 240)
            },
            CanvasOp::Line {
                from: (260, 240),
                to: (250, 240)
            },
            CanvasOp::Line {
                from: (250, 240),
                to: (250, 250)
            },
        ]
    );
    let turtle = interp.context().turtle;
    assert_eq!((turtle.x, turtle.y, turtle.heading), (250, 250, 0));
}

#[test]
fn pen_color_and_clear() {
    let rec = Recorder::default();
    let mut interp = Interpreter::new(rec.clone());
    interp.submit("pu setxy 10 20 pd setcolor 300 (0 - 1) 7 move 5 0 cs home");
    assert_eq!(
        rec.ops(),
        vec![
            CanvasOp::MoveTo { x: 10, y: 20 },
            CanvasOp::SetColor { r: 44, g: 255, b: 7 },
            CanvasOp::Line {
                from: (10, 20),
                to: (15, 20)
            },
            CanvasOp::Clear,
            CanvasOp::Line {
                from: (15, 20),
                to: (250, 250)
            },
        ]
    );
    assert_eq!(interp.context().turtle.color, (44, 255, 7));
    assert_eq!(interp.context().turtle.heading, 900);
}

#[test]
fn runtime_failure_keeps_drawing() {
    let rec = Recorder::default();
    let mut interp = Interpreter::new(rec.clone());
    let (_, errors) = interp.submit("fd 10 fd nowhere fd 10");
    assert_eq!(errors, "line 1, column 10: nowhere has no value\n");
    assert_eq!(rec.ops().len(), 1);
    assert_eq!(interp.context().turtle.x, 260);
}

#[test]
fn repeated_definitions_leave_table_alone() {
    let mut interp = Interpreter::new(Recorder::default());
    let unit = "to f a output a + 1 end print f 1";
    assert_eq!(interp.submit(unit).0, "2\n");
    let names: Vec<String> = interp.context().functions.names().map(str::to_owned).collect();
    assert_eq!(interp.submit(unit).0, "2\n");
    let again: Vec<String> = interp.context().functions.names().map(str::to_owned).collect();
    assert_eq!(names, again);
    assert_eq!(interp.context().functions.len(), 1);
}

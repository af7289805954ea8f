use std::{
    cell::RefCell,
    io::{BufRead, Write},
    rc::Rc,
};

use kurbo::{BezPath, Point};
use svg::{node::element::Path, Document};
use turtlelogo::{Canvas, CanvasOp, Recorder};

/// A line-oriented input that can be shared between the program reader and the prompts.
pub type SharedInput = Rc<RefCell<Box<dyn BufRead>>>;

pub fn shared_input(reader: impl BufRead + 'static) -> SharedInput {
    let reader: Box<dyn BufRead> = Box::new(reader);
    Rc::new(RefCell::new(reader))
}

/// Records drawing into a [`Recorder`], and asks for numbers on stderr.
pub struct HostCanvas {
    recorder: Recorder,
    input: SharedInput,
}

impl HostCanvas {
    pub fn new(recorder: Recorder, input: SharedInput) -> Self {
        HostCanvas { recorder, input }
    }
}

impl Canvas for HostCanvas {
    fn move_to(&mut self, x: i32, y: i32) {
        self.recorder.move_to(x, y);
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.recorder.draw_line(x1, y1, x2, y2);
    }

    fn clear(&mut self) {
        self.recorder.clear();
    }

    fn set_color(&mut self, r: i32, g: i32, b: i32) {
        self.recorder.set_color(r, g, b);
    }

    // Keeps asking until it gets a number, or the input runs out.
    fn prompt_for_integer(&mut self, label: &str) -> Option<i32> {
        let mut input = self.input.borrow_mut();
        let mut line = String::new();
        loop {
            eprint!("{label}? ");
            let _ = std::io::stderr().flush();
            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("failed to read a value for {label}: {e}");
                    return None;
                }
            }
            match line.trim().parse() {
                Ok(n) => return Some(n),
                Err(_) => eprintln!("{:?} isn't an integer", line.trim()),
            }
        }
    }
}

fn flush(current: &mut BezPath, color: (i32, i32, i32), paths: &mut Vec<Path>) {
    if !current.elements().is_empty() {
        paths.push(stroke(current, color));
    }
    *current = BezPath::new();
}

fn stroke(data: &BezPath, (r, g, b): (i32, i32, i32)) -> Path {
    Path::new()
        .set("fill", "none")
        .set("stroke", format!("rgb({r},{g},{b})"))
        .set("stroke-width", 1)
        .set("stroke-linecap", "round")
        .set("d", data.to_svg())
}

/// Draws the recorded operations onto a `size` by `size` picture.
///
/// Consecutive lines in the same color share one path. A [`CanvasOp::Clear`] throws away
/// everything before it.
pub fn render_svg(ops: &[CanvasOp], size: u32) -> Document {
    let mut paths = Vec::new();
    let mut color = (0, 0, 0);
    let mut current = BezPath::new();
    let mut last: Option<Point> = None;

    for op in ops {
        match *op {
            CanvasOp::MoveTo { .. } => {}
            CanvasOp::Line { from, to } => {
                let from = Point::new(f64::from(from.0), f64::from(from.1));
                let to = Point::new(f64::from(to.0), f64::from(to.1));
                if last != Some(from) {
                    current.move_to(from);
                }
                current.line_to(to);
                last = Some(to);
            }
            CanvasOp::Clear => {
                paths.clear();
                current = BezPath::new();
                last = None;
            }
            CanvasOp::SetColor { r, g, b } => {
                flush(&mut current, color, &mut paths);
                color = (r, g, b);
                last = None;
            }
        }
    }
    flush(&mut current, color, &mut paths);
    log::debug!("rendered {} paths", paths.len());

    paths.into_iter().fold(
        Document::new()
            .set("viewBox", (0, 0, size, size))
            .set("width", size)
            .set("height", size),
        |doc, path| doc.add(path),
    )
}

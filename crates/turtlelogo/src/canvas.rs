use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use kurbo::{Point, Vec2};

/// Where the turtle ends up after travelling `length` along `heading` (in tenths of a degree)
/// from `(x, y)`.
///
/// The coordinate system is y-down, and angles go counter-clockwise, so a heading of 900 points
/// towards smaller y.
pub fn endpoint(x: i32, y: i32, length: i32, heading: i32) -> (i32, i32) {
    let mut degrees = f64::from(heading) / 10.0;
    if degrees > 180.0 {
        degrees -= 360.0;
    }
    let start = Point::new(f64::from(x), f64::from(y));
    let end = start + Vec2::from_angle(-degrees.to_radians()) * f64::from(length);
    (end.x.round() as i32, end.y.round() as i32)
}

/// The surface that the turtle draws on, plus the means of asking the user for a number.
pub trait Canvas {
    /// Relocate the turtle without drawing.
    fn move_to(&mut self, x: i32, y: i32);

    /// Draw a line from `(x1, y1)` to `(x2, y2)`.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);

    fn clear(&mut self);

    /// Each channel is already in `0..256`.
    fn set_color(&mut self, r: i32, g: i32, b: i32);

    /// Ask for an integer, labelled by the name of the variable that will receive it.
    ///
    /// `None` means that no value could be obtained.
    fn prompt_for_integer(&mut self, label: &str) -> Option<i32>;

    /// Relocate along a heading; returns the new position.
    fn move_by_angle_length(&mut self, x: i32, y: i32, length: i32, heading: i32) -> (i32, i32) {
        let (x2, y2) = endpoint(x, y, length, heading);
        self.move_to(x2, y2);
        (x2, y2)
    }

    /// Draw along a heading; returns the new position.
    fn draw_by_angle_length(&mut self, x: i32, y: i32, length: i32, heading: i32) -> (i32, i32) {
        let (x2, y2) = endpoint(x, y, length, heading);
        self.draw_line(x, y, x2, y2);
        (x2, y2)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CanvasOp {
    MoveTo { x: i32, y: i32 },
    Line { from: (i32, i32), to: (i32, i32) },
    Clear,
    SetColor { r: i32, g: i32, b: i32 },
}

/// A canvas that just remembers what it was asked to do.
///
/// Clones share the same underlying storage, so one handle can be given to an
/// [`Interpreter`](crate::Interpreter) while another is kept for reading the ops back.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    ops: Rc<RefCell<Vec<CanvasOp>>>,
    inputs: Rc<RefCell<VecDeque<i32>>>,
}

impl Recorder {
    /// A recorder that answers prompts with `inputs`, in order.
    pub fn with_inputs(inputs: impl IntoIterator<Item = i32>) -> Self {
        let ret = Recorder::default();
        ret.inputs.borrow_mut().extend(inputs);
        ret
    }

    pub fn push_input(&self, value: i32) {
        self.inputs.borrow_mut().push_back(value);
    }

    pub fn ops(&self) -> Vec<CanvasOp> {
        self.ops.borrow().clone()
    }

    pub fn take_ops(&self) -> Vec<CanvasOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }

    fn push(&self, op: CanvasOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl Canvas for Recorder {
    fn move_to(&mut self, x: i32, y: i32) {
        self.push(CanvasOp::MoveTo { x, y });
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.push(CanvasOp::Line {
            from: (x1, y1),
            to: (x2, y2),
        });
    }

    fn clear(&mut self) {
        self.push(CanvasOp::Clear);
    }

    fn set_color(&mut self, r: i32, g: i32, b: i32) {
        self.push(CanvasOp::SetColor { r, g, b });
    }

    fn prompt_for_integer(&mut self, _label: &str) -> Option<i32> {
        self.inputs.borrow_mut().pop_front()
    }
}

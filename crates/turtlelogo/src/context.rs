use std::{collections::HashMap, fmt::Write as _};

use crate::{
    ast::Name,
    canvas::Canvas,
    error::Error,
    symbols::{FunctionTable, Scopes},
};

pub const HOME_X: i32 = 250;
pub const HOME_Y: i32 = 250;
pub const HOME_HEADING: i32 = 900;
/// One full turn, in tenths of a degree.
pub const FULL_TURN: i32 = 3600;
pub const COLOR_CHANNELS: i32 = 256;
/// How many user procedure calls may be active at once.
pub const MAX_CALL_DEPTH: usize = 512;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Turtle {
    pub x: i32,
    pub y: i32,
    /// In tenths of a degree, always in `0..FULL_TURN`.
    pub heading: i32,
    pub pen_down: bool,
    pub color: (i32, i32, i32),
}

impl Default for Turtle {
    fn default() -> Self {
        Turtle {
            x: HOME_X,
            y: HOME_Y,
            heading: 0,
            pen_down: true,
            color: (0, 0, 0),
        }
    }
}

/// Everything that a running program can see or change.
pub struct Context {
    pub turtle: Turtle,
    pub scopes: Scopes,
    pub functions: FunctionTable,
    canvas: Box<dyn Canvas>,
    log: String,
    error_log: String,
    call_depth: usize,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("turtle", &self.turtle)
            .field("scopes", &self.scopes)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(canvas: impl Canvas + 'static) -> Context {
        Context {
            turtle: Turtle::default(),
            scopes: Scopes::default(),
            functions: FunctionTable::default(),
            canvas: Box::new(canvas),
            log: String::new(),
            error_log: String::new(),
            call_depth: 0,
        }
    }

    pub fn write_log(&mut self, s: &str) {
        self.log.push_str(s);
    }

    pub fn write_error(&mut self, e: &Error) {
        let _ = writeln!(self.error_log, "{e}");
    }

    /// Read and clear both logs, as `(log, error_log)`.
    pub fn take_logs(&mut self) -> (String, String) {
        (
            std::mem::take(&mut self.log),
            std::mem::take(&mut self.error_log),
        )
    }

    pub fn lookup_var(&self, var: &Name) -> Result<i32, Error> {
        self.scopes.get(&var.name).ok_or_else(|| Error::UnknownVariable {
            pos: var.pos,
            name: var.name.clone(),
        })
    }

    /// Run `f` inside a fresh scope holding `locals`.
    ///
    /// The scope is popped again however `f` finishes.
    pub fn scoped<U>(
        &mut self,
        name: &str,
        locals: HashMap<String, i32>,
        f: impl FnOnce(&mut Context) -> Result<U, Error>,
    ) -> Result<U, Error> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Error::StackOverflow {
                name: name.to_owned(),
            });
        }
        self.call_depth += 1;
        self.scopes.push(locals);
        let res = f(self);
        self.scopes.pop();
        self.call_depth -= 1;
        res
    }

    pub fn prompt(&mut self, var: &Name) -> Result<i32, Error> {
        self.canvas
            .prompt_for_integer(&var.name)
            .ok_or_else(|| Error::NoInput {
                pos: var.pos,
                name: var.name.clone(),
            })
    }

    /// Move along the current heading, drawing if the pen is down. Negative lengths go backwards.
    pub fn forward(&mut self, length: i32) {
        let Turtle { x, y, heading, .. } = self.turtle;
        let (x, y) = if self.turtle.pen_down {
            self.canvas.draw_by_angle_length(x, y, length, heading)
        } else {
            self.canvas.move_by_angle_length(x, y, length, heading)
        };
        self.turtle.x = x;
        self.turtle.y = y;
    }

    /// Positive angles turn counter-clockwise.
    pub fn turn(&mut self, tenths: i32) {
        self.set_heading(self.turtle.heading.wrapping_add(tenths));
    }

    pub fn set_heading(&mut self, tenths: i32) {
        self.turtle.heading = tenths.rem_euclid(FULL_TURN);
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        if self.turtle.pen_down {
            self.canvas.draw_line(self.turtle.x, self.turtle.y, x, y);
        } else {
            self.canvas.move_to(x, y);
        }
        self.turtle.x = x;
        self.turtle.y = y;
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.move_to(
            self.turtle.x.wrapping_add(dx),
            self.turtle.y.wrapping_add(dy),
        );
    }

    pub fn home(&mut self) {
        self.move_to(HOME_X, HOME_Y);
        self.turtle.heading = HOME_HEADING;
    }

    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    pub fn set_pen_down(&mut self, down: bool) {
        self.turtle.pen_down = down;
    }

    /// Each channel is reduced into `0..256`.
    pub fn set_color(&mut self, r: i32, g: i32, b: i32) {
        let channel = |c: i32| c.rem_euclid(COLOR_CHANNELS);
        let (r, g, b) = (channel(r), channel(g), channel(b));
        self.turtle.color = (r, g, b);
        self.canvas.set_color(r, g, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasOp, Recorder};

    #[test]
    fn heading_wraps() {
        let mut ctx = Context::new(Recorder::default());
        ctx.turn(-36000);
        assert_eq!(ctx.turtle.heading, 0);
        ctx.turn(-10);
        assert_eq!(ctx.turtle.heading, 3590);
        ctx.set_heading(7201);
        assert_eq!(ctx.turtle.heading, 1);
        ctx.set_heading(3600);
        assert_eq!(ctx.turtle.heading, 0);
    }

    #[test]
    fn pen_controls_drawing() {
        let rec = Recorder::default();
        let mut ctx = Context::new(rec.clone());
        ctx.forward(10);
        ctx.set_pen_down(false);
        ctx.move_by(0, 5);
        assert_eq!(
            rec.ops(),
            vec![
                CanvasOp::Line {
                    from: (250, 250),
                    to: (260, 250)
                },
                CanvasOp::MoveTo { x: 260, y: 255 },
            ]
        );
        assert_eq!((ctx.turtle.x, ctx.turtle.y), (260, 255));
    }

    #[test]
    fn home_resets_heading() {
        let mut ctx = Context::new(Recorder::default());
        ctx.set_pen_down(false);
        ctx.move_to(3, 4);
        ctx.set_heading(17);
        ctx.home();
        assert_eq!((ctx.turtle.x, ctx.turtle.y), (HOME_X, HOME_Y));
        assert_eq!(ctx.turtle.heading, HOME_HEADING);
    }

    #[test]
    fn scope_popped_on_error() {
        let mut ctx = Context::new(Recorder::default());
        let res: Result<(), Error> = ctx.scoped("f", HashMap::new(), |ctx| {
            assert_eq!(ctx.scopes.depth(), 2);
            Err(Error::DivisionByZero)
        });
        assert!(res.is_err());
        assert_eq!(ctx.scopes.depth(), 1);
    }

    #[test]
    fn logs_are_drained() {
        let mut ctx = Context::new(Recorder::default());
        ctx.write_log("hi\n");
        ctx.write_error(&Error::DivisionByZero);
        assert_eq!(
            ctx.take_logs(),
            ("hi\n".to_owned(), "division by zero\n".to_owned())
        );
        assert_eq!(ctx.take_logs(), (String::new(), String::new()));
    }
}

use std::{cell::OnceCell, rc::Rc, time::Duration};

use crate::{
    context::Context,
    error::Error,
    source::Position,
    token::{AddOp, CmpOp, MulOp},
};

/// What running a statement produced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub value: Option<i32>,
    /// Set by `output`: every enclosing statement list stops, until an expression takes the value.
    pub is_output: bool,
}

impl Outcome {
    pub fn value(v: i32) -> Outcome {
        Outcome {
            value: Some(v),
            is_output: false,
        }
    }

    pub fn output(v: i32) -> Outcome {
        Outcome {
            value: Some(v),
            is_output: true,
        }
    }
}

pub type ExecResult = Result<Outcome, Error>;

/// A user-defined procedure.
///
/// The procedure is registered before its body has been parsed (so that it can call itself);
/// the body gets filled in once, when parsing of the definition succeeds. Until then it
/// behaves as if the body were empty.
#[derive(Debug)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<String>,
    body: OnceCell<Vec<Statement>>,
}

impl Procedure {
    pub fn new(name: String, params: Vec<String>) -> Procedure {
        Procedure {
            name,
            params,
            body: OnceCell::new(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn body(&self) -> &[Statement] {
        self.body.get().map_or(&[], Vec::as_slice)
    }

    pub(crate) fn set_body(&self, body: Vec<Statement>) {
        if self.body.set(body).is_err() {
            log::warn!("body of {} was already set", self.name);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Name {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug)]
pub enum Call {
    GetX,
    GetY,
    GetHeading,
    User {
        name: String,
        pos: Position,
        args: Vec<AddExpr>,
    },
}

impl Call {
    pub fn name(&self) -> &str {
        match self {
            Call::GetX => "getx",
            Call::GetY => "gety",
            Call::GetHeading => "getheading",
            Call::User { name, .. } => name,
        }
    }

    pub fn invoke(&self, ctx: &mut Context) -> ExecResult {
        let (name, pos, args) = match self {
            Call::GetX => return Ok(Outcome::value(ctx.turtle.x)),
            Call::GetY => return Ok(Outcome::value(ctx.turtle.y)),
            Call::GetHeading => return Ok(Outcome::value(ctx.turtle.heading)),
            Call::User { name, pos, args } => (name, *pos, args),
        };

        let proc = ctx.functions.get(name).cloned().ok_or_else(|| Error::UnknownProcedure {
            pos,
            name: name.clone(),
        })?;
        if proc.arity() != args.len() {
            return Err(Error::WrongArity {
                pos,
                name: name.clone(),
                expected: proc.arity(),
                found: args.len(),
            });
        }

        // Arguments are evaluated in the caller's scope.
        let values = args
            .iter()
            .map(|arg| arg.eval(ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let locals = proc.params.iter().cloned().zip(values).collect();
        // The `output` flag is kept, so a call statement stops the caller's statement list.
        ctx.scoped(name, locals, |ctx| exec_block(proc.body(), ctx))
    }
}

#[derive(Debug)]
pub enum Atom {
    Num(i32),
    Var(Name),
    Call(Call),
    Paren(Box<AddExpr>),
}

impl Atom {
    pub fn eval(&self, ctx: &mut Context) -> Result<i32, Error> {
        match self {
            Atom::Num(n) => Ok(*n),
            Atom::Var(v) => ctx.lookup_var(v),
            Atom::Call(call) => call.invoke(ctx)?.value.ok_or_else(|| Error::NoOutput {
                name: call.name().to_owned(),
            }),
            Atom::Paren(e) => e.eval(ctx),
        }
    }
}

/// `atom [(*|/) mul_expr]`.
///
/// Note that chains group to the right: `8 / 4 / 2` is `8 / (4 / 2)`.
#[derive(Debug)]
pub struct MulExpr {
    pub first: Atom,
    pub rest: Option<(MulOp, Box<MulExpr>)>,
}

impl MulExpr {
    pub fn eval(&self, ctx: &mut Context) -> Result<i32, Error> {
        let lhs = self.first.eval(ctx)?;
        let Some((op, rest)) = &self.rest else {
            return Ok(lhs);
        };
        let rhs = rest.eval(ctx)?;
        match op {
            MulOp::Mul => Ok(lhs.wrapping_mul(rhs)),
            MulOp::Div if rhs == 0 => Err(Error::DivisionByZero),
            MulOp::Div => Ok(lhs.wrapping_div(rhs)),
        }
    }
}

/// `[+|-] mul_expr [(+|-) add_expr]`, grouping to the right like [`MulExpr`].
///
/// The unary sign applies to the first term only.
#[derive(Debug)]
pub struct AddExpr {
    pub negate: bool,
    pub first: MulExpr,
    pub rest: Option<(AddOp, Box<AddExpr>)>,
}

impl AddExpr {
    pub fn eval(&self, ctx: &mut Context) -> Result<i32, Error> {
        let mut lhs = self.first.eval(ctx)?;
        if self.negate {
            lhs = lhs.wrapping_neg();
        }
        let Some((op, rest)) = &self.rest else {
            return Ok(lhs);
        };
        let rhs = rest.eval(ctx)?;
        Ok(match op {
            AddOp::Add => lhs.wrapping_add(rhs),
            AddOp::Sub => lhs.wrapping_sub(rhs),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogicOp {
    And,
    Or,
    Xor,
}

#[derive(Debug)]
pub enum Cond {
    Lit(bool),
    Not(Box<CondSet>),
    Braced(Box<CondSet>),
    Cmp(AddExpr, CmpOp, AddExpr),
}

impl Cond {
    pub fn eval(&self, ctx: &mut Context) -> Result<bool, Error> {
        match self {
            Cond::Lit(b) => Ok(*b),
            Cond::Not(set) => Ok(!set.eval(ctx)?),
            Cond::Braced(set) => set.eval(ctx),
            Cond::Cmp(lhs, op, rhs) => {
                let l = lhs.eval(ctx)?;
                let r = rhs.eval(ctx)?;
                Ok(match op {
                    CmpOp::Lt => l < r,
                    CmpOp::Gt => l > r,
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                })
            }
        }
    }
}

/// Conditions joined by `and`, `or` or `xor`, grouping to the right.
#[derive(Debug)]
pub struct CondSet {
    pub first: Cond,
    pub rest: Option<(LogicOp, Box<CondSet>)>,
}

impl CondSet {
    pub fn eval(&self, ctx: &mut Context) -> Result<bool, Error> {
        let Some((op, rest)) = &self.rest else {
            return self.first.eval(ctx);
        };
        Ok(match op {
            LogicOp::And => self.first.eval(ctx)? && rest.eval(ctx)?,
            LogicOp::Or => self.first.eval(ctx)? || rest.eval(ctx)?,
            LogicOp::Xor => self.first.eval(ctx)? != rest.eval(ctx)?,
        })
    }
}

#[derive(Debug)]
pub enum Printable {
    Text(String),
    Num(AddExpr),
}

#[derive(Debug)]
pub enum Statement {
    Define(Rc<Procedure>),
    Call(Call),
    Forward(AddExpr),
    Back(AddExpr),
    Right(AddExpr),
    Left(AddExpr),
    /// Relative move.
    Move(AddExpr, AddExpr),
    SetXY(AddExpr, AddExpr),
    Head(AddExpr),
    Home,
    ClearScreen,
    PenUp,
    PenDown,
    SetColor(AddExpr, AddExpr, AddExpr),
    Output(AddExpr),
    Print(Printable),
    Scan { name: Name, local: bool },
    Make { name: Name, value: AddExpr, local: bool },
    If(CondSet, Vec<Statement>),
    Repeat(AddExpr, Vec<Statement>),
    Sleep(AddExpr),
}

impl Statement {
    pub fn exec(&self, ctx: &mut Context) -> ExecResult {
        match self {
            Statement::Define(proc) => {
                ctx.functions.insert(Rc::clone(proc));
            }
            Statement::Call(call) => return call.invoke(ctx),
            Statement::Forward(len) => {
                let len = len.eval(ctx)?;
                ctx.forward(len);
            }
            Statement::Back(len) => {
                let len = len.eval(ctx)?;
                ctx.forward(len.wrapping_neg());
            }
            Statement::Right(angle) => {
                let angle = angle.eval(ctx)?;
                ctx.turn(angle.wrapping_neg());
            }
            Statement::Left(angle) => {
                let angle = angle.eval(ctx)?;
                ctx.turn(angle);
            }
            Statement::Move(dx, dy) => {
                let dx = dx.eval(ctx)?;
                let dy = dy.eval(ctx)?;
                ctx.move_by(dx, dy);
            }
            Statement::SetXY(x, y) => {
                let x = x.eval(ctx)?;
                let y = y.eval(ctx)?;
                ctx.move_to(x, y);
            }
            Statement::Head(heading) => {
                let heading = heading.eval(ctx)?;
                ctx.set_heading(heading);
            }
            Statement::Home => ctx.home(),
            Statement::ClearScreen => ctx.clear(),
            Statement::PenUp => ctx.set_pen_down(false),
            Statement::PenDown => ctx.set_pen_down(true),
            Statement::SetColor(r, g, b) => {
                let r = r.eval(ctx)?;
                let g = g.eval(ctx)?;
                let b = b.eval(ctx)?;
                ctx.set_color(r, g, b);
            }
            Statement::Output(e) => return Ok(Outcome::output(e.eval(ctx)?)),
            Statement::Print(Printable::Text(s)) => {
                ctx.write_log(s);
                ctx.write_log("\n");
            }
            Statement::Print(Printable::Num(e)) => {
                let n = e.eval(ctx)?;
                ctx.write_log(&format!("{n}\n"));
            }
            Statement::Scan { name, local } => {
                let value = ctx.prompt(name)?;
                if *local {
                    ctx.scopes.set_local(&name.name, value);
                } else {
                    ctx.scopes.set_global(&name.name, value);
                }
            }
            Statement::Make { name, value, local } => {
                let value = value.eval(ctx)?;
                if *local {
                    ctx.scopes.set_local(&name.name, value);
                } else {
                    ctx.scopes.set_global(&name.name, value);
                }
            }
            Statement::If(cond, body) => {
                if cond.eval(ctx)? {
                    return exec_block(body, ctx);
                }
            }
            Statement::Repeat(count, body) => {
                let mut last = Outcome::default();
                if body.is_empty() {
                    return Ok(last);
                }
                // The count is evaluated again before every iteration. A count that is at or
                // below the counter (including a negative one) ends the loop.
                let mut done = 0;
                while done < count.eval(ctx)? {
                    last = exec_block(body, ctx)?;
                    if last.is_output {
                        break;
                    }
                    done += 1;
                }
                return Ok(last);
            }
            Statement::Sleep(ms) => {
                let ms = ms.eval(ctx)?;
                let millis = u64::try_from(ms).map_err(|_| Error::NegativeSleep { ms })?;
                log::info!("sleeping for {millis} ms");
                std::thread::sleep(Duration::from_millis(millis));
            }
        }
        Ok(Outcome::default())
    }
}

/// Run statements in order, stopping early at an `output`.
///
/// Returns the outcome of the last statement that ran.
pub fn exec_block(statements: &[Statement], ctx: &mut Context) -> ExecResult {
    let mut last = Outcome::default();
    for statement in statements {
        last = statement.exec(ctx)?;
        if last.is_output {
            break;
        }
    }
    Ok(last)
}

use std::rc::Rc;

use crate::{
    ast::{AddExpr, Atom, Call, Cond, CondSet, LogicOp, MulExpr, Name, Printable, Procedure, Statement},
    error::Error,
    keyword::Keyword,
    source::Position,
    symbols::FunctionTable,
    token::{AddOp, Lexer, Token, TokenKind},
};

/// Parse the unit that `lexer` was loaded with.
///
/// Procedure definitions are registered in `functions` as soon as their headers are read. If the
/// unit fails to parse, `functions` is put back exactly the way it was before.
pub fn parse_unit(lexer: &mut Lexer, functions: &mut FunctionTable) -> Result<Vec<Statement>, Error> {
    let shadow = functions.shadow();
    let res = Parser::new(lexer, functions).program();
    match &res {
        Ok(statements) => log::debug!("parsed {} statements", statements.len()),
        Err(e) => {
            log::debug!("parse failed ({e}), rolling back procedure definitions");
            functions.restore(shadow);
        }
    }
    res
}

pub struct Parser<'a> {
    lexer: &'a mut Lexer,
    functions: &'a mut FunctionTable,
    // One token of lookahead.
    buf: Token,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: &'a mut Lexer, functions: &'a mut FunctionTable) -> Self {
        Parser {
            lexer,
            functions,
            buf: Token {
                kind: TokenKind::EndOfText,
                pos: Position::default(),
            },
        }
    }

    fn advance(&mut self) -> Result<(), Error> {
        self.buf = self.lexer.next_token();
        log::trace!("token {} at {}", self.buf.kind, self.buf.pos);
        if self.buf.kind == TokenKind::Invalid {
            return Err(Error::InvalidToken { pos: self.buf.pos });
        }
        Ok(())
    }

    fn expected(&self, expected: &'static str) -> Error {
        if self.buf.kind == TokenKind::EndOfText {
            Error::UnexpectedEnd {
                pos: self.buf.pos,
                expected,
            }
        } else {
            Error::Expected {
                pos: self.buf.pos,
                expected,
                found: self.buf.kind.to_string(),
            }
        }
    }

    /// Consume the current token if it is `kind`.
    fn eat(&mut self, kind: &TokenKind) -> Result<bool, Error> {
        if self.buf.kind == *kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), Error> {
        if self.eat(kind)? {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    /// A whole unit: statements up to the end of the text.
    pub fn program(&mut self) -> Result<Vec<Statement>, Error> {
        self.advance()?;
        let mut statements = Vec::new();
        while self.buf.kind != TokenKind::EndOfText {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Statement, Error> {
        if self.buf.is_keyword(Keyword::To) {
            self.definition().map(Statement::Define)
        } else {
            self.body_statement()
        }
    }

    fn definition(&mut self) -> Result<Rc<Procedure>, Error> {
        self.advance()?;
        let TokenKind::Ident(name) = &self.buf.kind else {
            return Err(self.expected("a procedure name"));
        };
        let name = name.clone();
        self.advance()?;

        // Parameters run until the first word that isn't a fresh variable name.
        let mut params = Vec::new();
        while let TokenKind::Ident(param) = &self.buf.kind {
            if *param == name || self.functions.contains(param) {
                break;
            }
            params.push(param.clone());
            self.advance()?;
        }

        let proc = Rc::new(Procedure::new(name, params));
        if self.functions.insert(Rc::clone(&proc)).is_some() {
            log::debug!("redefining {} with {} inputs", proc.name, proc.arity());
        } else {
            log::debug!("defining {} with {} inputs", proc.name, proc.arity());
        }

        let mut body = Vec::new();
        loop {
            match &self.buf.kind {
                TokenKind::Keyword(Keyword::End) => break,
                TokenKind::Keyword(Keyword::To) => {
                    return Err(Error::NestedDefinition {
                        pos: self.buf.pos,
                        outer: proc.name.clone(),
                    })
                }
                TokenKind::EndOfText => return Err(self.expected("end")),
                _ => body.push(self.body_statement()?),
            }
        }
        self.advance()?;

        proc.set_body(body);
        Ok(proc)
    }

    /// Any statement except a procedure definition.
    fn body_statement(&mut self) -> Result<Statement, Error> {
        if let Some(call) = self.call()? {
            return Ok(Statement::Call(call));
        }

        let TokenKind::Keyword(kw) = self.buf.kind else {
            return Err(self.expected("a statement"));
        };

        let statement = match kw {
            Keyword::Fd => {
                self.advance()?;
                Statement::Forward(self.add_expr()?)
            }
            Keyword::Bk => {
                self.advance()?;
                Statement::Back(self.add_expr()?)
            }
            Keyword::Rt => {
                self.advance()?;
                Statement::Right(self.add_expr()?)
            }
            Keyword::Lt => {
                self.advance()?;
                Statement::Left(self.add_expr()?)
            }
            Keyword::Move => {
                self.advance()?;
                let dx = self.add_expr()?;
                Statement::Move(dx, self.add_expr()?)
            }
            Keyword::SetXY => {
                self.advance()?;
                let x = self.add_expr()?;
                Statement::SetXY(x, self.add_expr()?)
            }
            Keyword::Head => {
                self.advance()?;
                Statement::Head(self.add_expr()?)
            }
            Keyword::Home => {
                self.advance()?;
                Statement::Home
            }
            Keyword::Cs => {
                self.advance()?;
                Statement::ClearScreen
            }
            Keyword::Pu => {
                self.advance()?;
                Statement::PenUp
            }
            Keyword::Pd => {
                self.advance()?;
                Statement::PenDown
            }
            Keyword::SetColor => {
                self.advance()?;
                let r = self.add_expr()?;
                let g = self.add_expr()?;
                Statement::SetColor(r, g, self.add_expr()?)
            }
            Keyword::Output => {
                self.advance()?;
                Statement::Output(self.add_expr()?)
            }
            Keyword::Print => {
                self.advance()?;
                if let TokenKind::Str(s) = &self.buf.kind {
                    let s = s.clone();
                    self.advance()?;
                    Statement::Print(Printable::Text(s))
                } else {
                    Statement::Print(Printable::Num(self.add_expr()?))
                }
            }
            Keyword::Scan => {
                self.advance()?;
                Statement::Scan {
                    name: self.var_name()?,
                    local: false,
                }
            }
            Keyword::Make => {
                self.advance()?;
                let name = self.var_name()?;
                Statement::Make {
                    name,
                    value: self.add_expr()?,
                    local: false,
                }
            }
            Keyword::Local => {
                self.advance()?;
                if self.eat(&TokenKind::Keyword(Keyword::Make))? {
                    let name = self.var_name()?;
                    Statement::Make {
                        name,
                        value: self.add_expr()?,
                        local: true,
                    }
                } else if self.eat(&TokenKind::Keyword(Keyword::Scan))? {
                    Statement::Scan {
                        name: self.var_name()?,
                        local: true,
                    }
                } else {
                    return Err(self.expected("make or scan"));
                }
            }
            Keyword::If => {
                self.advance()?;
                let cond = self.cond_set()?;
                Statement::If(cond, self.block()?)
            }
            Keyword::Repeat => {
                self.advance()?;
                let count = self.add_expr()?;
                Statement::Repeat(count, self.block()?)
            }
            Keyword::Sleep => {
                self.advance()?;
                Statement::Sleep(self.add_expr()?)
            }
            _ => return Err(self.expected("a statement")),
        };
        Ok(statement)
    }

    /// `[ statement* ]`
    fn block(&mut self) -> Result<Vec<Statement>, Error> {
        self.expect(&TokenKind::BracketOpen, "an opening bracket")?;
        let mut statements = Vec::new();
        loop {
            match self.buf.kind {
                TokenKind::BracketClose => break,
                TokenKind::EndOfText => return Err(self.expected("a closing bracket")),
                _ => statements.push(self.body_statement()?),
            }
        }
        self.advance()?;
        Ok(statements)
    }

    /// The target of `make` or `scan`: a word or a quoted string that doesn't name a procedure.
    fn var_name(&mut self) -> Result<Name, Error> {
        let (TokenKind::Ident(name) | TokenKind::Str(name)) = &self.buf.kind else {
            return Err(self.expected("a variable name"));
        };
        if self.functions.contains(name) {
            return Err(Error::NotAVariable {
                pos: self.buf.pos,
                name: name.clone(),
            });
        }
        let ret = Name {
            name: name.clone(),
            pos: self.buf.pos,
        };
        self.advance()?;
        Ok(ret)
    }

    /// A call to a built-in reporter or to a procedure that is already known.
    ///
    /// Returns `None` (without consuming anything) if the current token isn't one.
    fn call(&mut self) -> Result<Option<Call>, Error> {
        let call = match &self.buf.kind {
            TokenKind::Keyword(Keyword::GetX) => Call::GetX,
            TokenKind::Keyword(Keyword::GetY) => Call::GetY,
            TokenKind::Keyword(Keyword::GetHeading) => Call::GetHeading,
            TokenKind::Ident(name) => {
                let Some(arity) = self.functions.get(name).map(|p| p.arity()) else {
                    return Ok(None);
                };
                let name = name.clone();
                let pos = self.buf.pos;
                self.advance()?;
                let args = (0..arity)
                    .map(|_| self.add_expr())
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Some(Call::User { name, pos, args }));
            }
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(call))
    }

    fn atom(&mut self) -> Result<Atom, Error> {
        match &self.buf.kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance()?;
                return Ok(Atom::Num(n));
            }
            TokenKind::ParenOpen => {
                self.advance()?;
                let inner = self.add_expr()?;
                self.expect(&TokenKind::ParenClose, "a closing parenthesis")?;
                return Ok(Atom::Paren(Box::new(inner)));
            }
            _ => {}
        }

        if let Some(call) = self.call()? {
            return Ok(Atom::Call(call));
        }

        if let TokenKind::Ident(name) = &self.buf.kind {
            let var = Name {
                name: name.clone(),
                pos: self.buf.pos,
            };
            self.advance()?;
            return Ok(Atom::Var(var));
        }

        Err(self.expected("a number, a variable or a procedure call"))
    }

    fn mul_expr(&mut self) -> Result<MulExpr, Error> {
        let first = self.atom()?;
        let rest = if let TokenKind::MulOp(op) = self.buf.kind {
            self.advance()?;
            Some((op, Box::new(self.mul_expr()?)))
        } else {
            None
        };
        Ok(MulExpr { first, rest })
    }

    fn add_expr(&mut self) -> Result<AddExpr, Error> {
        let negate = match self.buf.kind {
            TokenKind::AddOp(op) => {
                self.advance()?;
                op == AddOp::Sub
            }
            _ => false,
        };
        let first = self.mul_expr()?;
        let rest = if let TokenKind::AddOp(op) = self.buf.kind {
            self.advance()?;
            Some((op, Box::new(self.add_expr()?)))
        } else {
            None
        };
        Ok(AddExpr {
            negate,
            first,
            rest,
        })
    }

    fn cond_set(&mut self) -> Result<CondSet, Error> {
        let first = self.cond()?;
        let op = match self.buf.kind {
            TokenKind::Keyword(Keyword::And) => LogicOp::And,
            TokenKind::Keyword(Keyword::Or) => LogicOp::Or,
            TokenKind::Keyword(Keyword::Xor) => LogicOp::Xor,
            _ => return Ok(CondSet { first, rest: None }),
        };
        self.advance()?;
        Ok(CondSet {
            first,
            rest: Some((op, Box::new(self.cond_set()?))),
        })
    }

    fn cond(&mut self) -> Result<Cond, Error> {
        match self.buf.kind {
            TokenKind::Keyword(Keyword::True) => {
                self.advance()?;
                return Ok(Cond::Lit(true));
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance()?;
                return Ok(Cond::Lit(false));
            }
            TokenKind::Keyword(Keyword::Not) => {
                self.advance()?;
                return Ok(Cond::Not(Box::new(self.cond_set()?)));
            }
            TokenKind::BraceOpen => {
                self.advance()?;
                let inner = self.cond_set()?;
                self.expect(&TokenKind::BraceClose, "a closing brace")?;
                return Ok(Cond::Braced(Box::new(inner)));
            }
            _ => {}
        }

        let lhs = self.add_expr()?;
        let TokenKind::Cmp(op) = self.buf.kind else {
            return Err(self.expected("a comparison operator"));
        };
        self.advance()?;
        Ok(Cond::Cmp(lhs, op, self.add_expr()?))
    }
}

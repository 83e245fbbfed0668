//! Recursive-descent parser for the script language
//!
//! Statements are parsed line by line from the token stream; expressions use
//! one method per precedence level, lowest first:
//!
//! ```text
//! conditional → or → and → not → comparison → sum → term → factor → power → postfix → atom
//! ```

use std::rc::Rc;

use super::ast::*;
use super::error::{ScriptError, ScriptResult};
use super::lexer::{tokenize, FStringPiece, Keyword, Tok, Token};

/// Deepest expression nesting accepted before giving up
const MAX_NESTING: usize = 100;

/// Parse a whole program
pub fn parse_program(source: &str) -> ScriptResult<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).program()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    loop_depth: usize,
    function_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
            loop_depth: 0,
            function_depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Tok {
        self.tokens
            .get(self.pos)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn peek_next(&self) -> &Tok {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, tok: &Tok) -> bool {
        self.peek() == tok
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Tok::Keyword(k) if *k == kw)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.check(tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn invalid_syntax(&self) -> ScriptError {
        match self.peek() {
            Tok::Indent => ScriptError::indentation("unexpected indent", self.line()),
            _ => ScriptError::syntax("invalid syntax", self.line()),
        }
    }

    fn expect(&mut self, tok: &Tok, message: &str) -> ScriptResult<()> {
        if self.eat(tok) {
            Ok(())
        } else if matches!(self.peek(), Tok::Eof | Tok::Newline) || message.is_empty() {
            Err(self.invalid_syntax())
        } else {
            Err(ScriptError::syntax(message, self.line()))
        }
    }

    fn expect_name(&mut self) -> ScriptResult<String> {
        match self.advance() {
            Tok::Name(name) => Ok(name),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.invalid_syntax())
            }
        }
    }

    fn enter(&mut self) -> ScriptResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(ScriptError::syntax(
                "too many nested parentheses",
                self.line(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn program(&mut self) -> ScriptResult<Program> {
        let mut body = Vec::new();
        while !self.check(&Tok::Eof) {
            if self.eat(&Tok::Newline) {
                continue;
            }
            body.extend(self.statement()?);
        }
        Ok(Program { body })
    }

    /// One line's worth of statements (a compound statement, or simple
    /// statements separated by `;`)
    fn statement(&mut self) -> ScriptResult<Vec<Stmt>> {
        let line = self.line();
        let stmt = match self.peek() {
            Tok::Indent => return Err(self.invalid_syntax()),
            Tok::Keyword(Keyword::If) => self.if_statement()?,
            Tok::Keyword(Keyword::While) => self.while_statement()?,
            Tok::Keyword(Keyword::For) => self.for_statement()?,
            Tok::Keyword(Keyword::Def) => self.function_def()?,
            Tok::Keyword(Keyword::Try) => self.try_statement()?,
            Tok::Keyword(Keyword::Class) => {
                return Err(ScriptError::syntax(
                    "class definitions are not supported",
                    line,
                ))
            }
            Tok::Keyword(Keyword::With) => {
                return Err(ScriptError::syntax("'with' is not supported", line))
            }
            _ => return self.simple_statements(),
        };
        Ok(vec![stmt])
    }

    fn simple_statements(&mut self) -> ScriptResult<Vec<Stmt>> {
        let mut stmts = vec![self.simple_statement()?];
        while self.eat(&Tok::Semicolon) {
            if matches!(self.peek(), Tok::Newline | Tok::Eof) {
                break;
            }
            stmts.push(self.simple_statement()?);
        }
        if !self.eat(&Tok::Newline) && !self.check(&Tok::Eof) {
            return Err(self.invalid_syntax());
        }
        Ok(stmts)
    }

    fn simple_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        let kind = match self.peek().clone() {
            Tok::Keyword(Keyword::Pass) => {
                self.advance();
                StmtKind::Pass
            }
            Tok::Keyword(Keyword::Break) => {
                self.advance();
                if self.loop_depth == 0 {
                    return Err(ScriptError::syntax("'break' outside loop", line));
                }
                StmtKind::Break
            }
            Tok::Keyword(Keyword::Continue) => {
                self.advance();
                if self.loop_depth == 0 {
                    return Err(ScriptError::syntax("'continue' not properly in loop", line));
                }
                StmtKind::Continue
            }
            Tok::Keyword(Keyword::Return) => {
                self.advance();
                if self.function_depth == 0 {
                    return Err(ScriptError::syntax("'return' outside function", line));
                }
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.expression_no_tuple()?))
                }
            }
            Tok::Keyword(Keyword::Global) => {
                self.advance();
                let mut names = vec![self.expect_name()?];
                while self.eat(&Tok::Comma) {
                    names.push(self.expect_name()?);
                }
                StmtKind::Global(names)
            }
            Tok::Keyword(Keyword::Raise) => {
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Raise(None)
                } else {
                    StmtKind::Raise(Some(self.expression()?))
                }
            }
            Tok::Keyword(Keyword::Assert) => {
                self.advance();
                let condition = self.expression()?;
                let message = if self.eat(&Tok::Comma) {
                    Some(self.expression()?)
                } else {
                    None
                };
                StmtKind::Assert { condition, message }
            }
            Tok::Keyword(Keyword::Import) => {
                self.advance();
                let module = self.dotted_name()?;
                if self.eat_keyword(Keyword::As) {
                    self.expect_name()?;
                }
                while self.eat(&Tok::Comma) {
                    self.dotted_name()?;
                    if self.eat_keyword(Keyword::As) {
                        self.expect_name()?;
                    }
                }
                StmtKind::Import(module)
            }
            Tok::Keyword(Keyword::From) => {
                self.advance();
                let module = self.dotted_name()?;
                if !self.eat_keyword(Keyword::Import) {
                    return Err(self.invalid_syntax());
                }
                // The imported names are irrelevant: the import always fails
                while !self.at_statement_end() {
                    self.advance();
                }
                StmtKind::Import(module)
            }
            Tok::Keyword(Keyword::Del) => {
                self.advance();
                let mut targets = Vec::new();
                loop {
                    let expr = self.postfix()?;
                    targets.push(self.target_from(expr)?);
                    if !self.eat(&Tok::Comma) {
                        break;
                    }
                }
                StmtKind::Del(targets)
            }
            Tok::Keyword(kw @ (Keyword::Nonlocal | Keyword::Lambda | Keyword::Yield)) => {
                return Err(ScriptError::syntax(
                    format!("'{}' is not supported", kw.as_str()),
                    line,
                ));
            }
            _ => self.expression_statement()?,
        };
        Ok(Stmt::new(kind, line))
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Tok::Newline | Tok::Semicolon | Tok::Eof)
    }

    fn dotted_name(&mut self) -> ScriptResult<String> {
        let mut name = self.expect_name()?;
        while self.eat(&Tok::Dot) {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn expression_statement(&mut self) -> ScriptResult<StmtKind> {
        let first = self.expression_no_tuple()?;

        let aug_op = match self.peek() {
            Tok::PlusAssign => Some(BinOp::Add),
            Tok::MinusAssign => Some(BinOp::Sub),
            Tok::StarAssign => Some(BinOp::Mul),
            Tok::SlashAssign => Some(BinOp::Div),
            Tok::DoubleSlashAssign => Some(BinOp::FloorDiv),
            Tok::PercentAssign => Some(BinOp::Mod),
            Tok::DoubleStarAssign => Some(BinOp::Pow),
            _ => None,
        };
        if let Some(op) = aug_op {
            self.advance();
            let target = self.target_from(first)?;
            let value = self.expression_no_tuple()?;
            return Ok(StmtKind::AugAssign { target, op, value });
        }

        if !self.check(&Tok::Assign) {
            return Ok(StmtKind::Expr(first));
        }

        let mut exprs = vec![first];
        while self.eat(&Tok::Assign) {
            exprs.push(self.expression_no_tuple()?);
        }
        let value = exprs.pop().ok_or_else(|| self.invalid_syntax())?;
        let targets = exprs
            .into_iter()
            .map(|e| self.target_from(e))
            .collect::<ScriptResult<Vec<_>>>()?;
        Ok(StmtKind::Assign { targets, value })
    }

    fn target_from(&self, expr: Expr) -> ScriptResult<Target> {
        match expr.kind {
            ExprKind::Name(name) => Ok(Target::Name(name)),
            ExprKind::Index { value, index } => Ok(Target::Subscript {
                value: *value,
                index: *index,
            }),
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => Err(ScriptError::syntax(
                "cannot assign to function call",
                expr.line,
            )),
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::None => Err(ScriptError::syntax("cannot assign to literal", expr.line)),
            _ => Err(ScriptError::syntax("cannot assign to expression", expr.line)),
        }
    }

    /// Parse `:` followed by an indented block or a same-line suite
    fn block(&mut self, after: &str, header_line: usize) -> ScriptResult<Vec<Stmt>> {
        self.expect(&Tok::Colon, "expected ':'")?;

        if !self.eat(&Tok::Newline) {
            return self.simple_statements();
        }
        if !self.eat(&Tok::Indent) {
            return Err(ScriptError::indentation(
                format!(
                    "expected an indented block after {} on line {}",
                    after, header_line
                ),
                self.line(),
            ));
        }

        let mut body = Vec::new();
        while !self.eat(&Tok::Dedent) {
            if self.check(&Tok::Eof) {
                break;
            }
            if self.eat(&Tok::Newline) {
                continue;
            }
            body.extend(self.statement()?);
        }
        Ok(body)
    }

    fn loop_body(&mut self, after: &str, line: usize) -> ScriptResult<Vec<Stmt>> {
        self.loop_depth += 1;
        let body = self.block(after, line);
        self.loop_depth -= 1;
        body
    }

    fn if_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        self.advance();
        let condition = self.expression()?;
        let body = self.block("'if' statement", line)?;
        let mut branches = vec![(condition, body)];
        let mut orelse = Vec::new();

        loop {
            let clause_line = self.line();
            if self.eat_keyword(Keyword::Elif) {
                let condition = self.expression()?;
                let body = self.block("'elif' statement", clause_line)?;
                branches.push((condition, body));
            } else if self.eat_keyword(Keyword::Else) {
                orelse = self.block("'else' statement", clause_line)?;
                break;
            } else {
                break;
            }
        }

        Ok(Stmt::new(StmtKind::If { branches, orelse }, line))
    }

    fn while_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        self.advance();
        let condition = self.expression()?;
        let body = self.loop_body("'while' statement", line)?;
        let orelse = self.else_clause()?;
        Ok(Stmt::new(
            StmtKind::While {
                condition,
                body,
                orelse,
            },
            line,
        ))
    }

    fn for_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        self.advance();
        let var = self.expect_name()?;
        if self.check(&Tok::Comma) {
            return Err(ScriptError::syntax(
                "tuple unpacking is not supported",
                self.line(),
            ));
        }
        if !self.eat_keyword(Keyword::In) {
            return Err(self.invalid_syntax());
        }
        let iter = self.expression()?;
        let body = self.loop_body("'for' statement", line)?;
        let orelse = self.else_clause()?;
        Ok(Stmt::new(
            StmtKind::For {
                var,
                iter,
                body,
                orelse,
            },
            line,
        ))
    }

    fn else_clause(&mut self) -> ScriptResult<Vec<Stmt>> {
        let line = self.line();
        if self.eat_keyword(Keyword::Else) {
            self.block("'else' statement", line)
        } else {
            Ok(Vec::new())
        }
    }

    fn function_def(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        self.advance();
        let name = self.expect_name()?;
        self.expect(&Tok::LParen, "expected '('")?;

        let mut params: Vec<Param> = Vec::new();
        while !self.check(&Tok::RParen) {
            let param_line = self.line();
            let param = self.expect_name()?;
            if params.iter().any(|p| p.name == param) {
                return Err(ScriptError::syntax(
                    format!("duplicate argument '{}' in function definition", param),
                    param_line,
                ));
            }
            let default = if self.eat(&Tok::Assign) {
                Some(self.expression()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return Err(ScriptError::syntax(
                        "parameter without a default follows parameter with a default",
                        param_line,
                    ));
                }
                None
            };
            params.push(Param {
                name: param,
                default,
            });
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(&Tok::RParen, "expected ')'")?;

        // A function body is its own loop context
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.block("function definition", line);
        self.function_depth -= 1;
        self.loop_depth = saved_loops;
        let body = body?;

        let mut globals = Vec::new();
        collect_globals(&body, &mut globals);
        let mut locals: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        collect_bindings(&body, &mut locals);
        locals.retain(|name| !globals.contains(name));

        Ok(Stmt::new(
            StmtKind::FunctionDef(Rc::new(FunctionDef {
                name,
                params,
                body,
                locals,
                globals,
            })),
            line,
        ))
    }

    fn try_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        self.advance();
        let body = self.block("'try' statement", line)?;

        let mut handlers = Vec::new();
        while self.check_keyword(Keyword::Except) {
            let handler_line = self.line();
            self.advance();
            let (class, binding) = if self.check(&Tok::Colon) {
                (None, None)
            } else {
                let class = self.dotted_name()?;
                let binding = if self.eat_keyword(Keyword::As) {
                    Some(self.expect_name()?)
                } else {
                    None
                };
                (Some(class), binding)
            };
            let body = self.block("'except' statement", handler_line)?;
            handlers.push(ExceptHandler {
                class,
                binding,
                body,
                line: handler_line,
            });
        }
        if let Some(pos) = handlers.iter().position(|h| h.class.is_none()) {
            if pos + 1 != handlers.len() {
                return Err(ScriptError::syntax(
                    "default 'except:' must be last",
                    handlers[pos].line,
                ));
            }
        }

        let orelse = if !handlers.is_empty() {
            self.else_clause()?
        } else {
            Vec::new()
        };

        let finally_line = self.line();
        let finalbody = if self.eat_keyword(Keyword::Finally) {
            self.block("'finally' statement", finally_line)?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(ScriptError::syntax(
                "expected 'except' or 'finally' block",
                self.line(),
            ));
        }

        Ok(Stmt::new(
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            line,
        ))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Expression that may not be followed by a bare comma
    fn expression_no_tuple(&mut self) -> ScriptResult<Expr> {
        let expr = self.expression()?;
        if self.check(&Tok::Comma) {
            return Err(ScriptError::syntax(
                "tuples are not supported",
                self.line(),
            ));
        }
        Ok(expr)
    }

    pub fn expression(&mut self) -> ScriptResult<Expr> {
        self.enter()?;
        let result = self.conditional();
        self.leave();
        result
    }

    fn conditional(&mut self) -> ScriptResult<Expr> {
        let then = self.or_expr()?;
        if !self.check_keyword(Keyword::If) {
            return Ok(then);
        }
        let line = self.line();
        self.advance();
        let condition = self.or_expr()?;
        if !self.eat_keyword(Keyword::Else) {
            return Err(ScriptError::syntax(
                "expected 'else' after 'if' expression",
                self.line(),
            ));
        }
        let otherwise = self.expression()?;
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            line,
        ))
    }

    fn or_expr(&mut self) -> ScriptResult<Expr> {
        let mut left = self.and_expr()?;
        while self.check_keyword(Keyword::Or) {
            let line = self.line();
            self.advance();
            let right = self.and_expr()?;
            left = Expr::new(
                ExprKind::Logical {
                    op: BoolOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ScriptResult<Expr> {
        let mut left = self.not_expr()?;
        while self.check_keyword(Keyword::And) {
            let line = self.line();
            self.advance();
            let right = self.not_expr()?;
            left = Expr::new(
                ExprKind::Logical {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> ScriptResult<Expr> {
        if self.check_keyword(Keyword::Not) {
            let line = self.line();
            self.advance();
            self.enter()?;
            let operand = self.not_expr();
            self.leave();
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand?),
                },
                line,
            ));
        }
        self.comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek() {
            Tok::EqEq => CmpOp::Eq,
            Tok::NotEq => CmpOp::NotEq,
            Tok::Lt => CmpOp::Lt,
            Tok::Le => CmpOp::Le,
            Tok::Gt => CmpOp::Gt,
            Tok::Ge => CmpOp::Ge,
            Tok::Keyword(Keyword::In) => CmpOp::In,
            Tok::Keyword(Keyword::Not)
                if matches!(self.peek_next(), Tok::Keyword(Keyword::In)) =>
            {
                self.advance();
                CmpOp::NotIn
            }
            Tok::Keyword(Keyword::Is) => {
                if matches!(self.peek_next(), Tok::Keyword(Keyword::Not)) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn comparison(&mut self) -> ScriptResult<Expr> {
        let line = self.line();
        let left = self.sum()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                rest,
            },
            line,
        ))
    }

    fn binary(op: BinOp, left: Expr, right: Expr, line: usize) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        )
    }

    fn sum(&mut self) -> ScriptResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            let line = self.line();
            self.advance();
            let right = self.term()?;
            left = Self::binary(op, left, right, line);
        }
    }

    fn term(&mut self) -> ScriptResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::DoubleSlash => BinOp::FloorDiv,
                Tok::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            let line = self.line();
            self.advance();
            let right = self.factor()?;
            left = Self::binary(op, left, right, line);
        }
    }

    fn factor(&mut self) -> ScriptResult<Expr> {
        let op = match self.peek() {
            Tok::Minus => UnaryOp::Neg,
            Tok::Plus => UnaryOp::Pos,
            _ => return self.power(),
        };
        let line = self.line();
        self.advance();
        self.enter()?;
        let operand = self.factor();
        self.leave();
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand?),
            },
            line,
        ))
    }

    fn power(&mut self) -> ScriptResult<Expr> {
        let base = self.postfix()?;
        if !self.check(&Tok::DoubleStar) {
            return Ok(base);
        }
        let line = self.line();
        self.advance();
        // Right-associative, and binds tighter than a unary minus on its left
        self.enter()?;
        let exponent = self.factor();
        self.leave();
        Ok(Self::binary(BinOp::Pow, base, exponent?, line))
    }

    fn postfix(&mut self) -> ScriptResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            let line = self.line();
            match self.peek() {
                Tok::LParen => {
                    self.advance();
                    let (args, kwargs) = self.call_arguments()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                            kwargs,
                        },
                        line,
                    );
                }
                Tok::LBracket => {
                    self.advance();
                    expr = self.subscript(expr, line)?;
                }
                Tok::Dot => {
                    self.advance();
                    let name = self.expect_name()?;
                    if self.eat(&Tok::LParen) {
                        let (args, kwargs) = self.call_arguments()?;
                        expr = Expr::new(
                            ExprKind::MethodCall {
                                receiver: Box::new(expr),
                                method: name,
                                args,
                                kwargs,
                            },
                            line,
                        );
                    } else {
                        expr = Expr::new(
                            ExprKind::Attribute {
                                value: Box::new(expr),
                                name,
                            },
                            line,
                        );
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Arguments after an opening `(`, through the closing `)`
    fn call_arguments(&mut self) -> ScriptResult<(Vec<Expr>, Vec<(String, Expr)>)> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.check(&Tok::RParen) {
            if self.check(&Tok::Star) || self.check(&Tok::DoubleStar) {
                return Err(ScriptError::syntax(
                    "argument unpacking is not supported",
                    self.line(),
                ));
            }
            let keyword = match (self.peek(), self.peek_next()) {
                (Tok::Name(name), Tok::Assign) => Some(name.clone()),
                _ => None,
            };
            if let Some(name) = keyword {
                let line = self.line();
                self.advance();
                self.advance();
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return Err(ScriptError::syntax(
                        format!("keyword argument repeated: {}", name),
                        line,
                    ));
                }
                kwargs.push((name, self.expression()?));
            } else {
                let line = self.line();
                let arg = self.expression()?;
                if !kwargs.is_empty() {
                    return Err(ScriptError::syntax(
                        "positional argument follows keyword argument",
                        line,
                    ));
                }
                if self.check_keyword(Keyword::For) {
                    return Err(ScriptError::syntax(
                        "generator expressions are not supported",
                        self.line(),
                    ));
                }
                args.push(arg);
            }
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(&Tok::RParen, "")?;
        Ok((args, kwargs))
    }

    fn subscript(&mut self, value: Expr, line: usize) -> ScriptResult<Expr> {
        let lower = if self.check(&Tok::Colon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };

        if !self.eat(&Tok::Colon) {
            self.expect(&Tok::RBracket, "")?;
            let index = lower.ok_or_else(|| self.invalid_syntax())?;
            return Ok(Expr::new(
                ExprKind::Index {
                    value: Box::new(value),
                    index,
                },
                line,
            ));
        }

        let bound = |parser: &mut Self| -> ScriptResult<Option<Box<Expr>>> {
            if matches!(parser.peek(), Tok::Colon | Tok::RBracket) {
                Ok(None)
            } else {
                Ok(Some(Box::new(parser.expression()?)))
            }
        };
        let upper = bound(self)?;
        let step = if self.eat(&Tok::Colon) {
            bound(self)?
        } else {
            None
        };
        self.expect(&Tok::RBracket, "")?;
        Ok(Expr::new(
            ExprKind::Slice {
                value: Box::new(value),
                lower,
                upper,
                step,
            },
            line,
        ))
    }

    fn atom(&mut self) -> ScriptResult<Expr> {
        let line = self.line();
        let kind = match self.advance() {
            Tok::Int(n) => ExprKind::Int(n),
            Tok::Float(x) => ExprKind::Float(x),
            Tok::Str(s) => return self.string_concat(vec![FStringPart::Literal(s)], false, line),
            Tok::FString(pieces) => {
                let parts = self.fstring_parts(pieces, line)?;
                return self.string_concat(parts, true, line);
            }
            Tok::Name(name) => ExprKind::Name(name),
            Tok::Keyword(Keyword::True) => ExprKind::Bool(true),
            Tok::Keyword(Keyword::False) => ExprKind::Bool(false),
            Tok::Keyword(Keyword::None) => ExprKind::None,
            Tok::LParen => {
                if self.check(&Tok::RParen) {
                    return Err(ScriptError::syntax("tuples are not supported", line));
                }
                let inner = self.expression()?;
                if self.check(&Tok::Comma) {
                    return Err(ScriptError::syntax("tuples are not supported", self.line()));
                }
                if self.check_keyword(Keyword::For) {
                    return Err(ScriptError::syntax(
                        "generator expressions are not supported",
                        self.line(),
                    ));
                }
                self.expect(&Tok::RParen, "")?;
                return Ok(inner);
            }
            Tok::LBracket => {
                let mut items = Vec::new();
                while !self.check(&Tok::RBracket) {
                    items.push(self.expression()?);
                    if self.check_keyword(Keyword::For) {
                        return Err(ScriptError::syntax(
                            "list comprehensions are not supported",
                            self.line(),
                        ));
                    }
                    if !self.eat(&Tok::Comma) {
                        break;
                    }
                }
                self.expect(&Tok::RBracket, "")?;
                ExprKind::List(items)
            }
            Tok::LBrace => {
                let mut entries = Vec::new();
                while !self.check(&Tok::RBrace) {
                    let key = self.expression()?;
                    if !self.eat(&Tok::Colon) {
                        return Err(ScriptError::syntax("sets are not supported", line));
                    }
                    let value = self.expression()?;
                    if self.check_keyword(Keyword::For) {
                        return Err(ScriptError::syntax(
                            "dict comprehensions are not supported",
                            self.line(),
                        ));
                    }
                    entries.push((key, value));
                    if !self.eat(&Tok::Comma) {
                        break;
                    }
                }
                self.expect(&Tok::RBrace, "")?;
                ExprKind::Dict(entries)
            }
            Tok::Keyword(Keyword::Lambda) => {
                return Err(ScriptError::syntax("'lambda' is not supported", line))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.invalid_syntax());
            }
        };
        Ok(Expr::new(kind, line))
    }

    /// Adjacent string literals concatenate, f-strings included
    fn string_concat(
        &mut self,
        mut parts: Vec<FStringPart>,
        mut formatted: bool,
        line: usize,
    ) -> ScriptResult<Expr> {
        loop {
            match self.peek().clone() {
                Tok::Str(s) => {
                    self.advance();
                    parts.push(FStringPart::Literal(s));
                }
                Tok::FString(pieces) => {
                    self.advance();
                    parts.extend(self.fstring_parts(pieces, line)?);
                    formatted = true;
                }
                _ => break,
            }
        }

        if !formatted {
            let text = parts
                .into_iter()
                .map(|p| match p {
                    FStringPart::Literal(s) => s,
                    FStringPart::Field { .. } => String::new(),
                })
                .collect();
            return Ok(Expr::new(ExprKind::Str(text), line));
        }
        Ok(Expr::new(ExprKind::FString(parts), line))
    }

    fn fstring_parts(
        &mut self,
        pieces: Vec<FStringPiece>,
        line: usize,
    ) -> ScriptResult<Vec<FStringPart>> {
        pieces
            .into_iter()
            .map(|piece| match piece {
                FStringPiece::Literal(text) => Ok(FStringPart::Literal(text)),
                FStringPiece::Field {
                    source,
                    conversion,
                    spec,
                } => Ok(FStringPart::Field {
                    expr: self.fstring_expression(&source, line)?,
                    conversion,
                    spec,
                }),
            })
            .collect()
    }

    fn fstring_expression(&mut self, source: &str, line: usize) -> ScriptResult<Expr> {
        let mut tokens = tokenize(source.trim()).map_err(|e| {
            ScriptError::syntax(format!("f-string: {}", e.message), line)
        })?;
        for token in &mut tokens {
            token.line = line;
        }
        let mut sub = Parser::new(tokens);
        sub.nesting = self.nesting;
        let expr = sub.expression()?;
        while sub.eat(&Tok::Newline) {}
        if !sub.check(&Tok::Eof) {
            return Err(ScriptError::syntax("f-string: invalid syntax", line));
        }
        Ok(expr)
    }
}

/// Names declared `global` anywhere in a function body (not nested defs)
fn collect_globals(body: &[Stmt], out: &mut Vec<String>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Global(names) => {
                for name in names {
                    if !out.contains(name) {
                        out.push(name.clone());
                    }
                }
            }
            _ => for_each_block(&stmt.kind, |block| collect_globals(block, out)),
        }
    }
}

/// Names bound anywhere in a function body (not nested defs)
fn collect_bindings(body: &[Stmt], out: &mut Vec<String>) {
    let bind = |name: &str, out: &mut Vec<String>| {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    };

    for stmt in body {
        match &stmt.kind {
            StmtKind::Assign { targets, .. } => {
                for target in targets {
                    if let Target::Name(name) = target {
                        bind(name, out);
                    }
                }
            }
            StmtKind::AugAssign {
                target: Target::Name(name),
                ..
            } => bind(name, out),
            StmtKind::For { var, .. } => bind(var, out),
            StmtKind::FunctionDef(def) => bind(&def.name, out),
            StmtKind::Del(targets) => {
                for target in targets {
                    if let Target::Name(name) = target {
                        bind(name, out);
                    }
                }
            }
            StmtKind::Try { handlers, .. } => {
                for handler in handlers {
                    if let Some(name) = &handler.binding {
                        bind(name, out);
                    }
                }
            }
            _ => {}
        }
        if !matches!(stmt.kind, StmtKind::FunctionDef(_)) {
            for_each_block(&stmt.kind, |block| collect_bindings(block, out));
        }
    }
}

/// Visit the nested statement blocks of a compound statement
fn for_each_block(kind: &StmtKind, mut visit: impl FnMut(&[Stmt])) {
    match kind {
        StmtKind::If { branches, orelse } => {
            for (_, body) in branches {
                visit(body);
            }
            visit(orelse);
        }
        StmtKind::While { body, orelse, .. } | StmtKind::For { body, orelse, .. } => {
            visit(body);
            visit(orelse);
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            visit(body);
            for handler in handlers {
                visit(&handler.body);
            }
            visit(orelse);
            visit(finalbody);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::error::ErrorKind;

    fn parse(source: &str) -> Vec<Stmt> {
        parse_program(source).unwrap().body
    }

    fn parse_err(source: &str) -> ScriptError {
        parse_program(source).unwrap_err()
    }

    #[test]
    fn test_precedence() {
        let body = parse("x = 1 + 2 * 3\n");
        let StmtKind::Assign { value, .. } = &body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op, right, .. } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        let body = parse("-2 ** 2\n");
        let StmtKind::Expr(expr) = &body[0].kind else {
            panic!("expected expression");
        };
        assert!(matches!(expr.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn test_function_locals_exclude_globals() {
        let body = parse("def f(a):\n    global g\n    g = a\n    b = 1\n    for i in a:\n        pass\n");
        let StmtKind::FunctionDef(def) = &body[0].kind else {
            panic!("expected def");
        };
        assert_eq!(def.locals, vec!["a", "b", "i"]);
        assert_eq!(def.globals, vec!["g"]);
    }

    #[test]
    fn test_same_line_suite_and_semicolons() {
        let body = parse("if x: a = 1; b = 2\n");
        let StmtKind::If { branches, .. } = &body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(branches[0].1.len(), 2);
    }

    #[test]
    fn test_chained_comparison_and_not_in() {
        let body = parse("a < b <= c not in d\n");
        let StmtKind::Expr(expr) = &body[0].kind else {
            panic!("expected expression");
        };
        let ExprKind::Compare { rest, .. } = &expr.kind else {
            panic!("expected compare");
        };
        let ops: Vec<CmpOp> = rest.iter().map(|(op, _)| *op).collect();
        assert_eq!(ops, vec![CmpOp::Lt, CmpOp::Le, CmpOp::NotIn]);
    }

    #[test]
    fn test_missing_block_is_indentation_error() {
        let err = parse_err("if x:\nprint(1)\n");
        assert_eq!(err.kind, ErrorKind::IndentationError);
        assert_eq!(
            err.message,
            "expected an indented block after 'if' statement on line 1"
        );
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_err("x = 1\n    y = 2\n");
        assert_eq!(err.kind, ErrorKind::IndentationError);
        assert_eq!(err.to_string(), "unexpected indent (line 2)");
    }

    #[test]
    fn test_invalid_syntax_reports_line() {
        let err = parse_err("x = 1\ny = = 2\n");
        assert_eq!(err.to_string(), "invalid syntax (line 2)");
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(parse_err("break\n").message, "'break' outside loop");
        assert_eq!(
            parse_err("while True:\n    def f():\n        break\n").message,
            "'break' outside loop"
        );
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(parse_err("return 1\n").message, "'return' outside function");
    }

    #[test]
    fn test_assign_to_call_is_rejected() {
        assert_eq!(
            parse_err("f() = 1\n").message,
            "cannot assign to function call"
        );
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let body = parse("x = 'a' \"b\"\n");
        let StmtKind::Assign { value, .. } = &body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.kind, ExprKind::Str("ab".into()));
    }

    #[test]
    fn test_unsupported_constructs_have_clear_messages() {
        assert_eq!(
            parse_err("class A:\n    pass\n").message,
            "class definitions are not supported"
        );
        assert_eq!(
            parse_err("x = [i for i in y]\n").message,
            "list comprehensions are not supported"
        );
        assert_eq!(parse_err("a, b = 1, 2\n").message, "tuples are not supported");
    }
}

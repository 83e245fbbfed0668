//! Tree-walking evaluator

use std::cmp::Ordering;
use std::rc::Rc;

use super::ast::{
    BinOp, BoolOp, CmpOp, ExceptHandler, Expr, ExprKind, FStringPart, FunctionDef, Program,
    Stmt, StmtKind, Target, UnaryOp,
};
use super::builtins::Builtin;
use super::error::{ErrorKind, ScriptError, ScriptResult};
use super::format::format_value;
use super::host::ScriptHost;
use super::value::{range_item, range_items, range_len, Dict, Function, Scope, Value};

/// Maximum nesting of user function calls
pub const RECURSION_LIMIT: usize = 200;

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Where names resolve while executing a block
#[derive(Clone)]
struct Frame {
    scope: Rc<Scope>,
    /// The function being executed; `None` at module level
    func: Option<Rc<FunctionDef>>,
}

pub struct Interpreter<'h> {
    pub(super) host: &'h mut dyn ScriptHost,
    globals: Rc<Scope>,
    depth: usize,
    /// Exceptions currently being handled, innermost last
    handling: Vec<Rc<ScriptError>>,
}

impl<'h> Interpreter<'h> {
    pub fn new(host: &'h mut dyn ScriptHost) -> Self {
        Self {
            host,
            globals: Scope::child(None),
            depth: 0,
            handling: Vec::new(),
        }
    }

    /// Execute a whole program at module level
    pub fn run(&mut self, program: &Program) -> ScriptResult<()> {
        let frame = Frame {
            scope: self.globals.clone(),
            func: None,
        };
        match self.exec_block(&program.body, &frame)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            // The parser rejects these outside loops
            Flow::Break | Flow::Continue => Ok(()),
        }
    }

    /// Value of a module-level variable after a run
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get_local(name)
    }

    fn check_stop(&self) -> ScriptResult<()> {
        if self.host.should_stop() {
            Err(ScriptError::interrupted())
        } else {
            Ok(())
        }
    }

    fn exec_block(&mut self, body: &[Stmt], frame: &Frame) -> ScriptResult<Flow> {
        for stmt in body {
            match self.exec_stmt(stmt, frame).map_err(|e| e.at(stmt.line))? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, frame: &Frame) -> ScriptResult<Flow> {
        self.host.poll();
        self.check_stop()?;
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr, frame)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value, frame)?;
                for target in targets {
                    self.assign(target, value.clone(), frame)?;
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                self.exec_aug_assign(target, *op, value, frame)?;
            }
            StmtKind::If { branches, orelse } => {
                for (condition, body) in branches {
                    if self.eval(condition, frame)?.truthy() {
                        return self.exec_block(body, frame);
                    }
                }
                return self.exec_block(orelse, frame);
            }
            StmtKind::While {
                condition,
                body,
                orelse,
            } => {
                while self.eval(condition, frame)?.truthy() {
                    self.check_stop()?;
                    match self.exec_block(body, frame)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                return self.exec_block(orelse, frame);
            }
            StmtKind::For {
                var,
                iter,
                body,
                orelse,
            } => {
                let iterable = self.eval(iter, frame)?;
                return self.exec_for(var, &iterable, body, orelse, frame);
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Pass | StmtKind::Global(_) => {}
            StmtKind::FunctionDef(def) => {
                let mut defaults = Vec::with_capacity(def.params.len());
                for param in &def.params {
                    defaults.push(match &param.default {
                        Some(expr) => Some(self.eval(expr, frame)?),
                        None => None,
                    });
                }
                let closure = frame.func.as_ref().map(|_| frame.scope.clone());
                let func = Value::Function(Rc::new(Function {
                    def: def.clone(),
                    defaults,
                    closure,
                }));
                self.assign_name(&def.name, func, frame);
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, frame)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => return self.exec_try(body, handlers, orelse, finalbody, frame),
            StmtKind::Raise(None) => {
                return Err(match self.handling.last() {
                    Some(active) => (**active).clone(),
                    None => ScriptError::new(
                        ErrorKind::RuntimeError,
                        "No active exception to reraise",
                    ),
                });
            }
            StmtKind::Raise(Some(expr)) => {
                let value = self.eval(expr, frame)?;
                return Err(match value {
                    Value::ExceptionClass(kind) => ScriptError::new(kind, ""),
                    Value::Exception(err) => ScriptError { line: None, ..(*err).clone() },
                    _ => ScriptError::type_error("exceptions must derive from BaseException"),
                });
            }
            StmtKind::Assert { condition, message } => {
                if !self.eval(condition, frame)?.truthy() {
                    let message = match message {
                        Some(expr) => self.eval(expr, frame)?.to_str(),
                        None => String::new(),
                    };
                    return Err(ScriptError::new(ErrorKind::AssertionError, message));
                }
            }
            StmtKind::Import(module) => {
                return Err(ScriptError::new(
                    ErrorKind::ModuleNotFoundError,
                    format!("No module named '{}'", module),
                ));
            }
            StmtKind::Del(targets) => {
                for target in targets {
                    self.delete(target, frame)?;
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(
        &mut self,
        var: &str,
        iterable: &Value,
        body: &[Stmt],
        orelse: &[Stmt],
        frame: &Frame,
    ) -> ScriptResult<Flow> {
        // Lists are walked live so appends during the loop are seen
        let mut index = 0usize;
        let range_count = range_len(iterable);
        let snapshot = match iterable {
            Value::List(_) | Value::Range { .. } => Vec::new(),
            other => self.iterate(other)?,
        };
        loop {
            self.check_stop()?;
            let item = match iterable {
                Value::List(items) => items.borrow().get(index).cloned(),
                Value::Range { .. } => {
                    (index < range_count).then(|| Value::Int(range_item(iterable, index)))
                }
                _ => snapshot.get(index).cloned(),
            };
            let Some(item) = item else {
                break;
            };
            index += 1;
            self.assign_name(var, item, frame);
            match self.exec_block(body, frame)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        self.exec_block(orelse, frame)
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
        frame: &Frame,
    ) -> ScriptResult<Flow> {
        let outcome = match self.exec_block(body, frame) {
            Ok(Flow::Normal) => self.exec_block(orelse, frame),
            Err(err) if !err.is_interrupt() => self.handle_exception(err, handlers, frame),
            other => other,
        };
        if finalbody.is_empty() || matches!(&outcome, Err(e) if e.is_interrupt()) {
            return outcome;
        }
        match self.exec_block(finalbody, frame)? {
            Flow::Normal => outcome,
            flow => Ok(flow),
        }
    }

    fn handle_exception(
        &mut self,
        err: ScriptError,
        handlers: &[ExceptHandler],
        frame: &Frame,
    ) -> ScriptResult<Flow> {
        for handler in handlers {
            if !self.handler_matches(handler, &err, frame)? {
                continue;
            }
            let active = Rc::new(err);
            if let Some(binding) = &handler.binding {
                self.assign_name(binding, Value::Exception(active.clone()), frame);
            }
            self.handling.push(active);
            let result = self.exec_block(&handler.body, frame);
            self.handling.pop();
            if let Some(binding) = &handler.binding {
                frame.scope.remove(binding);
            }
            return result;
        }
        Err(err)
    }

    fn handler_matches(
        &mut self,
        handler: &ExceptHandler,
        err: &ScriptError,
        frame: &Frame,
    ) -> ScriptResult<bool> {
        let Some(class) = &handler.class else {
            return Ok(true);
        };
        match self.lookup(class, frame).map_err(|e| e.at(handler.line))? {
            Value::ExceptionClass(kind) => Ok(err.kind.is_subclass_of(kind)),
            _ => Err(ScriptError::type_error(
                "catching classes that do not inherit from BaseException is not allowed",
            )
            .at(handler.line)),
        }
    }

    fn exec_aug_assign(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
        frame: &Frame,
    ) -> ScriptResult<()> {
        match target {
            Target::Name(name) => {
                let current = self.lookup(name, frame)?;
                let rhs = self.eval(value, frame)?;
                let result = self.aug_binary(op, current, rhs)?;
                self.assign_name(name, result, frame);
            }
            Target::Subscript { value: container, index } => {
                let container = self.eval(container, frame)?;
                let index = self.eval(index, frame)?;
                let current = self.get_item(&container, &index)?;
                let rhs = self.eval(value, frame)?;
                let result = self.aug_binary(op, current, rhs)?;
                self.set_item(&container, index, result)?;
            }
        }
        Ok(())
    }

    /// `+=` on a list extends it in place
    fn aug_binary(&mut self, op: BinOp, current: Value, rhs: Value) -> ScriptResult<Value> {
        if let (BinOp::Add, Value::List(items)) = (op, &current) {
            let extra = self.iterate(&rhs)?;
            items.borrow_mut().extend(extra);
            return Ok(current);
        }
        binary_op(op, &current, &rhs)
    }

    fn assign(&mut self, target: &Target, value: Value, frame: &Frame) -> ScriptResult<()> {
        match target {
            Target::Name(name) => {
                self.assign_name(name, value, frame);
                Ok(())
            }
            Target::Subscript { value: container, index } => {
                let container = self.eval(container, frame)?;
                let index = self.eval(index, frame)?;
                self.set_item(&container, index, value)
            }
        }
    }

    fn assign_name(&mut self, name: &str, value: Value, frame: &Frame) {
        match &frame.func {
            Some(def) if def.globals.iter().any(|g| g == name) => self.globals.set(name, value),
            _ => frame.scope.set(name, value),
        }
    }

    fn delete(&mut self, target: &Target, frame: &Frame) -> ScriptResult<()> {
        match target {
            Target::Name(name) => {
                let scope = match &frame.func {
                    Some(def) if def.globals.iter().any(|g| g == name) => self.globals.clone(),
                    _ => frame.scope.clone(),
                };
                scope
                    .remove(name)
                    .map(|_| ())
                    .ok_or_else(|| ScriptError::name_error(name))
            }
            Target::Subscript { value, index } => {
                let container = self.eval(value, frame)?;
                let index = self.eval(index, frame)?;
                self.del_item(&container, &index)
            }
        }
    }

    fn lookup(&self, name: &str, frame: &Frame) -> ScriptResult<Value> {
        if let Some(def) = &frame.func {
            if def.globals.iter().any(|g| g == name) {
                return self.lookup_global(name);
            }
            if def.locals.iter().any(|l| l == name) {
                return frame.scope.get_local(name).ok_or_else(|| {
                    ScriptError::new(
                        ErrorKind::UnboundLocalError,
                        format!(
                            "cannot access local variable '{}' where it is not associated with a value",
                            name
                        ),
                    )
                });
            }
            if let Some(value) = frame.scope.lookup(name) {
                return Ok(value);
            }
        }
        self.lookup_global(name)
    }

    fn lookup_global(&self, name: &str) -> ScriptResult<Value> {
        if let Some(value) = self.globals.get_local(name) {
            return Ok(value);
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(Value::Builtin(builtin));
        }
        if let Some(kind) = ErrorKind::from_name(name) {
            return Ok(Value::ExceptionClass(kind));
        }
        Err(ScriptError::name_error(name))
    }

    fn eval(&mut self, expr: &Expr, frame: &Frame) -> ScriptResult<Value> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Str(s) => Ok(Value::str(s.as_str())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::None => Ok(Value::None),
            ExprKind::Name(name) => self.lookup(name, frame),
            ExprKind::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(text) => out.push_str(text),
                        FStringPart::Field {
                            expr,
                            conversion,
                            spec,
                        } => {
                            let value = self.eval(expr, frame)?;
                            let value = match conversion {
                                Some('r') | Some('a') => Value::Str(value.repr()),
                                Some('s') => Value::Str(value.to_str()),
                                _ => value,
                            };
                            out.push_str(&format_value(&value, spec)?);
                        }
                    }
                }
                Ok(Value::Str(out))
            }
            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, frame)?);
                }
                Ok(Value::list(values))
            }
            ExprKind::Dict(entries) => {
                let mut dict = Dict::default();
                for (key, value) in entries {
                    let key = self.eval(key, frame)?;
                    let value = self.eval(value, frame)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                binary_op(*op, &left, &right)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, frame)?;
                unary_op(*op, &value)
            }
            ExprKind::Compare { left, rest } => {
                let mut left = self.eval(left, frame)?;
                for (op, right) in rest {
                    let right = self.eval(right, frame)?;
                    if !compare_op(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval(left, frame)?;
                match (op, left.truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right, frame),
                }
            }
            ExprKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition, frame)?.truthy() {
                    self.eval(then, frame)
                } else {
                    self.eval(otherwise, frame)
                }
            }
            ExprKind::Call { func, args, kwargs } => {
                let func = self.eval(func, frame)?;
                let args = self.eval_all(args, frame)?;
                let kwargs = self.eval_kwargs(kwargs, frame)?;
                self.call_value(&func, args, kwargs)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
                kwargs,
            } => {
                let receiver = self.eval(receiver, frame)?;
                let args = self.eval_all(args, frame)?;
                let kwargs = self.eval_kwargs(kwargs, frame)?;
                self.call_method(&receiver, method, args, kwargs)
            }
            ExprKind::Attribute { value, name } => {
                let value = self.eval(value, frame)?;
                match (&value, name.as_str()) {
                    (Value::Exception(err), "args") => {
                        let args = if err.message.is_empty() {
                            Vec::new()
                        } else {
                            vec![Value::str(err.message.as_str())]
                        };
                        Ok(Value::list(args))
                    }
                    _ => Err(ScriptError::new(
                        ErrorKind::AttributeError,
                        format!(
                            "'{}' object has no attribute '{}'",
                            value.type_name(),
                            name
                        ),
                    )),
                }
            }
            ExprKind::Index { value, index } => {
                let value = self.eval(value, frame)?;
                let index = self.eval(index, frame)?;
                self.get_item(&value, &index)
            }
            ExprKind::Slice {
                value,
                lower,
                upper,
                step,
            } => {
                let value = self.eval(value, frame)?;
                let lower = self.eval_bound(lower.as_deref(), frame)?;
                let upper = self.eval_bound(upper.as_deref(), frame)?;
                let step = self.eval_bound(step.as_deref(), frame)?;
                get_slice(&value, lower, upper, step)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], frame: &Frame) -> ScriptResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, frame)).collect()
    }

    fn eval_kwargs(
        &mut self,
        kwargs: &[(String, Expr)],
        frame: &Frame,
    ) -> ScriptResult<Vec<(String, Value)>> {
        kwargs
            .iter()
            .map(|(name, e)| Ok((name.clone(), self.eval(e, frame)?)))
            .collect()
    }

    fn eval_bound(&mut self, expr: Option<&Expr>, frame: &Frame) -> ScriptResult<Option<i64>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        match self.eval(expr, frame)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                ScriptError::type_error(
                    "slice indices must be integers or None or have an __index__ method",
                )
            }),
        }
    }

    /// Call any callable value
    pub(super) fn call_value(
        &mut self,
        func: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ScriptResult<Value> {
        match func {
            Value::Function(func) => self.call_function(func, args, kwargs),
            Value::Builtin(builtin) => self.call_builtin(*builtin, args, kwargs),
            Value::Type(name) => match Builtin::from_name(name) {
                Some(builtin) => self.call_builtin(builtin, args, kwargs),
                None => Err(ScriptError::type_error(format!(
                    "cannot create '{}' instances",
                    name
                ))),
            },
            Value::ExceptionClass(kind) => {
                if !kwargs.is_empty() {
                    return Err(ScriptError::type_error(format!(
                        "{}() takes no keyword arguments",
                        kind.name()
                    )));
                }
                let message = match args.as_slice() {
                    [] => String::new(),
                    [single] => single.to_str(),
                    many => many.iter().map(Value::repr).collect::<Vec<_>>().join(", "),
                };
                Ok(Value::Exception(Rc::new(ScriptError::new(*kind, message))))
            }
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        func: &Rc<Function>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> ScriptResult<Value> {
        let def = &func.def;
        if self.depth >= RECURSION_LIMIT {
            return Err(ScriptError::new(
                ErrorKind::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }

        let params = &def.params;
        if args.len() > params.len() {
            let plural = if params.len() == 1 { "" } else { "s" };
            let verb = if args.len() == 1 { "was" } else { "were" };
            return Err(ScriptError::type_error(format!(
                "{}() takes {} positional argument{} but {} {} given",
                def.name,
                params.len(),
                plural,
                args.len(),
                verb
            )));
        }

        let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
        slots.resize(params.len(), None);
        for (name, value) in kwargs {
            let Some(i) = params.iter().position(|p| p.name == name) else {
                return Err(ScriptError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    def.name, name
                )));
            };
            if slots[i].is_some() {
                return Err(ScriptError::type_error(format!(
                    "{}() got multiple values for argument '{}'",
                    def.name, name
                )));
            }
            slots[i] = Some(value);
        }

        let scope = Scope::child(func.closure.clone());
        let mut missing = Vec::new();
        for (i, param) in params.iter().enumerate() {
            match slots[i].take().or_else(|| func.defaults[i].clone()) {
                Some(value) => scope.set(&param.name, value),
                None => missing.push(format!("'{}'", param.name)),
            }
        }
        if !missing.is_empty() {
            let plural = if missing.len() == 1 { "" } else { "s" };
            return Err(ScriptError::type_error(format!(
                "{}() missing {} required positional argument{}: {}",
                def.name,
                missing.len(),
                plural,
                join_names(&missing)
            )));
        }

        let frame = Frame {
            scope,
            func: Some(def.clone()),
        };
        self.depth += 1;
        let result = self.exec_block(&def.body, &frame);
        self.depth -= 1;
        match result? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }

    /// Items of an iterable, materialized
    pub(super) fn iterate(&self, value: &Value) -> ScriptResult<Vec<Value>> {
        match value {
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Dict(dict) => Ok(dict.borrow().keys()),
            Value::Range { .. } => {
                self.check_stop()?;
                Ok(range_items(value).map(Value::Int).collect())
            }
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    pub(super) fn get_item(&self, container: &Value, index: &Value) -> ScriptResult<Value> {
        match container {
            Value::List(items) => {
                let items = items.borrow();
                let i = sequence_index(index, items.len(), "list")?;
                Ok(items[i].clone())
            }
            Value::Str(s) => {
                let count = s.chars().count();
                let i = sequence_index(index, count, "string")?;
                Ok(Value::Str(s.chars().nth(i).map(String::from).unwrap_or_default()))
            }
            Value::Range { .. } => {
                let i = sequence_index(index, range_len(container), "range object")?;
                Ok(Value::Int(range_item(container, i)))
            }
            Value::Dict(dict) => {
                if !index.is_hashable() {
                    return Err(unhashable(index));
                }
                dict.borrow()
                    .get(index)
                    .cloned()
                    .ok_or_else(|| ScriptError::new(ErrorKind::KeyError, index.repr()))
            }
            other => Err(ScriptError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    fn set_item(&self, container: &Value, index: Value, value: Value) -> ScriptResult<()> {
        match container {
            Value::List(items) => {
                let len = items.borrow().len();
                let i = sequence_index(&index, len, "list")
                    .map_err(|e| assignment_error(e, "list assignment index out of range"))?;
                items.borrow_mut()[i] = value;
                Ok(())
            }
            Value::Dict(dict) => dict.borrow_mut().insert(index, value),
            other => Err(ScriptError::type_error(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    fn del_item(&self, container: &Value, index: &Value) -> ScriptResult<()> {
        match container {
            Value::List(items) => {
                let len = items.borrow().len();
                let i = sequence_index(index, len, "list")
                    .map_err(|e| assignment_error(e, "list assignment index out of range"))?;
                items.borrow_mut().remove(i);
                Ok(())
            }
            Value::Dict(dict) => {
                if !index.is_hashable() {
                    return Err(unhashable(index));
                }
                dict.borrow_mut()
                    .remove(index)
                    .map(|_| ())
                    .ok_or_else(|| ScriptError::new(ErrorKind::KeyError, index.repr()))
            }
            other => Err(ScriptError::type_error(format!(
                "'{}' object doesn't support item deletion",
                other.type_name()
            ))),
        }
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

pub(super) fn unhashable(value: &Value) -> ScriptError {
    ScriptError::type_error(format!("unhashable type: '{}'", value.type_name()))
}

fn assignment_error(err: ScriptError, message: &str) -> ScriptError {
    if err.kind == ErrorKind::IndexError {
        ScriptError::new(ErrorKind::IndexError, message)
    } else {
        err
    }
}

/// Resolve a possibly negative index into `0..len`
fn sequence_index(index: &Value, len: usize, what: &str) -> ScriptResult<usize> {
    let Some(raw) = index.as_int() else {
        let message = if what == "string" {
            format!("string indices must be integers, not '{}'", index.type_name())
        } else {
            format!(
                "{} indices must be integers or slices, not {}",
                what,
                index.type_name()
            )
        };
        return Err(ScriptError::type_error(message));
    };
    let (raw, len) = (raw as i128, len as i128);
    let adjusted = if raw < 0 { raw + len } else { raw };
    if adjusted < 0 || adjusted >= len {
        return Err(ScriptError::new(
            ErrorKind::IndexError,
            format!("{} index out of range", what),
        ));
    }
    Ok(adjusted as usize)
}

/// Positions selected by a slice over a sequence of `len` items
pub(super) fn slice_positions(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> ScriptResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ScriptError::value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };
    let mut positions = Vec::new();
    if step > 0 {
        let mut i = lower.map_or(0, |b| clamp(b, 0, len));
        let stop = upper.map_or(len, |b| clamp(b, 0, len));
        while i < stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let mut i = lower.map_or(len - 1, |b| clamp(b, -1, len - 1));
        let stop = upper.map_or(-1, |b| clamp(b, -1, len - 1));
        while i > stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    Ok(positions)
}

fn get_slice(
    value: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> ScriptResult<Value> {
    match value {
        Value::List(items) => {
            let items = items.borrow();
            let positions = slice_positions(items.len(), lower, upper, step)?;
            Ok(Value::list(positions.into_iter().map(|i| items[i].clone()).collect()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let positions = slice_positions(chars.len(), lower, upper, step)?;
            Ok(Value::Str(positions.into_iter().map(|i| chars[i]).collect()))
        }
        Value::Range { .. } => {
            let items: Vec<i64> = range_items(value).collect();
            let positions = slice_positions(items.len(), lower, upper, step)?;
            Ok(Value::list(
                positions.into_iter().map(|i| Value::Int(items[i])).collect(),
            ))
        }
        other => Err(ScriptError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn unary_op(op: UnaryOp, value: &Value) -> ScriptResult<Value> {
    let bad = |symbol: &str| {
        ScriptError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            value.type_name()
        ))
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
        UnaryOp::Neg => match value {
            Value::Float(x) => Ok(Value::Float(-x)),
            v => match v.as_int() {
                Some(n) => n.checked_neg().map(Value::Int).ok_or_else(ScriptError::overflow),
                None => Err(bad("-")),
            },
        },
        UnaryOp::Pos => match value {
            Value::Float(x) => Ok(Value::Float(*x)),
            v => v.as_int().map(Value::Int).ok_or_else(|| bad("+")),
        },
    }
}

fn repeat_count(n: i64) -> usize {
    n.max(0) as usize
}

/// Apply a binary operator
pub fn binary_op(op: BinOp, left: &Value, right: &Value) -> ScriptResult<Value> {
    let unsupported = || {
        ScriptError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    };
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinOp::Add, Value::Str(_), other) => Err(ScriptError::type_error(format!(
            "can only concatenate str (not \"{}\") to str",
            other.type_name()
        ))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (BinOp::Add, Value::List(_), other) => Err(ScriptError::type_error(format!(
            "can only concatenate list (not \"{}\") to list",
            other.type_name()
        ))),
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let count = repeat_count(n.as_int().unwrap_or(0));
            check_repeat_size(s.len(), count)?;
            Ok(Value::Str(s.repeat(count)))
        }
        (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let count = repeat_count(n.as_int().unwrap_or(0));
            let items = items.borrow();
            check_repeat_size(items.len(), count)?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::list(out))
        }
        (op, a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => int_op(op, x, y),
            _ => float_op(
                op,
                a.as_float().unwrap_or(0.0),
                b.as_float().unwrap_or(0.0),
            ),
        },
        _ => Err(unsupported()),
    }
}

fn check_repeat_size(len: usize, count: usize) -> ScriptResult<()> {
    const MAX_ITEMS: usize = 1 << 28;
    match len.checked_mul(count) {
        Some(total) if total <= MAX_ITEMS => Ok(()),
        _ => Err(ScriptError::overflow()),
    }
}

fn int_op(op: BinOp, x: i64, y: i64) -> ScriptResult<Value> {
    let checked = |r: Option<i64>| r.map(Value::Int).ok_or_else(ScriptError::overflow);
    match op {
        BinOp::Add => checked(x.checked_add(y)),
        BinOp::Sub => checked(x.checked_sub(y)),
        BinOp::Mul => checked(x.checked_mul(y)),
        BinOp::Div => {
            if y == 0 {
                return Err(ScriptError::zero_division("division by zero"));
            }
            Ok(Value::Float(x as f64 / y as f64))
        }
        BinOp::FloorDiv => {
            if y == 0 {
                return Err(ScriptError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            let q = x.checked_div(y).ok_or_else(ScriptError::overflow)?;
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        BinOp::Mod => {
            if y == 0 {
                return Err(ScriptError::zero_division("integer modulo by zero"));
            }
            let r = x.checked_rem(y).unwrap_or(0);
            let adjust = r != 0 && ((r < 0) != (y < 0));
            Ok(Value::Int(if adjust { r + y } else { r }))
        }
        BinOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(ScriptError::zero_division(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            let exp = u32::try_from(y).map_err(|_| ScriptError::overflow())?;
            checked(x.checked_pow(exp))
        }
    }
}

fn float_op(op: BinOp, x: f64, y: f64) -> ScriptResult<Value> {
    let value = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(ScriptError::zero_division("float division by zero"));
            }
            x / y
        }
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Err(ScriptError::zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(ScriptError::zero_division("float modulo by zero"));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        BinOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(ScriptError::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(value))
}

/// Evaluate one link of a comparison chain
pub fn compare_op(op: CmpOp, left: &Value, right: &Value) -> ScriptResult<bool> {
    let ordered = |expect: fn(Ordering) -> bool| -> ScriptResult<bool> {
        left.compare(right, op.symbol()).map(expect)
    };
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Lt => ordered(|o| o == Ordering::Less),
        CmpOp::Le => ordered(|o| o != Ordering::Greater),
        CmpOp::Gt => ordered(|o| o == Ordering::Greater),
        CmpOp::Ge => ordered(|o| o != Ordering::Less),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Is => Ok(left.is_same(right)),
        CmpOp::IsNot => Ok(!left.is_same(right)),
    }
}

fn contains(container: &Value, item: &Value) -> ScriptResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(ScriptError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| v.py_eq(item))),
        Value::Dict(dict) => {
            if !item.is_hashable() {
                return Err(unhashable(item));
            }
            Ok(dict.borrow().contains_key(item))
        }
        Value::Range { start, step, .. } => Ok(match item.as_int() {
            Some(n) => {
                let offset = n as i128 - *start as i128;
                offset % *step as i128 == 0
                    && offset / (*step as i128) >= 0
                    && ((offset / *step as i128) as usize) < range_len(container)
            }
            None => range_items(container).any(|n| Value::Int(n).py_eq(item)),
        }),
        other => Err(ScriptError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::host::CaptureHost;
    use crate::script::parser::parse_program;

    fn run(source: &str) -> (String, ScriptResult<()>) {
        let source = source.to_string();
        std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || {
                let mut host = CaptureHost::new();
                let result = parse_program(&source).and_then(|program| {
                    let mut interp = Interpreter::new(&mut host);
                    interp.run(&program)
                });
                (host.output, result)
            })
            .unwrap()
            .join()
            .unwrap()
    }

    fn output(source: &str) -> String {
        let (out, result) = run(source);
        result.unwrap();
        out
    }

    fn error(source: &str) -> ScriptError {
        run(source).1.unwrap_err()
    }

    #[test]
    fn test_arithmetic_follows_python_rounding() {
        assert_eq!(output("print(7 // 2, -7 // 2, 7 % -3, -7 % 3)"), "3 -4 -2 2\n");
        assert_eq!(output("print(7 / 2, 2 ** 10, 2 ** -1)"), "3.5 1024 0.5\n");
        assert_eq!(output("print(-7.5 // 2, 5.5 % 2)"), "-4.0 1.5\n");
    }

    #[test]
    fn test_division_by_zero_messages() {
        assert_eq!(error("1 / 0").message, "division by zero");
        assert_eq!(error("1 // 0").message, "integer division or modulo by zero");
        assert_eq!(error("1 % 0").message, "integer modulo by zero");
        assert_eq!(error("1.0 / 0").message, "float division by zero");
    }

    #[test]
    fn test_integer_overflow() {
        let err = error("x = 9223372036854775807\nx = x + 1");
        assert_eq!(err.kind, ErrorKind::OverflowError);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_closures_and_defaults() {
        let src = "\
def outer(n):
    def inner(k=2):
        return n * k
    return inner

f = outer(5)
print(f(), f(3))
";
        assert_eq!(output(src), "10 15\n");
    }

    #[test]
    fn test_global_statement() {
        let src = "\
count = 0
def bump():
    global count
    count += 1
bump()
bump()
print(count)
";
        assert_eq!(output(src), "2\n");
    }

    #[test]
    fn test_unbound_local() {
        let src = "\
x = 1
def f():
    print(x)
    x = 2
f()
";
        let err = error(src);
        assert_eq!(err.kind, ErrorKind::UnboundLocalError);
        assert_eq!(
            err.message,
            "cannot access local variable 'x' where it is not associated with a value"
        );
    }

    #[test]
    fn test_argument_errors() {
        let src = "def f(a, b):\n    return a\n";
        assert_eq!(
            error(&format!("{}f(1)", src)).message,
            "f() missing 1 required positional argument: 'b'"
        );
        assert_eq!(
            error(&format!("{}f()", src)).message,
            "f() missing 2 required positional arguments: 'a' and 'b'"
        );
        assert_eq!(
            error(&format!("{}f(1, 2, 3)", src)).message,
            "f() takes 2 positional arguments but 3 were given"
        );
        assert_eq!(
            error(&format!("{}f(1, c=2)", src)).message,
            "f() got an unexpected keyword argument 'c'"
        );
    }

    #[test]
    fn test_recursion_limit() {
        let err = error("def f(n):\n    return f(n + 1)\nf(0)");
        assert_eq!(err.kind, ErrorKind::RecursionError);
        assert_eq!(output("def fact(n):\n    return 1 if n <= 1 else n * fact(n - 1)\nprint(fact(20))"),
            "2432902008176640000\n");
    }

    #[test]
    fn test_try_except_hierarchy_and_finally() {
        let src = "\
try:
    [1][5]
except LookupError as e:
    print('caught', e)
else:
    print('no error')
finally:
    print('done')
";
        assert_eq!(output(src), "caught list index out of range\ndone\n");
    }

    #[test]
    fn test_raise_and_reraise() {
        let src = "\
try:
    try:
        raise ValueError('bad value')
    except ValueError:
        print('inner')
        raise
except Exception as e:
    print(type(e), e)
";
        assert_eq!(output(src), "inner\n<class 'ValueError'> bad value\n");
        assert_eq!(error("raise").message, "No active exception to reraise");
        assert_eq!(error("raise 5").message, "exceptions must derive from BaseException");
    }

    #[test]
    fn test_uncaught_kind_passes_through() {
        let src = "\
try:
    {}['k']
except ValueError:
    print('wrong')
";
        let err = error(src);
        assert_eq!(err.kind, ErrorKind::KeyError);
        assert_eq!(err.message, "'k'");
    }

    #[test]
    fn test_loops_with_else() {
        let src = "\
for i in range(3):
    if i == 5:
        break
else:
    print('no break')
n = 0
while n < 10:
    n += 1
    if n == 3:
        break
else:
    print('unreachable')
print(n)
";
        assert_eq!(output(src), "no break\n3\n");
    }

    #[test]
    fn test_list_aliasing_and_in_place_add() {
        let src = "\
a = [1]
b = a
b += [2]
b.append(3)
print(a, a is b)
";
        assert_eq!(output(src), "[1, 2, 3] True\n");
    }

    #[test]
    fn test_slicing() {
        let src = "\
s = 'abcdef'
l = [0, 1, 2, 3, 4]
print(s[1:3], s[::-1], s[-2:], l[::2], l[3:1:-1], l[10:])
";
        assert_eq!(output(src), "bc fedcba ef [0, 2, 4] [3, 2] []\n");
    }

    #[test]
    fn test_type_errors() {
        assert_eq!(
            error("1 + 'a'").message,
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
        assert_eq!(
            error("'a' + 1").message,
            "can only concatenate str (not \"int\") to str"
        );
        assert_eq!(
            error("1 < 'a'").message,
            "'<' not supported between instances of 'int' and 'str'"
        );
        assert_eq!(error("5()").message, "'int' object is not callable");
        assert_eq!(error("x = 'abc'\nx[0] = 'z'").message,
            "'str' object does not support item assignment");
    }

    #[test]
    fn test_name_error_and_import() {
        let err = error("print(undefined_name)");
        assert_eq!(err.to_string(), "name 'undefined_name' is not defined");
        let err = error("import os");
        assert_eq!(err.kind, ErrorKind::ModuleNotFoundError);
        assert_eq!(err.message, "No module named 'os'");
    }

    #[test]
    fn test_chained_comparison_and_short_circuit() {
        assert_eq!(output("print(1 < 2 < 3, 1 < 3 < 2, 0 or 'x', 1 and 0)"), "True False x 0\n");
        assert_eq!(output("print(3 in range(0, 10, 3), 4 in range(0, 10, 3))"), "True False\n");
    }

    #[test]
    fn test_fstrings() {
        let src = "name = 'Ada'\nx = 3.14159\nprint(f'{name!r} has {x:.2f} and {len(name)}')";
        assert_eq!(output(src), "'Ada' has 3.14 and 3\n");
    }

    #[test]
    fn test_del() {
        assert_eq!(output("d = {'a': 1, 'b': 2}\ndel d['a']\nprint(d)"), "{'b': 2}\n");
        assert_eq!(error("x = 1\ndel x\nprint(x)").message, "name 'x' is not defined");
    }

    #[test]
    fn test_assert() {
        let err = error("assert 1 == 2, 'math is broken'");
        assert_eq!(err.kind, ErrorKind::AssertionError);
        assert_eq!(err.message, "math is broken");
    }
}

//! Surface AST for Zeno.
//!
//! The tree is built once by the parser and only read afterwards. The
//! `Display` impls print canonical Zeno source (every binary and unary
//! expression parenthesized), which is how tests compare tree shapes
//! without caring about spans.

use core::fmt;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.statements.iter().filter_map(|stmt| match &stmt.kind {
            StmtKind::Function(func) => Some(func),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportStatement> {
        self.statements.iter().filter_map(|stmt| match &stmt.kind {
            StmtKind::Import(import) => Some(import),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Import(ImportStatement),
    Function(FunctionDefinition),
    Let(LetDeclaration),
    Assign(AssignmentStatement),
    Return(ReturnStatement),
    Expr(Expr),
    If(IfStatement),
    While(WhileStatement),
    Loop(LoopStatement),
    Break,
    Continue,
}

/// `import { a, b as c } from "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStatement {
    pub module: String,
    pub items: Vec<ImportItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl ImportItem {
    /// Name the symbol is known by inside the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub name_span: Span,
    pub is_public: bool,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub body: Block,
}

impl FunctionDefinition {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<String>,
    pub variadic: bool,
}

/// `let` / `mut` binding. Only `mutable` bindings may be reassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct LetDeclaration {
    pub name: String,
    pub name_span: Span,
    pub ty: Option<String>,
    pub value: Expr,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStatement {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub consequence: Block,
    pub alternative: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Block),
    If(Box<IfStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatement {
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Call(FunctionCall),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `{ key: value, "other key": value }`, entries in source order.
    Map(Vec<MapEntry>),
}

impl Expr {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Integer(_) | Expr::Float(_) | Expr::String(_) | Expr::Boolean(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

/// Keys are always strings; an identifier key is taken as its name.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

// ---------------------------------------------------------------------
// Canonical source printing
// ---------------------------------------------------------------------

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => f.write_str(name),
            Expr::Integer(value) => write!(f, "{value}"),
            Expr::Float(value) => write_zeno_float(f, *value),
            Expr::String(value) => write_zeno_string(f, value),
            Expr::Boolean(value) => write!(f, "{value}"),
            Expr::Binary(bin) => write!(f, "({} {} {})", bin.left, bin.op.symbol(), bin.right),
            Expr::Unary(un) => write!(f, "({}{})", un.op.symbol(), un.operand),
            Expr::Call(call) => {
                write!(f, "{}(", call.callee)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            Expr::Map(entries) => {
                f.write_str("{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_zeno_string(f, &entry.key)?;
                    write!(f, ": {}", entry.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// The lexer has no exponent syntax, so floats are always written out in
/// plain decimal with at least one fractional digit.
fn write_zeno_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let text = value.to_string();
    if text.contains('.') {
        f.write_str(&text)
    } else {
        write!(f, "{text}.0")
    }
}

fn write_zeno_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in value.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if (c as u32) < 0x20 => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("    ")?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    f.write_str("{\n")?;
    for stmt in &block.statements {
        write_stmt(f, stmt, depth + 1)?;
    }
    indent(f, depth)?;
    f.write_str("}")
}

fn write_if(f: &mut fmt::Formatter<'_>, stmt: &IfStatement, depth: usize) -> fmt::Result {
    write!(f, "if {} ", stmt.condition)?;
    write_block(f, &stmt.consequence, depth)?;
    match &stmt.alternative {
        Some(ElseBranch::Block(block)) => {
            f.write_str(" else ")?;
            write_block(f, block, depth)
        }
        Some(ElseBranch::If(nested)) => {
            f.write_str(" else ")?;
            write_if(f, nested, depth)
        }
        None => Ok(()),
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match &stmt.kind {
        StmtKind::Import(import) => {
            f.write_str("import { ")?;
            for (i, item) in import.items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(&item.name)?;
                if let Some(alias) = &item.alias {
                    write!(f, " as {alias}")?;
                }
            }
            write!(f, " }} from ")?;
            write_zeno_string(f, &import.module)?;
        }
        StmtKind::Function(func) => {
            if func.is_public {
                f.write_str("pub ")?;
            }
            write!(f, "fn {}(", func.name)?;
            for (i, param) in func.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                if param.variadic {
                    f.write_str("...")?;
                }
                f.write_str(&param.name)?;
                if let Some(ty) = &param.ty {
                    write!(f, ": {ty}")?;
                }
            }
            f.write_str(")")?;
            if let Some(ret) = &func.return_type {
                write!(f, ": {ret}")?;
            }
            f.write_str(" ")?;
            write_block(f, &func.body, depth)?;
        }
        StmtKind::Let(decl) => {
            f.write_str(if decl.mutable { "mut " } else { "let " })?;
            f.write_str(&decl.name)?;
            if let Some(ty) = &decl.ty {
                write!(f, ": {ty}")?;
            }
            write!(f, " = {}", decl.value)?;
        }
        StmtKind::Assign(assign) => write!(f, "{} = {}", assign.name, assign.value)?,
        StmtKind::Return(ret) => match &ret.value {
            Some(value) => write!(f, "return {value}")?,
            None => f.write_str("return")?,
        },
        StmtKind::Expr(expr) => write!(f, "{expr}")?,
        StmtKind::If(stmt) => write_if(f, stmt, depth)?,
        StmtKind::While(stmt) => {
            write!(f, "while {} ", stmt.condition)?;
            write_block(f, &stmt.body, depth)?;
        }
        StmtKind::Loop(stmt) => {
            f.write_str("loop ")?;
            write_block(f, &stmt.body, depth)?;
        }
        StmtKind::Break => f.write_str("break")?,
        StmtKind::Continue => f.write_str("continue")?,
    }
    f.write_str("\n")
}

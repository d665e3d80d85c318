//! Read-only AST traversal.
//!
//! Implement [`Visitor`] and override the callbacks you care about; the
//! default bodies call the matching `walk_*` function, which recurses
//! into children. An override that still wants the children visited calls
//! the `walk_*` function itself.

use crate::ast::{
    AssignmentStatement, Block, ElseBranch, Expr, FunctionCall, FunctionDefinition, IfStatement,
    ImportStatement, LetDeclaration, LoopStatement, Program, ReturnStatement, Stmt, StmtKind,
    WhileStatement,
};
use crate::span::Span;

/// Borrowed view of any AST node, handed to analysis rules.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Stmt(&'a Stmt),
    Block(&'a Block),
    Expr(&'a Expr),
}

pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_import(&mut self, _import: &ImportStatement, _span: Span) {}

    fn visit_function(&mut self, func: &FunctionDefinition) {
        walk_function(self, func);
    }

    fn visit_let(&mut self, decl: &LetDeclaration) {
        walk_let(self, decl);
    }

    fn visit_assign(&mut self, assign: &AssignmentStatement) {
        walk_assign(self, assign);
    }

    fn visit_return(&mut self, ret: &ReturnStatement) {
        if let Some(value) = &ret.value {
            self.visit_expr(value);
        }
    }

    fn visit_if(&mut self, stmt: &IfStatement) {
        walk_if(self, stmt);
    }

    fn visit_while(&mut self, stmt: &WhileStatement) {
        self.visit_expr(&stmt.condition);
        self.visit_block(&stmt.body);
    }

    fn visit_loop(&mut self, stmt: &LoopStatement) {
        self.visit_block(&stmt.body);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_identifier(&mut self, _name: &str) {}

    fn visit_call(&mut self, call: &FunctionCall) {
        walk_call(self, call);
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for stmt in &program.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Import(import) => visitor.visit_import(import, stmt.span),
        StmtKind::Function(func) => visitor.visit_function(func),
        StmtKind::Let(decl) => visitor.visit_let(decl),
        StmtKind::Assign(assign) => visitor.visit_assign(assign),
        StmtKind::Return(ret) => visitor.visit_return(ret),
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::If(stmt) => visitor.visit_if(stmt),
        StmtKind::While(stmt) => visitor.visit_while(stmt),
        StmtKind::Loop(stmt) => visitor.visit_loop(stmt),
        StmtKind::Break | StmtKind::Continue => {}
    }
}

pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, func: &FunctionDefinition) {
    visitor.visit_block(&func.body);
}

pub fn walk_let<V: Visitor + ?Sized>(visitor: &mut V, decl: &LetDeclaration) {
    visitor.visit_expr(&decl.value);
}

pub fn walk_assign<V: Visitor + ?Sized>(visitor: &mut V, assign: &AssignmentStatement) {
    visitor.visit_expr(&assign.value);
}

pub fn walk_if<V: Visitor + ?Sized>(visitor: &mut V, stmt: &IfStatement) {
    visitor.visit_expr(&stmt.condition);
    visitor.visit_block(&stmt.consequence);
    match &stmt.alternative {
        Some(ElseBranch::Block(block)) => visitor.visit_block(block),
        Some(ElseBranch::If(nested)) => visitor.visit_if(nested),
        None => {}
    }
}

pub fn walk_block<V: Visitor + ?Sized>(visitor: &mut V, block: &Block) {
    for stmt in &block.statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Identifier(name) => visitor.visit_identifier(name),
        Expr::Integer(_) | Expr::Float(_) | Expr::String(_) | Expr::Boolean(_) => {}
        Expr::Binary(bin) => {
            visitor.visit_expr(&bin.left);
            visitor.visit_expr(&bin.right);
        }
        Expr::Unary(un) => visitor.visit_expr(&un.operand),
        Expr::Call(call) => visitor.visit_call(call),
        Expr::Array(elements) => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Expr::Map(entries) => {
            for entry in entries {
                visitor.visit_expr(&entry.value);
            }
        }
    }
}

pub fn walk_call<V: Visitor + ?Sized>(visitor: &mut V, call: &FunctionCall) {
    for arg in &call.args {
        visitor.visit_expr(arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[derive(Default)]
    struct Collector {
        identifiers: Vec<String>,
        calls: Vec<String>,
        blocks: usize,
    }

    impl Visitor for Collector {
        fn visit_identifier(&mut self, name: &str) {
            self.identifiers.push(name.to_string());
        }

        fn visit_call(&mut self, call: &FunctionCall) {
            self.calls.push(call.callee.clone());
            walk_call(self, call);
        }

        fn visit_block(&mut self, block: &Block) {
            self.blocks += 1;
            walk_block(self, block);
        }
    }

    #[test]
    fn visits_every_identifier_and_call_in_order() {
        let output = parse(
            "fn main() {\n    let a = f(b, g(c))\n    if a > d {\n        h(e)\n    } else if x {\n    } else {\n        return y\n    }\n}",
        );
        assert!(output.diagnostics.is_empty());
        let mut collector = Collector::default();
        collector.visit_program(&output.program);
        assert_eq!(collector.calls, vec!["f", "g", "h"]);
        assert_eq!(collector.identifiers, vec!["b", "c", "a", "d", "e", "x", "y"]);
        assert_eq!(collector.blocks, 4);
    }

    #[test]
    fn walks_into_collection_literals() {
        let output = parse("let doc = { key: [a, f(b)], other: c }");
        assert!(output.diagnostics.is_empty());
        let mut collector = Collector::default();
        collector.visit_program(&output.program);
        // map keys are plain strings, not identifier references
        assert_eq!(collector.identifiers, vec!["a", "b", "c"]);
        assert_eq!(collector.calls, vec!["f"]);
    }
}

//! Lexically scoped symbol tables.
//!
//! Both the analyzer and the generator walk the AST with a
//! [`SymbolTable`]: a stack of scopes where each scope's parent is the one
//! below it. A scope is pushed on function-body and block entry and popped
//! when the walk leaves it, so resolution always sees exactly the
//! bindings visible at the current point.

use std::collections::HashMap;

use crate::span::Span;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub mutable: bool,
    pub span: Span,
    /// Set once the symbol is referenced after its declaration.
    pub used: bool,
    /// Caller-assigned identity, e.g. an index into the analyzer's
    /// declaration list.
    pub decl: Option<usize>,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: Type, mutable: bool, span: Span) -> Self {
        Symbol {
            name: name.into(),
            ty,
            kind: SymbolKind::Variable,
            mutable,
            span,
            used: false,
            decl: None,
        }
    }

    pub fn parameter(name: impl Into<String>, ty: Type) -> Self {
        Symbol {
            name: name.into(),
            ty,
            kind: SymbolKind::Parameter,
            mutable: true,
            span: Span::default(),
            used: false,
            decl: None,
        }
    }

    pub fn with_decl(mut self, decl: usize) -> Self {
        self.decl = Some(decl);
        self
    }
}

/// Bindings introduced directly in one block.
#[derive(Debug, Default)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
    /// Declaration order, so popped scopes can be inspected
    /// deterministically.
    order: Vec<String>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Symbols in the order they were declared.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(|name| self.symbols.get(name))
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the outermost (file) scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope and hand it back. The file scope is never
    /// popped.
    pub fn exit_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Define `symbol` in the innermost scope.
    ///
    /// Returns the symbol it replaces when the name was already bound in
    /// that same scope; outer bindings are shadowed, not replaced.
    pub fn define(&mut self, symbol: Symbol) -> Option<Symbol> {
        let scope = self.innermost_mut();
        let name = symbol.name.clone();
        let previous = scope.symbols.insert(name.clone(), symbol);
        if previous.is_none() {
            scope.order.push(name);
        }
        previous
    }

    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.symbols.contains_key(name))
    }

    /// Walk outward from the innermost scope.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    pub fn resolve_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.symbols.get_mut(name))
    }

    /// Resolve `name` and mark it used. Returns the resolved symbol.
    pub fn mark_used(&mut self, name: &str) -> Option<&Symbol> {
        let symbol = self.resolve_mut(name)?;
        symbol.used = true;
        Some(symbol)
    }

    fn innermost_mut(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

//! Symbol usage analysis and lint rules.
//!
//! [`Analyzer::analyze`] walks one [`Program`] with a scoped symbol table
//! and fills an [`AnalysisState`]: declared vs. used variables, declared
//! vs. called functions, imported vs. used symbols. Rules see every node
//! during the walk (`inspect`) and the finished state afterwards
//! (`finalize`). Issues are advisory; callers decide whether any of them
//! is fatal.
//!
//! An assignment target counts as a use of the variable, so write-only
//! variables are not reported.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ast::{
    AssignmentStatement, Block, Expr, FunctionCall, FunctionDefinition, ImportStatement,
    LetDeclaration, Program, Stmt, StmtKind,
};
use crate::scope::{Symbol, SymbolTable};
use crate::span::Span;
use crate::types::Type;
use crate::visit::{self, Node, Visitor};

/// Calls with this prefix go straight to the native bridge and are never
/// user-defined functions.
pub const NATIVE_PREFIX: &str = "__native_";

/// One finding, rendered as `path:line:column: [rule] message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: String,
    pub line: u32,
    pub column: u32,
    pub rule: String,
    pub message: String,
}

impl Issue {
    pub fn new(rule: &str, span: Span, message: String) -> Self {
        Issue {
            path: String::new(),
            line: span.line,
            column: span.column,
            rule: rule.to_string(),
            message,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: [{}] {}",
            self.path,
            self.line.max(1),
            self.column.max(1),
            self.rule,
            self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    pub span: Span,
    pub used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSymbol {
    /// Name as visible in this file (the alias when one is given).
    pub name: String,
    pub module: String,
    pub span: Span,
}

/// Everything the walk learned about one file.
#[derive(Debug, Default)]
pub struct AnalysisState {
    pub path: String,
    /// Every `let`/`mut` binding, in declaration order.
    pub variables: Vec<VariableDecl>,
    /// Private functions other than `main`, in definition order.
    pub functions: Vec<FunctionDecl>,
    pub called_functions: HashSet<String>,
    pub imports: Vec<ImportedSymbol>,
    pub used_imports: HashSet<String>,
}

impl AnalysisState {
    pub fn unused_variables(&self) -> impl Iterator<Item = &VariableDecl> {
        self.variables.iter().filter(|v| !v.used)
    }

    pub fn unused_functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.functions
            .iter()
            .filter(|f| !self.called_functions.contains(&f.name))
    }

    pub fn unused_imports(&self) -> impl Iterator<Item = &ImportedSymbol> {
        self.imports
            .iter()
            .filter(|i| !self.used_imports.contains(&i.name))
    }

    fn is_imported(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.name == name)
    }
}

/// A pluggable analysis rule.
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Called for every node during the walk.
    fn inspect(&self, _node: Node<'_>, _program: &Program) -> Vec<Issue> {
        Vec::new()
    }

    /// Called once after the walk for whole-file checks.
    fn finalize(&self, _state: &AnalysisState) -> Vec<Issue> {
        Vec::new()
    }
}

pub struct Analyzer {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl Analyzer {
    /// An analyzer with no rules; it still fills the state.
    pub fn new() -> Self {
        Analyzer { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut analyzer = Analyzer::new();
        for rule in default_rules() {
            analyzer.register(rule);
        }
        analyzer
    }

    /// Rules report in registration order.
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn analyze(&self, program: &Program, path: &str) -> Vec<Issue> {
        self.analyze_with_state(program, path).0
    }

    pub fn analyze_with_state(&self, program: &Program, path: &str) -> (Vec<Issue>, AnalysisState) {
        let mut walk = Walk {
            state: AnalysisState {
                path: path.to_string(),
                ..AnalysisState::default()
            },
            symbols: SymbolTable::new(),
            rules: &self.rules,
            program,
            inline: self.rules.iter().map(|_| Vec::new()).collect(),
        };
        walk.visit_program(program);
        let Walk {
            state, mut inline, ..
        } = walk;

        let mut issues = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            issues.append(&mut inline[index]);
            issues.extend(rule.finalize(&state));
        }
        for issue in &mut issues {
            if issue.path.is_empty() {
                issue.path = path.to_string();
            }
        }
        debug!(path, issues = issues.len(), "analyzed program");
        (issues, state)
    }
}

/// The built-in rule set.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnusedVariableRule),
        Box::new(UnusedFunctionRule),
        Box::new(FunctionNamingRule),
        Box::new(VariableNamingRule),
        Box::new(UnusedImportRule),
    ]
}

struct Walk<'a> {
    state: AnalysisState,
    symbols: SymbolTable,
    rules: &'a [Box<dyn Rule>],
    program: &'a Program,
    /// Inline findings, one bucket per rule so output stays in rule order.
    inline: Vec<Vec<Issue>>,
}

impl Walk<'_> {
    fn inspect(&mut self, node: Node<'_>) {
        for (index, rule) in self.rules.iter().enumerate() {
            let found = rule.inspect(node, self.program);
            self.inline[index].extend(found);
        }
    }

    fn mark_name_used(&mut self, name: &str) {
        if let Some(symbol) = self.symbols.mark_used(name) {
            let decl = symbol.decl;
            if let Some(variable) = decl.and_then(|d| self.state.variables.get_mut(d)) {
                variable.used = true;
            }
            return;
        }
        if self.state.is_imported(name) {
            self.state.used_imports.insert(name.to_string());
        }
    }
}

impl Visitor for Walk<'_> {
    fn visit_program(&mut self, program: &Program) {
        self.inspect(Node::Program(program));
        visit::walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.inspect(Node::Stmt(stmt));
        visit::walk_stmt(self, stmt);
    }

    fn visit_import(&mut self, import: &ImportStatement, _span: Span) {
        for item in &import.items {
            self.state.imports.push(ImportedSymbol {
                name: item.local_name().to_string(),
                module: import.module.clone(),
                span: item.span,
            });
        }
    }

    fn visit_function(&mut self, func: &FunctionDefinition) {
        if !func.is_public && func.name != "main" {
            self.state.functions.push(FunctionDecl {
                name: func.name.clone(),
                span: func.name_span,
            });
        }
        self.symbols.enter_scope();
        for param in &func.params {
            let ty = param
                .ty
                .as_deref()
                .and_then(Type::from_annotation)
                .unwrap_or(Type::Unknown);
            self.symbols.define(Symbol::parameter(param.name.clone(), ty));
        }
        visit::walk_function(self, func);
        self.symbols.exit_scope();
    }

    fn visit_let(&mut self, decl: &LetDeclaration) {
        // The initializer sees the bindings from before this declaration.
        visit::walk_let(self, decl);
        if decl.name == "_" {
            return;
        }
        let mut symbol = Symbol::variable(decl.name.clone(), Type::Unknown, decl.mutable, decl.name_span);
        if !decl.name.starts_with('_') {
            symbol = symbol.with_decl(self.state.variables.len());
            self.state.variables.push(VariableDecl {
                name: decl.name.clone(),
                span: decl.name_span,
                used: false,
            });
        }
        self.symbols.define(symbol);
    }

    fn visit_assign(&mut self, assign: &AssignmentStatement) {
        self.mark_name_used(&assign.name);
        visit::walk_assign(self, assign);
    }

    fn visit_block(&mut self, block: &Block) {
        self.inspect(Node::Block(block));
        self.symbols.enter_scope();
        visit::walk_block(self, block);
        self.symbols.exit_scope();
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.inspect(Node::Expr(expr));
        visit::walk_expr(self, expr);
    }

    fn visit_identifier(&mut self, name: &str) {
        self.mark_name_used(name);
    }

    fn visit_call(&mut self, call: &FunctionCall) {
        if !call.callee.starts_with(NATIVE_PREFIX) {
            self.state.called_functions.insert(call.callee.clone());
            if self.state.is_imported(&call.callee) {
                self.state.used_imports.insert(call.callee.clone());
            }
        }
        visit::walk_call(self, call);
    }
}

// ---------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------

pub struct UnusedVariableRule;

impl Rule for UnusedVariableRule {
    fn name(&self) -> &'static str {
        "unused-variable"
    }

    fn finalize(&self, state: &AnalysisState) -> Vec<Issue> {
        state
            .unused_variables()
            .map(|v| {
                Issue::new(
                    self.name(),
                    v.span,
                    format!("Variable '{}' is declared but not used.", v.name),
                )
            })
            .collect()
    }
}

pub struct UnusedFunctionRule;

impl Rule for UnusedFunctionRule {
    fn name(&self) -> &'static str {
        "unused-function"
    }

    fn finalize(&self, state: &AnalysisState) -> Vec<Issue> {
        state
            .unused_functions()
            .map(|f| {
                Issue::new(
                    self.name(),
                    f.span,
                    format!("Function '{}' is defined but not used.", f.name),
                )
            })
            .collect()
    }
}

pub struct UnusedImportRule;

impl Rule for UnusedImportRule {
    fn name(&self) -> &'static str {
        "unused-import"
    }

    fn finalize(&self, state: &AnalysisState) -> Vec<Issue> {
        state
            .unused_imports()
            .map(|i| {
                Issue::new(
                    self.name(),
                    i.span,
                    format!(
                        "Imported symbol '{}' from module '{}' is not used.",
                        i.name, i.module
                    ),
                )
            })
            .collect()
    }
}

pub struct FunctionNamingRule;

impl Rule for FunctionNamingRule {
    fn name(&self) -> &'static str {
        "function-naming-convention"
    }

    fn inspect(&self, node: Node<'_>, _program: &Program) -> Vec<Issue> {
        let Node::Stmt(Stmt {
            kind: StmtKind::Function(func),
            ..
        }) = node
        else {
            return Vec::new();
        };
        if func.name == "main" || func.name == "_" {
            return Vec::new();
        }
        let message = if func.is_public && !is_upper_camel_case(&func.name) {
            format!(
                "Public function '{}' should be in UpperCamelCase (e.g., MyFunction).",
                func.name
            )
        } else if !func.is_public && !is_lower_camel_case(&func.name) {
            format!(
                "Private function '{}' should be in lowerCamelCase (e.g., myFunction).",
                func.name
            )
        } else {
            return Vec::new();
        };
        vec![Issue::new(self.name(), func.name_span, message)]
    }
}

pub struct VariableNamingRule;

impl Rule for VariableNamingRule {
    fn name(&self) -> &'static str {
        "variable-naming-convention"
    }

    fn inspect(&self, node: Node<'_>, _program: &Program) -> Vec<Issue> {
        match node {
            Node::Stmt(Stmt {
                kind: StmtKind::Let(decl),
                ..
            }) if decl.name != "_" && !is_lower_camel_case(&decl.name) => vec![Issue::new(
                self.name(),
                decl.name_span,
                format!(
                    "Variable '{}' should be in lowerCamelCase (e.g., myVariable).",
                    decl.name
                ),
            )],
            _ => Vec::new(),
        }
    }
}

pub fn is_lower_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

pub fn is_upper_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn analyze(source: &str) -> Vec<Issue> {
        let output = parse(source);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        Analyzer::with_default_rules().analyze(&output.program, "test.zeno")
    }

    fn rules_of(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule.as_str()).collect()
    }

    #[test]
    fn reports_only_the_unused_variable() {
        let issues = analyze(
            "import { println } from \"std/fmt\"\nlet x = 10; let unused = 42; let y = x + 5; println(y)",
        );
        assert_eq!(issues.len(), 1, "{issues:?}");
        assert_eq!(issues[0].rule, "unused-variable");
        assert_eq!(issues[0].message, "Variable 'unused' is declared but not used.");
        assert_eq!((issues[0].line, issues[0].column), (2, 17));
    }

    #[test]
    fn private_uncalled_function_is_reported_once() {
        let issues = analyze("fn helper() {\n}\nfn main() {\n}");
        assert_eq!(rules_of(&issues), vec!["unused-function"]);
        assert_eq!(issues[0].to_string(), "test.zeno:1:4: [unused-function] Function 'helper' is defined but not used.");
    }

    #[test]
    fn public_functions_and_main_are_never_unused() {
        let issues = analyze("pub fn Helper() {\n}\nfn main() {\n}");
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn called_function_is_not_reported() {
        let issues = analyze("fn helper() {\n}\nfn main() {\n    helper()\n}");
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn native_calls_do_not_count_as_calls() {
        let issues = analyze("fn __native_print() {\n}\nfn main() {\n    __native_print()\n}");
        assert_eq!(rules_of(&issues), vec!["unused-function", "function-naming-convention"]);
    }

    #[test]
    fn reports_unused_imports_with_module() {
        let issues = analyze("import { print, println } from \"std/fmt\"\nprintln(\"hi\")");
        assert_eq!(rules_of(&issues), vec!["unused-import"]);
        assert_eq!(
            issues[0].message,
            "Imported symbol 'print' from module 'std/fmt' is not used."
        );
        assert_eq!((issues[0].line, issues[0].column), (1, 10));
    }

    #[test]
    fn aliased_import_is_tracked_by_local_name() {
        let issues = analyze("import { println as say } from \"std/fmt\"\nsay(1)");
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn assignment_target_counts_as_use() {
        let issues = analyze("fn main() {\n    mut count = 0\n    count = 1\n}");
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn scoping_separates_same_named_variables() {
        let issues = analyze(
            "fn a() {\n    let v = 1\n}\nfn main() {\n    a()\n    let v = 2\n    if v > 1 {\n        let w = v\n    }\n}",
        );
        let lines: Vec<_> = issues.iter().map(|i| (i.message.clone(), i.line)).collect();
        assert_eq!(
            lines,
            vec![
                ("Variable 'v' is declared but not used.".to_string(), 2),
                ("Variable 'w' is declared but not used.".to_string(), 8),
            ]
        );
    }

    #[test]
    fn initializer_refers_to_previous_binding() {
        let issues = analyze("fn main() {\n    let v = 1\n    if true {\n        let v = v + 1\n    }\n}");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 4);
    }

    #[test]
    fn underscore_names_are_exempt() {
        let issues = analyze("fn main() {\n    let _ = 1\n    let _ignored = 2\n}");
        assert_eq!(rules_of(&issues), vec!["variable-naming-convention"]);
        assert!(issues[0].message.contains("'_ignored'"));
    }

    #[test]
    fn naming_rules_run_inline() {
        let issues = analyze("pub fn lower() {\n}\nfn Upper() {\n}\nfn main() {\n    Upper()\n    let Bad_name = 1\n    Bad_name\n}");
        assert_eq!(
            rules_of(&issues),
            vec![
                "function-naming-convention",
                "function-naming-convention",
                "variable-naming-convention"
            ]
        );
        assert!(issues[0].message.starts_with("Public function 'lower' should be in UpperCamelCase"));
        assert!(issues[1].message.starts_with("Private function 'Upper' should be in lowerCamelCase"));
    }

    #[test]
    fn rules_report_in_registration_order() {
        let mut analyzer = Analyzer::new();
        analyzer.register(Box::new(UnusedImportRule));
        analyzer.register(Box::new(UnusedVariableRule));
        let output = parse("import { print } from \"std/fmt\"\nlet a = 1");
        let issues = analyzer.analyze(&output.program, "x.zeno");
        assert_eq!(rules_of(&issues), vec!["unused-import", "unused-variable"]);
        assert_eq!(analyzer.rule_names(), vec!["unused-import", "unused-variable"]);
    }

    #[test]
    fn undeclared_names_are_not_analysis_issues() {
        let issues = analyze("fn main() {\n    mystery(ghost)\n}");
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn camel_case_checks() {
        assert!(is_lower_camel_case("myVar2"));
        assert!(!is_lower_camel_case("my_var"));
        assert!(!is_lower_camel_case("MyVar"));
        assert!(is_upper_camel_case("MyFunction"));
        assert!(!is_upper_camel_case("myFunction"));
        assert!(!is_upper_camel_case(""));
    }

    #[test]
    fn issue_display_substitutes_unknown_position() {
        let issue = Issue {
            path: "a.zeno".to_string(),
            line: 0,
            column: 0,
            rule: "unused-variable".to_string(),
            message: "m".to_string(),
        };
        assert_eq!(issue.to_string(), "a.zeno:1:1: [unused-variable] m");
    }
}

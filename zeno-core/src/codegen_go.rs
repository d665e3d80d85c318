//! Go backend.
//!
//! Translates a parsed [`Program`] into a single `package main` Go file.
//! The layout is fixed so output is deterministic:
//!
//! 1. `package main`
//! 2. sorted import block, only what the bridge helpers in use need
//! 3. bridge helpers, in bridge table order
//! 4. functions of imported sibling modules, in load order
//! 5. the program's own functions, in source order
//! 6. `func main()`, starting with the program's top-level statements
//!
//! Sibling modules are compiled into the same file. Their private
//! functions are renamed `<stem>_<name>` so two modules can each have a
//! helper with the same name. Modules sharing a file stem get a numbered
//! prefix (`util`, `util2`, ...) in load order.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::analysis::NATIVE_PREFIX;
use crate::ast::{
    BinaryOp, ElseBranch, Expr, FunctionCall, FunctionDefinition, IfStatement, ImportItem,
    LetDeclaration, Param, Program, Stmt, StmtKind, UnaryOp,
};
use crate::bridge::{NATIVE_FUNCTIONS, NativeFunction, find_native};
use crate::error::GenerateError;
use crate::parser::parse;
use crate::scope::{Scope, Symbol, SymbolTable};
use crate::stdlib::{ModuleResolver, ResolvedModule, std_module_exporting};
use crate::types::Type;

/// Go precedence of comparison operators; relational and equality share it.
const COMPARISON_PRECEDENCE: u8 = 3;
const UNARY_PRECEDENCE: u8 = 6;

const GO_RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "init", "nil", "panic", "fmt", "os",
    "json", "int", "float64", "bool", "string",
];

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GoOutput {
    pub source: String,
    /// Sibling modules compiled into `source`, in load order.
    pub modules: Vec<PathBuf>,
    /// Bridge primitives the program calls, in bridge table order.
    pub natives: Vec<&'static str>,
}

/// Generate Go source for `program`. `origin` is the file the program was
/// read from; relative imports are resolved next to it.
pub fn generate_go(
    program: &Program,
    origin: Option<&Path>,
    resolver: &dyn ModuleResolver,
) -> Result<GoOutput, GenerateError> {
    GoGenerator::new(resolver).generate(program, origin)
}

#[derive(Debug, Clone, PartialEq)]
struct FunctionSig {
    go_name: String,
    params: usize,
    variadic: bool,
    returns: Type,
}

impl FunctionSig {
    fn accepts(&self, given: usize) -> bool {
        if self.variadic {
            given + 1 >= self.params
        } else {
            given == self.params
        }
    }

    fn arity_description(&self) -> String {
        if self.variadic {
            format!("at least {}", self.params.saturating_sub(1))
        } else {
            self.params.to_string()
        }
    }
}

#[derive(Debug, Clone)]
enum Callee {
    User(FunctionSig),
    Native(&'static NativeFunction),
}

impl Callee {
    fn returns(&self) -> Type {
        match self {
            Callee::User(sig) => sig.returns,
            Callee::Native(native) => native.returns,
        }
    }
}

/// One source file being compiled: the entry program or a sibling module.
struct Unit {
    path: Option<PathBuf>,
    /// Set for sibling modules; prefixes their private function names.
    prefix: Option<String>,
    /// Callable names visible in the file: its own functions and imports.
    callees: HashMap<String, Callee>,
}

impl Unit {
    fn new(path: Option<PathBuf>, prefix: Option<String>) -> Self {
        Unit {
            path,
            prefix,
            callees: HashMap::new(),
        }
    }
}

/// State for the function body being emitted.
struct FnCtx {
    name: String,
    returns: Type,
    symbols: SymbolTable,
    loop_depth: usize,
}

impl FnCtx {
    fn new(name: &str, returns: Type) -> Self {
        FnCtx {
            name: name.to_string(),
            returns,
            symbols: SymbolTable::new(),
            loop_depth: 0,
        }
    }
}

pub struct GoGenerator<'r> {
    resolver: &'r dyn ModuleResolver,
    natives: HashSet<&'static str>,
    module_functions: Vec<String>,
    module_exports: HashMap<PathBuf, HashMap<String, FunctionSig>>,
    module_order: Vec<PathBuf>,
    /// Modules whose compilation is in progress, for cycle detection.
    loading: Vec<PathBuf>,
    go_names: HashSet<String>,
    /// Private-function prefixes handed out to sibling modules.
    prefixes: HashSet<String>,
}

impl<'r> GoGenerator<'r> {
    pub fn new(resolver: &'r dyn ModuleResolver) -> Self {
        GoGenerator {
            resolver,
            natives: HashSet::new(),
            module_functions: Vec::new(),
            module_exports: HashMap::new(),
            module_order: Vec::new(),
            loading: Vec::new(),
            go_names: HashSet::new(),
            prefixes: HashSet::new(),
        }
    }

    pub fn generate(
        mut self,
        program: &Program,
        origin: Option<&Path>,
    ) -> Result<GoOutput, GenerateError> {
        let mut unit = Unit::new(origin.map(Path::to_path_buf), None);
        self.collect_imports(&mut unit, program)?;
        self.declare_functions(&mut unit, program)?;

        let mut functions = Vec::new();
        let mut main = None;
        for func in program.functions() {
            if func.name == "main" {
                main = Some(func);
                continue;
            }
            functions.push(self.emit_function(&unit, func)?);
        }
        let top_level = program
            .statements
            .iter()
            .filter(|stmt| !matches!(stmt.kind, StmtKind::Import(_) | StmtKind::Function(_)));
        let main = self.emit_main(&unit, top_level, main)?;

        let used: Vec<&'static NativeFunction> = NATIVE_FUNCTIONS
            .iter()
            .filter(|native| self.natives.contains(native.name))
            .collect();
        let imports: BTreeSet<&str> = used
            .iter()
            .flat_map(|native| native.go_imports.iter().copied())
            .collect();

        let mut source = String::from("package main\n");
        if !imports.is_empty() {
            source.push_str("\nimport (\n");
            for import in &imports {
                source.push_str(&format!("\t\"{import}\"\n"));
            }
            source.push_str(")\n");
        }
        let helpers = used.iter().filter_map(|native| native.helper.map(str::to_string));
        let decls = helpers
            .chain(self.module_functions.drain(..))
            .chain(functions)
            .chain(std::iter::once(main));
        for decl in decls {
            source.push('\n');
            source.push_str(&decl);
        }

        debug!(
            bytes = source.len(),
            modules = self.module_order.len(),
            natives = used.len(),
            "generated go source"
        );
        Ok(GoOutput {
            source,
            modules: self.module_order,
            natives: used.iter().map(|native| native.name).collect(),
        })
    }

    // -----------------------------------------------------------------
    // Imports and modules
    // -----------------------------------------------------------------

    fn collect_imports(&mut self, unit: &mut Unit, program: &Program) -> Result<(), GenerateError> {
        for import in program.imports() {
            let resolved = self.resolver.resolve(&import.module, unit.path.as_deref())?;
            match resolved {
                ResolvedModule::Native(module) => {
                    for item in &import.items {
                        let native = module.export(&item.name).ok_or_else(|| {
                            GenerateError::NotExported {
                                name: item.name.clone(),
                                module: import.module.clone(),
                            }
                        })?;
                        bind_import(unit, item, Callee::Native(native))?;
                    }
                }
                ResolvedModule::Source { path, contents } => {
                    let exports = self.load_module(&path, &contents)?;
                    for item in &import.items {
                        let sig = exports.get(&item.name).cloned().ok_or_else(|| {
                            GenerateError::NotExported {
                                name: item.name.clone(),
                                module: import.module.clone(),
                            }
                        })?;
                        bind_import(unit, item, Callee::User(sig))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn load_module(
        &mut self,
        path: &Path,
        contents: &str,
    ) -> Result<HashMap<String, FunctionSig>, GenerateError> {
        if let Some(exports) = self.module_exports.get(path) {
            return Ok(exports.clone());
        }
        if self.loading.iter().any(|loading| loading == path) {
            return Err(GenerateError::ImportCycle {
                path: path.to_path_buf(),
            });
        }

        let parsed = parse(contents);
        if parsed.has_errors() {
            return Err(GenerateError::ModuleParse {
                path: path.to_path_buf(),
                diagnostics: parsed.diagnostics,
            });
        }

        debug!(module = %path.display(), "compiling sibling module");
        self.loading.push(path.to_path_buf());
        let result = self.generate_module(path, &parsed.program);
        self.loading.pop();
        let exports = result.map_err(|source| GenerateError::InModule {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        self.module_exports.insert(path.to_path_buf(), exports.clone());
        self.module_order.push(path.to_path_buf());
        Ok(exports)
    }

    fn generate_module(
        &mut self,
        path: &Path,
        program: &Program,
    ) -> Result<HashMap<String, FunctionSig>, GenerateError> {
        let prefix = self.unique_prefix(path);
        let mut unit = Unit::new(Some(path.to_path_buf()), Some(prefix));
        self.collect_imports(&mut unit, program)?;
        for stmt in &program.statements {
            if !matches!(stmt.kind, StmtKind::Import(_) | StmtKind::Function(_)) {
                warn!(
                    module = %path.display(),
                    line = stmt.span.line,
                    "ignoring top-level statement in imported module"
                );
            }
        }
        self.declare_functions(&mut unit, program)?;

        let mut exports = HashMap::new();
        for func in program.functions() {
            if func.name == "main" {
                continue;
            }
            let code = self.emit_function(&unit, func)?;
            self.module_functions.push(code);
            if func.is_public {
                if let Some(Callee::User(sig)) = unit.callees.get(&func.name) {
                    exports.insert(func.name.clone(), sig.clone());
                }
            }
        }
        Ok(exports)
    }

    fn unique_prefix(&mut self, path: &Path) -> String {
        let stem = module_prefix(path);
        let mut prefix = stem.clone();
        let mut counter = 2;
        while !self.prefixes.insert(prefix.clone()) {
            prefix = format!("{stem}{counter}");
            counter += 1;
        }
        prefix
    }

    // -----------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------

    fn declare_functions(&mut self, unit: &mut Unit, program: &Program) -> Result<(), GenerateError> {
        for func in program.functions() {
            if func.name == "main" && unit.prefix.is_some() {
                warn!(
                    module = ?unit.path,
                    "ignoring 'main' function in imported module"
                );
                continue;
            }
            if unit.callees.contains_key(&func.name) {
                return Err(GenerateError::DuplicateFunction(func.name.clone()));
            }
            let go_name = go_function_name(func, unit.prefix.as_deref());
            if !self.go_names.insert(go_name.clone()) {
                return Err(GenerateError::DuplicateFunction(func.name.clone()));
            }
            let sig = FunctionSig {
                go_name,
                params: func.params.len(),
                variadic: func.is_variadic(),
                returns: return_type(func)?,
            };
            unit.callees.insert(func.name.clone(), Callee::User(sig));
        }
        Ok(())
    }

    fn emit_function(&mut self, unit: &Unit, func: &FunctionDefinition) -> Result<String, GenerateError> {
        let returns = return_type(func)?;
        let mut params = Vec::with_capacity(func.params.len());
        let mut rendered = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = param_type(func, param)?;
            let name = go_ident(&param.name);
            if param.variadic {
                rendered.push(format!("{name} ...{}", go_type(ty)));
                // Inside the body a variadic parameter is a slice.
                params.push((param.name.clone(), Type::Unknown));
            } else {
                rendered.push(format!("{name} {}", go_type(ty)));
                params.push((param.name.clone(), ty));
            }
        }
        let go_name = match unit.callees.get(&func.name) {
            Some(Callee::User(sig)) => sig.go_name.clone(),
            _ => go_function_name(func, unit.prefix.as_deref()),
        };

        let mut ctx = FnCtx::new(&func.name, returns);
        let body = self.emit_scoped(unit, &mut ctx, &func.body.statements, &params, 1)?;
        let result = match returns {
            Type::Void => String::new(),
            ty => format!(" {}", go_type(ty)),
        };
        Ok(format!(
            "func {go_name}({}){result} {{\n{body}}}\n",
            rendered.join(", ")
        ))
    }

    fn emit_main<'a>(
        &mut self,
        unit: &Unit,
        top_level: impl Iterator<Item = &'a Stmt>,
        main: Option<&'a FunctionDefinition>,
    ) -> Result<String, GenerateError> {
        if let Some(main) = main {
            if !main.params.is_empty() || return_type(main)? != Type::Void {
                return Err(GenerateError::InvalidMain);
            }
        }
        let main_body = main.map(|func| func.body.statements.as_slice()).unwrap_or(&[]);
        let mut ctx = FnCtx::new("main", Type::Void);
        let top_level: Vec<&Stmt> = top_level.collect();
        if top_level.is_empty() {
            let body = self.emit_scoped(unit, &mut ctx, main_body, &[], 1)?;
            return Ok(format!("func main() {{\n{body}}}\n"));
        }

        // Top-level statements form the outer scope. The body of `main` is
        // a nested Go block, so its bindings may shadow top-level ones.
        ctx.symbols.enter_scope();
        let (mut chunks, vars) = self.emit_statements(unit, &mut ctx, top_level, &[], 1)?;
        if !main_body.is_empty() {
            let inner = self.emit_scoped(unit, &mut ctx, main_body, &[], 2)?;
            chunks.push(format!("\t{{\n{inner}\t}}\n"));
        }
        let scope = ctx.symbols.exit_scope();
        let body = finish_scope(chunks, vars, scope, 1);
        Ok(format!("func main() {{\n{body}}}\n"))
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    /// Emit `statements` in a fresh scope. Variables declared in the scope
    /// that are never read get a `_ = name` line after their declaration,
    /// since Go rejects unused locals.
    fn emit_scoped<'a>(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        statements: impl IntoIterator<Item = &'a Stmt>,
        params: &[(String, Type)],
        depth: usize,
    ) -> Result<String, GenerateError> {
        ctx.symbols.enter_scope();
        let result = self.emit_statements(unit, ctx, statements, params, depth);
        let scope = ctx.symbols.exit_scope();
        let (chunks, vars) = result?;
        Ok(finish_scope(chunks, vars, scope, depth))
    }

    fn emit_statements<'a>(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        statements: impl IntoIterator<Item = &'a Stmt>,
        params: &[(String, Type)],
        depth: usize,
    ) -> Result<(Vec<String>, Vec<(String, usize)>), GenerateError> {
        for (name, ty) in params {
            if ctx.symbols.define(Symbol::parameter(name, *ty)).is_some() {
                return Err(GenerateError::Redeclared(name.clone()));
            }
        }
        let mut chunks = Vec::new();
        let mut vars = Vec::new();
        for stmt in statements {
            let mut out = String::new();
            if let Some(var) = self.emit_stmt(unit, ctx, stmt, depth, &mut out)? {
                vars.push((var, chunks.len()));
            }
            chunks.push(out);
        }
        Ok((chunks, vars))
    }

    /// Returns the name of a `var` the statement declared.
    fn emit_stmt(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        stmt: &Stmt,
        depth: usize,
        out: &mut String,
    ) -> Result<Option<String>, GenerateError> {
        let ind = indent(depth);
        match &stmt.kind {
            // parser keeps these at top level, where they were handled
            StmtKind::Import(_) | StmtKind::Function(_) => {}
            StmtKind::Let(decl) => return self.emit_let(unit, ctx, decl, stmt, depth, out),
            StmtKind::Assign(assign) => {
                let value = self.emit_expr(unit, ctx, &assign.value)?;
                if assign.name != "_" {
                    let symbol = ctx
                        .symbols
                        .resolve(&assign.name)
                        .ok_or_else(|| GenerateError::UndefinedVariable(assign.name.clone()))?;
                    if !symbol.mutable {
                        return Err(GenerateError::ImmutableAssignment(assign.name.clone()));
                    }
                }
                out.push_str(&format!("{ind}{} = {value}\n", go_ident(&assign.name)));
            }
            StmtKind::Return(ret) => match &ret.value {
                Some(value) => {
                    if ctx.returns == Type::Void {
                        return Err(GenerateError::MissingReturnType(ctx.name.clone()));
                    }
                    let value = self.emit_expr(unit, ctx, value)?;
                    out.push_str(&format!("{ind}return {value}\n"));
                }
                None => out.push_str(&format!("{ind}return\n")),
            },
            StmtKind::Expr(expr) => {
                let text = self.emit_expr(unit, ctx, expr)?;
                if matches!(expr, Expr::Call(_)) {
                    out.push_str(&format!("{ind}{text}\n"));
                } else {
                    // Go only allows calls as expression statements.
                    out.push_str(&format!("{ind}_ = {text}\n"));
                }
            }
            StmtKind::If(stmt) => {
                let text = self.emit_if(unit, ctx, stmt, depth)?;
                out.push_str(&format!("{ind}{text}\n"));
            }
            StmtKind::While(stmt) => {
                let condition = self.emit_condition(unit, ctx, &stmt.condition)?;
                ctx.loop_depth += 1;
                let body = self.emit_scoped(unit, ctx, &stmt.body.statements, &[], depth + 1);
                ctx.loop_depth -= 1;
                out.push_str(&format!("{ind}for {condition} {{\n{}{ind}}}\n", body?));
            }
            StmtKind::Loop(stmt) => {
                ctx.loop_depth += 1;
                let body = self.emit_scoped(unit, ctx, &stmt.body.statements, &[], depth + 1);
                ctx.loop_depth -= 1;
                out.push_str(&format!("{ind}for {{\n{}{ind}}}\n", body?));
            }
            StmtKind::Break | StmtKind::Continue => {
                let keyword = if matches!(stmt.kind, StmtKind::Break) {
                    "break"
                } else {
                    "continue"
                };
                if ctx.loop_depth == 0 {
                    return Err(GenerateError::OutsideLoop(keyword));
                }
                out.push_str(&format!("{ind}{keyword}\n"));
            }
        }
        Ok(None)
    }

    fn emit_let(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        decl: &LetDeclaration,
        stmt: &Stmt,
        depth: usize,
        out: &mut String,
    ) -> Result<Option<String>, GenerateError> {
        let ind = indent(depth);
        let declared = match &decl.ty {
            Some(annotation) => Some(value_type(annotation, || {
                format!("variable '{}'", decl.name)
            })?),
            None => None,
        };
        let inferred = self.infer_type(unit, ctx, &decl.value);
        // The initializer is emitted before the binding exists, so
        // `let x = x + 1` in an inner block reads the outer `x`.
        let value = self.emit_expr(unit, ctx, &decl.value)?;

        if decl.name == "_" {
            out.push_str(&format!("{ind}_ = {value}\n"));
            return Ok(None);
        }
        if ctx.symbols.is_defined_locally(&decl.name) {
            return Err(GenerateError::Redeclared(decl.name.clone()));
        }

        let is_const = !decl.mutable
            && is_constant_initializer(&decl.value)
            && declared.is_none_or(|ty| ty != Type::Any);
        let keyword = if is_const { "const" } else { "var" };
        let name = go_ident(&decl.name);
        match declared {
            Some(ty) => out.push_str(&format!("{ind}{keyword} {name} {} = {value}\n", go_type(ty))),
            None => out.push_str(&format!("{ind}{keyword} {name} = {value}\n")),
        }

        let ty = declared.unwrap_or(inferred);
        let span = if decl.name_span.is_dummy() {
            stmt.span
        } else {
            decl.name_span
        };
        ctx.symbols
            .define(Symbol::variable(&decl.name, ty, decl.mutable, span));
        Ok((!is_const).then(|| decl.name.clone()))
    }

    /// `if ... { ... } else ...` without leading indentation or trailing
    /// newline, so `else if` chains can be spliced in.
    fn emit_if(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        stmt: &IfStatement,
        depth: usize,
    ) -> Result<String, GenerateError> {
        let ind = indent(depth);
        let condition = self.emit_condition(unit, ctx, &stmt.condition)?;
        let body = self.emit_scoped(unit, ctx, &stmt.consequence.statements, &[], depth + 1)?;
        let mut out = format!("if {condition} {{\n{body}{ind}}}");
        match &stmt.alternative {
            None => {}
            Some(ElseBranch::Block(block)) => {
                let body = self.emit_scoped(unit, ctx, &block.statements, &[], depth + 1)?;
                out.push_str(&format!(" else {{\n{body}{ind}}}"));
            }
            Some(ElseBranch::If(nested)) => {
                let nested = self.emit_if(unit, ctx, nested, depth)?;
                out.push_str(&format!(" else {nested}"));
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    /// Go requires a boolean condition; statically known ints, floats and
    /// strings are compared against their zero value.
    fn emit_condition(&mut self, unit: &Unit, ctx: &mut FnCtx, expr: &Expr) -> Result<String, GenerateError> {
        let zero = match self.infer_type(unit, ctx, expr) {
            Type::Int => "0",
            Type::Float => "0.0",
            Type::String => "\"\"",
            _ => return self.emit_expr(unit, ctx, expr),
        };
        let text = self.emit_operand(unit, ctx, expr, COMPARISON_PRECEDENCE, false)?;
        Ok(format!("{text} != {zero}"))
    }

    fn emit_expr(&mut self, unit: &Unit, ctx: &mut FnCtx, expr: &Expr) -> Result<String, GenerateError> {
        self.emit_operand(unit, ctx, expr, 0, false)
    }

    /// Emit `expr` as an operand of an operator with Go precedence
    /// `parent`, adding parentheses only where Go would otherwise group
    /// differently.
    fn emit_operand(
        &mut self,
        unit: &Unit,
        ctx: &mut FnCtx,
        expr: &Expr,
        parent: u8,
        is_right: bool,
    ) -> Result<String, GenerateError> {
        match expr {
            Expr::Identifier(name) => {
                if ctx.symbols.mark_used(name).is_none() {
                    return Err(GenerateError::UndefinedVariable(name.clone()));
                }
                Ok(go_ident(name))
            }
            Expr::Integer(value) => Ok(value.to_string()),
            Expr::Float(value) => Ok(format_go_float(*value)),
            Expr::String(value) => Ok(go_quote(value)),
            Expr::Boolean(value) => Ok(value.to_string()),
            Expr::Binary(bin) => {
                let precedence = go_precedence(bin.op);
                let left = self.emit_operand(unit, ctx, &bin.left, precedence, false)?;
                let right = self.emit_operand(unit, ctx, &bin.right, precedence, true)?;
                let text = format!("{left} {} {right}", bin.op.symbol());
                if precedence < parent || (precedence == parent && is_right) {
                    Ok(format!("({text})"))
                } else {
                    Ok(text)
                }
            }
            Expr::Unary(un) => {
                let operand = match un.operand.as_ref() {
                    inner @ (Expr::Binary(_) | Expr::Unary(_)) => {
                        format!("({})", self.emit_expr(unit, ctx, inner)?)
                    }
                    inner => self.emit_operand(unit, ctx, inner, UNARY_PRECEDENCE, false)?,
                };
                Ok(format!("{}{operand}", un.op.symbol()))
            }
            Expr::Call(call) => self.emit_call(unit, ctx, call),
            // Collections are dynamic values, the same shape the JSON
            // helpers produce and consume.
            Expr::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.emit_expr(unit, ctx, element)?);
                }
                Ok(format!("[]interface{{}}{{{}}}", items.join(", ")))
            }
            Expr::Map(entries) => {
                let mut items = Vec::with_capacity(entries.len());
                for entry in entries {
                    let value = self.emit_expr(unit, ctx, &entry.value)?;
                    items.push(format!("{}: {value}", go_quote(&entry.key)));
                }
                Ok(format!("map[string]interface{{}}{{{}}}", items.join(", ")))
            }
        }
    }

    fn emit_call(&mut self, unit: &Unit, ctx: &mut FnCtx, call: &FunctionCall) -> Result<String, GenerateError> {
        let callee = lookup_callee(unit, &call.callee)?;
        let (accepts, expected) = match &callee {
            Callee::User(sig) => (sig.accepts(call.args.len()), sig.arity_description()),
            Callee::Native(native) => (native.accepts(call.args.len()), native.arity_description()),
        };
        if !accepts {
            return Err(GenerateError::Arity {
                name: call.callee.clone(),
                expected,
                given: call.args.len(),
            });
        }

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.emit_expr(unit, ctx, arg)?);
        }
        let go_name = match callee {
            Callee::User(sig) => sig.go_name,
            Callee::Native(native) => {
                self.natives.insert(native.name);
                native.go_name.to_string()
            }
        };
        Ok(format!("{go_name}({})", args.join(", ")))
    }

    /// Best-effort static type; [`Type::Unknown`] when it cannot be told
    /// without a real type checker. Never marks anything used.
    fn infer_type(&self, unit: &Unit, ctx: &FnCtx, expr: &Expr) -> Type {
        match expr {
            Expr::Identifier(name) => ctx
                .symbols
                .resolve(name)
                .map(|symbol| symbol.ty)
                .unwrap_or(Type::Unknown),
            Expr::Integer(_) => Type::Int,
            Expr::Float(_) => Type::Float,
            Expr::String(_) => Type::String,
            Expr::Boolean(_) => Type::Bool,
            Expr::Binary(bin) if bin.op.is_comparison() || bin.op.is_logical() => Type::Bool,
            Expr::Binary(bin) => {
                let left = self.infer_type(unit, ctx, &bin.left);
                let right = self.infer_type(unit, ctx, &bin.right);
                left.arithmetic_result(right, bin.op == BinaryOp::Add)
            }
            Expr::Unary(un) => match un.op {
                UnaryOp::Not => Type::Bool,
                UnaryOp::Neg => {
                    let operand = self.infer_type(unit, ctx, &un.operand);
                    if operand.is_numeric() { operand } else { Type::Unknown }
                }
            },
            Expr::Call(call) => lookup_callee(unit, &call.callee)
                .map(|callee| callee.returns())
                .unwrap_or(Type::Unknown),
            Expr::Array(_) | Expr::Map(_) => Type::Any,
        }
    }
}

/// Join the chunks of a finished scope. Every variable that was never
/// read gets `_ = name` right after its declaring chunk.
fn finish_scope(
    mut chunks: Vec<String>,
    vars: Vec<(String, usize)>,
    scope: Option<Scope>,
    depth: usize,
) -> String {
    if let Some(scope) = scope {
        for (name, index) in vars {
            if scope.get(&name).is_some_and(|symbol| !symbol.used) {
                chunks[index].push_str(&format!("{}_ = {}\n", indent(depth), go_ident(&name)));
            }
        }
    }
    chunks.concat()
}

fn bind_import(unit: &mut Unit, item: &ImportItem, callee: Callee) -> Result<(), GenerateError> {
    let local = item.local_name();
    if unit.callees.insert(local.to_string(), callee).is_some() {
        return Err(GenerateError::DuplicateFunction(local.to_string()));
    }
    Ok(())
}

fn lookup_callee(unit: &Unit, name: &str) -> Result<Callee, GenerateError> {
    if let Some(callee) = unit.callees.get(name) {
        return Ok(callee.clone());
    }
    if name.starts_with(NATIVE_PREFIX) {
        if let Some(native) = find_native(name) {
            return Ok(Callee::Native(native));
        }
    }
    if let Some(module) = std_module_exporting(name) {
        return Err(GenerateError::NotImported {
            name: name.to_string(),
            module: module.path.to_string(),
        });
    }
    Err(GenerateError::UndefinedFunction(name.to_string()))
}

fn return_type(func: &FunctionDefinition) -> Result<Type, GenerateError> {
    match &func.return_type {
        None => Ok(Type::Void),
        Some(annotation) => Type::from_annotation(annotation).ok_or_else(|| {
            GenerateError::UnsupportedType {
                ty: annotation.clone(),
                context: format!("the return type of function '{}'", func.name),
            }
        }),
    }
}

fn param_type(func: &FunctionDefinition, param: &Param) -> Result<Type, GenerateError> {
    let annotation = param
        .ty
        .as_deref()
        .ok_or_else(|| GenerateError::MissingParamType {
            function: func.name.clone(),
            param: param.name.clone(),
        })?;
    value_type(annotation, || {
        format!("parameter '{}' of function '{}'", param.name, func.name)
    })
}

/// A type usable for a value: any annotation except `void`.
fn value_type(annotation: &str, context: impl FnOnce() -> String) -> Result<Type, GenerateError> {
    match Type::from_annotation(annotation) {
        Some(ty) if ty != Type::Void => Ok(ty),
        _ => Err(GenerateError::UnsupportedType {
            ty: annotation.to_string(),
            context: context(),
        }),
    }
}

pub fn go_type(ty: Type) -> &'static str {
    match ty {
        Type::Int => "int",
        Type::Float => "float64",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Any => "interface{}",
        Type::Void | Type::Unknown => "",
    }
}

fn go_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
        BinaryOp::Add | BinaryOp::Sub => 4,
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Less
        | BinaryOp::LessEq
        | BinaryOp::Greater
        | BinaryOp::GreaterEq => COMPARISON_PRECEDENCE,
        BinaryOp::And => 2,
        BinaryOp::Or => 1,
    }
}

fn is_constant_initializer(expr: &Expr) -> bool {
    match expr {
        Expr::Unary(un) => {
            un.op == UnaryOp::Neg && matches!(un.operand.as_ref(), Expr::Integer(_) | Expr::Float(_))
        }
        other => other.is_literal(),
    }
}

/// Escape identifiers that Go reserves, or that would shadow something the
/// generated code relies on.
pub fn go_ident(name: &str) -> String {
    if GO_RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn go_function_name(func: &FunctionDefinition, prefix: Option<&str>) -> String {
    if func.name == "main" && prefix.is_none() {
        return "main".to_string();
    }
    if func.is_public {
        return go_ident(&upper_first(&func.name));
    }
    match prefix {
        Some(prefix) => go_ident(&format!("{prefix}_{}", func.name)),
        None => go_ident(&lower_first(&func.name)),
    }
}

fn module_prefix(path: &Path) -> String {
    let stem: String = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match stem.chars().next() {
        Some(first) if !first.is_ascii_digit() => stem,
        Some(_) => format!("m{stem}"),
        None => "module".to_string(),
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

/// Quote `value` as a Go interpreted string literal.
pub fn go_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Floats always keep a `.` or an exponent so Go types them as float64.
pub fn format_go_float(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::MemoryResolver;

    fn generate(source: &str) -> Result<String, GenerateError> {
        generate_with(source, &MemoryResolver::new())
    }

    fn generate_with(source: &str, resolver: &MemoryResolver) -> Result<String, GenerateError> {
        let parsed = parse(source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        generate_go(&parsed.program, Some(Path::new("app/main.zeno")), resolver)
            .map(|output| output.source)
    }

    fn go(source: &str) -> String {
        match generate(source) {
            Ok(go) => go,
            Err(err) => panic!("generation failed: {err}"),
        }
    }

    #[test]
    fn hello_world() {
        let go = go("import { println } from \"std/fmt\"\nfn main() {\n    println(\"Hello, Zeno!\")\n}");
        assert_eq!(
            go,
            "package main\n\nimport (\n\t\"fmt\"\n)\n\nfunc main() {\n\tfmt.Println(\"Hello, Zeno!\")\n}\n"
        );
    }

    #[test]
    fn program_without_main_gets_one() {
        assert_eq!(go("let x = 1"), "package main\n\nfunc main() {\n\tconst x = 1\n}\n");
        assert_eq!(go(""), "package main\n\nfunc main() {\n}\n");
    }

    #[test]
    fn top_level_statements_run_before_main_body() {
        let go = go("import { println } from \"std/fmt\"\nfn main() {\n    println(2)\n}\nprintln(1)");
        let first = go.find("fmt.Println(1)").expect("top-level call");
        let second = go.find("fmt.Println(2)").expect("main call");
        assert!(first < second);
    }

    #[test]
    fn main_body_may_shadow_top_level_bindings() {
        let go = go("import { println } from \"std/fmt\"\nlet x = 1\nmut y = 2\nfn main() {\n    let x = 2\n    println(x, y)\n}");
        assert!(go.contains(
            "func main() {\n\tconst x = 1\n\tvar y = 2\n\t{\n\t\tconst x = 2\n\t\tfmt.Println(x, y)\n\t}\n}\n"
        ));
        let err = generate("let x = 1\nlet x = 2\nfn main() {\n}").unwrap_err();
        assert!(matches!(err, GenerateError::Redeclared(ref name) if name == "x"));
    }

    #[test]
    fn unread_top_level_var_is_blanked_in_outer_scope() {
        let go = go("mut total = 0\nfn main() {\n    mut total = 5\n    total = total + 1\n}");
        assert!(go.contains("\tvar total = 0\n\t_ = total\n\t{\n\t\tvar total = 5\n\t\ttotal = total + 1\n\t}\n"));
    }

    #[test]
    fn parentheses_follow_go_precedence() {
        let go = go("mut a = 1\nmut b = 2\nmut c = 3\nlet x = 2 * 3 + 4\nlet y = (2 + 3) * 4\nlet z = a - (b - c)\nlet w = a - b - c\nlet v = a == (b < c)\nlet u = -(a + b)\nlet t = !(a > b) || a < c && b > c");
        assert!(go.contains("var x = 2 * 3 + 4\n"));
        assert!(go.contains("var y = (2 + 3) * 4\n"));
        assert!(go.contains("var z = a - (b - c)\n"));
        assert!(go.contains("var w = a - b - c\n"));
        assert!(go.contains("var v = a == (b < c)\n"));
        assert!(go.contains("var u = -(a + b)\n"));
        assert!(go.contains("var t = !(a > b) || a < c && b > c\n"));
    }

    #[test]
    fn literal_lets_become_constants() {
        let go = go("fn main() {\n    let n = 5\n    let neg = -2.5\n    let s = \"hi\"\n    let typed: float = 3\n    let dynamic: any = 1\n    mut m = 1\n    m = n\n}");
        assert!(go.contains("\tconst n = 5\n"));
        assert!(go.contains("\tconst neg = -2.5\n"));
        assert!(go.contains("\tconst s = \"hi\"\n"));
        assert!(go.contains("\tconst typed float64 = 3\n"));
        assert!(go.contains("\tvar dynamic interface{} = 1\n\t_ = dynamic\n"));
        assert!(go.contains("\tvar m = 1\n\t_ = m\n\tm = n\n"));
    }

    #[test]
    fn read_variables_are_not_blanked() {
        let go = go("import { println } from \"std/fmt\"\nfn main() {\n    mut count = 0\n    while count < 3 {\n        count = count + 1\n    }\n    println(count)\n}");
        assert!(go.contains("\tvar count = 0\n\tfor count < 3 {\n\t\tcount = count + 1\n\t}\n"));
        assert!(!go.contains("_ = count"));
    }

    #[test]
    fn assigning_immutable_binding_fails() {
        let err = generate("fn main() {\n    let x = f()\n    x = 2\n}\nfn f(): int {\n    return 1\n}").unwrap_err();
        assert!(matches!(err, GenerateError::ImmutableAssignment(ref name) if name == "x"));
        assert_eq!(err.to_string(), "cannot assign twice to immutable variable 'x'");
    }

    #[test]
    fn undeclared_names_are_generation_errors() {
        let err = generate("fn main() {\n    let y = x + 1\n}").unwrap_err();
        assert_eq!(err.to_string(), "undefined variable 'x'");
        let err = generate("fn main() {\n    foo()\n}").unwrap_err();
        assert_eq!(err.to_string(), "undefined function 'foo'");
        let err = generate("fn main() {\n    x = 1\n}").unwrap_err();
        assert_eq!(err.to_string(), "undefined variable 'x'");
    }

    #[test]
    fn std_function_must_be_imported() {
        let err = generate("fn main() {\n    println(\"hi\")\n}").unwrap_err();
        assert_eq!(err.to_string(), "Function 'println' is not imported from 'std/fmt'");
        let err = generate("import { shout } from \"std/fmt\"").unwrap_err();
        assert_eq!(err.to_string(), "function 'shout' is not exported from module 'std/fmt'");
        let err = generate("import { x } from \"std/net\"").unwrap_err();
        assert_eq!(err.to_string(), "unknown module 'std/net'");
    }

    #[test]
    fn arity_is_checked() {
        let err = generate("fn add(a: int, b: int): int {\n    return a + b\n}\nlet x = add(1)").unwrap_err();
        assert_eq!(err.to_string(), "function 'add' expects 2 argument(s) but received 1");
        let err = generate("import { println } from \"std/fmt\"\nprintln()").unwrap_err();
        assert_eq!(err.to_string(), "function 'println' expects at least 1 argument(s) but received 0");
    }

    #[test]
    fn function_signatures_are_validated() {
        let err = generate("fn f(x) {\n}").unwrap_err();
        assert!(matches!(err, GenerateError::MissingParamType { ref param, .. } if param == "x"));
        let err = generate("fn f(x: int) {\n    return x\n}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function 'f' contains return statements with values but has no explicit return type"
        );
        let err = generate("fn f(x: Map) {\n}").unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedType { ref ty, .. } if ty == "Map"));
        let err = generate("fn main(): int {\n    return 1\n}").unwrap_err();
        assert!(matches!(err, GenerateError::InvalidMain));
    }

    #[test]
    fn function_names_follow_go_visibility() {
        let go = go("pub fn add(a: int, b: int): int {\n    return a + b\n}\nfn Helper(): void {\n}\nfn func(...rest: int) {\n}\nfn main() {\n    let x = add(1, 2)\n    Helper()\n    func(1, 2, 3)\n}");
        assert!(go.contains("func Add(a int, b int) int {\n\treturn a + b\n}\n"));
        assert!(go.contains("func helper() {\n}\n"));
        assert!(go.contains("func func_(rest ...int) {\n}\n"));
        assert!(go.contains("\tvar x = Add(1, 2)\n\t_ = x\n\thelper()\n\tfunc_(1, 2, 3)\n"));
    }

    #[test]
    fn reserved_identifiers_are_escaped() {
        let go = go("let range = 1\nmut x = range");
        assert!(go.contains("\tconst range_ = 1\n\tvar x = range_\n"));
    }

    #[test]
    fn conditions_compare_against_zero_values() {
        let go = go("let n = 3\nlet s = \"a\"\nmut f = 1.5\nif n {\n}\nif s {\n} else if f {\n} else {\n}\nwhile n + 1 {\n    break\n}\nif n > 1 {\n}");
        assert!(go.contains("\tif n != 0 {\n\t}\n"));
        assert!(go.contains("\tif s != \"\" {\n\t} else if f != 0.0 {\n\t} else {\n\t}\n"));
        assert!(go.contains("\tfor n + 1 != 0 {\n\t\tbreak\n\t}\n"));
        assert!(go.contains("\tif n > 1 {\n\t}\n"));
    }

    #[test]
    fn loops_and_control_flow() {
        let go = go("fn main() {\n    loop {\n        if true {\n            continue\n        }\n        break\n    }\n}");
        assert!(go.contains("\tfor {\n\t\tif true {\n\t\t\tcontinue\n\t\t}\n\t\tbreak\n\t}\n"));
        let err = generate("fn main() {\n    break\n}").unwrap_err();
        assert_eq!(err.to_string(), "'break' outside of a loop");
    }

    #[test]
    fn redeclaration_rules_match_go_scoping() {
        let err = generate("fn main() {\n    let x = 1\n    let x = 2\n}").unwrap_err();
        assert!(matches!(err, GenerateError::Redeclared(ref name) if name == "x"));
        let err = generate("fn f(x: int) {\n    let x = 2\n}\nfn main() {\n    f(1)\n}").unwrap_err();
        assert!(matches!(err, GenerateError::Redeclared(_)));
        let go = go("fn main() {\n    let x = 1\n    if true {\n        let x = 2\n    }\n}");
        assert!(go.contains("\tconst x = 1\n\tif true {\n\t\tconst x = 2\n\t}\n"));
    }

    #[test]
    fn bare_expressions_are_discarded_explicitly() {
        let go = go("let a = 1\na + 2\nlet _ = a");
        assert!(go.contains("\t_ = a + 2\n\t_ = a\n"));
    }

    #[test]
    fn collection_literals_are_dynamic_values() {
        let go = go("import { stringify } from \"std/json\"\nimport { println } from \"std/fmt\"\nlet n = 2\nlet doc = { name: \"zeno\", \"tags\": [1, n * 2, \"x\"], empty: {} }\nprintln(stringify(doc))\n[]");
        assert!(go.contains(
            "\tvar doc = map[string]interface{}{\"name\": \"zeno\", \"tags\": []interface{}{1, n * 2, \"x\"}, \"empty\": map[string]interface{}{}}\n"
        ));
        assert!(go.contains("\tfmt.Println(zenoNativeJsonStringify(doc))\n\t_ = []interface{}{}\n"));
        let err = generate("let xs = [1, missing]").unwrap_err();
        assert_eq!(err.to_string(), "undefined variable 'missing'");
    }

    #[test]
    fn strings_are_go_quoted() {
        assert_eq!(go_quote("say \"hi\"\n\tC:\\"), "\"say \\\"hi\\\"\\n\\tC:\\\\\"");
        assert_eq!(go_quote("bell\u{7}"), "\"bell\\x07\"");
        assert_eq!(go_quote("日本語"), "\"日本語\"");
        assert_eq!(format_go_float(1.0), "1.0");
        assert_eq!(format_go_float(0.25), "0.25");
    }

    #[test]
    fn helpers_and_imports_cover_only_used_primitives() {
        let go = go("import { print } from \"std/fmt\"\nimport { parse, stringify } from \"std/json\"\nlet v = parse(\"[1]\")\nprint(stringify(v), 1)");
        assert!(go.contains("import (\n\t\"encoding/json\"\n\t\"fmt\"\n\t\"os\"\n)\n"));
        assert!(go.contains("func zenoNativePrint(first interface{}, rest ...interface{}) {"));
        assert!(go.contains("func zenoNativeJsonParse(jsonString string) interface{} {"));
        assert!(!go.contains("zenoNativeReadFile"));
        assert!(go.contains("\tvar v = zenoNativeJsonParse(\"[1]\")\n\tzenoNativePrint(zenoNativeJsonStringify(v), 1)\n"));
        let helper = go.find("func zenoNativePrint").expect("print helper");
        let json = go.find("func zenoNativeJsonParse").expect("json helper");
        let main = go.find("func main").expect("main");
        assert!(helper < json && json < main);
    }

    #[test]
    fn aliased_imports_and_direct_primitives() {
        let go = go("import { println as say } from \"std/fmt\"\nimport { pwd } from \"std/os\"\nsay(pwd())\n__native_panic(\"boom\")");
        assert!(go.contains("\tfmt.Println(zenoNativeGetCurrentDirectory())\n\tpanic(\"boom\")\n"));
    }

    #[test]
    fn sibling_modules_are_compiled_in() {
        let resolver = MemoryResolver::new().with_module(
            "app/math.zeno",
            "pub fn add(a: int, b: int): int {\n    return offset(a) + b\n}\nfn offset(x: int): int {\n    return x\n}\nlet ignored = 1",
        );
        let go = generate_with(
            "import { add } from \"./math\"\nimport { println } from \"std/fmt\"\nfn main() {\n    println(add(1, 2))\n}",
            &resolver,
        )
        .expect("should generate");
        assert!(go.contains("func Add(a int, b int) int {\n\treturn math_offset(a) + b\n}\n"));
        assert!(go.contains("func math_offset(x int) int {\n\treturn x\n}\n"));
        assert!(go.contains("\tfmt.Println(Add(1, 2))\n"));
        assert!(!go.contains("ignored"));
        let module = go.find("func Add").expect("module function");
        let main = go.find("func main").expect("main");
        assert!(module < main);
    }

    #[test]
    fn sibling_module_errors_name_the_module() {
        let resolver = MemoryResolver::new().with_module("app/util.zeno", "fn hidden() {\n}");
        let err = generate_with("import { hidden } from \"./util\"", &resolver).unwrap_err();
        assert_eq!(err.to_string(), "function 'hidden' is not exported from module './util'");

        let err = generate_with("import { x } from \"./absent\"", &resolver).unwrap_err();
        assert!(matches!(err, GenerateError::ModuleNotFound { .. }));

        let broken = MemoryResolver::new().with_module("app/bad.zeno", "pub fn f(): int {\n    return y\n}");
        let err = generate_with("import { f } from \"./bad\"", &broken).unwrap_err();
        assert_eq!(err.to_string(), "in module 'app/bad.zeno': undefined variable 'y'");
    }

    #[test]
    fn same_named_modules_get_distinct_prefixes() {
        let resolver = MemoryResolver::new()
            .with_module("app/a/util.zeno", "pub fn first(): int {\n    return helper()\n}\nfn helper(): int {\n    return 1\n}")
            .with_module("app/b/util.zeno", "pub fn second(): int {\n    return helper()\n}\nfn helper(): int {\n    return 2\n}");
        let go = generate_with(
            "import { first } from \"./a/util\"\nimport { second } from \"./b/util\"\nlet total = first() + second()",
            &resolver,
        )
        .expect("should generate");
        assert!(go.contains("func First() int {\n\treturn util_helper()\n}\n"));
        assert!(go.contains("func util_helper() int {\n\treturn 1\n}\n"));
        assert!(go.contains("func Second() int {\n\treturn util2_helper()\n}\n"));
        assert!(go.contains("func util2_helper() int {\n\treturn 2\n}\n"));
    }

    #[test]
    fn import_cycles_are_detected() {
        let resolver = MemoryResolver::new()
            .with_module("app/a.zeno", "import { b } from \"./b\"\npub fn a() {\n}")
            .with_module("app/b.zeno", "import { a } from \"./a\"\npub fn b() {\n}");
        let err = generate_with("import { a } from \"./a\"", &resolver).unwrap_err();
        let GenerateError::InModule { source, .. } = err else {
            panic!("expected module error");
        };
        let GenerateError::InModule { source, .. } = *source else {
            panic!("expected nested module error");
        };
        assert!(matches!(*source, GenerateError::ImportCycle { .. }));
    }

    #[test]
    fn duplicate_go_names_are_rejected() {
        let resolver = MemoryResolver::new().with_module("app/lib.zeno", "pub fn run() {\n}");
        let err = generate_with("import { run } from \"./lib\"\npub fn run() {\n}", &resolver).unwrap_err();
        assert!(matches!(err, GenerateError::DuplicateFunction(ref name) if name == "run"));
    }

    #[test]
    fn generation_leaves_the_ast_untouched() {
        let source = "import { println } from \"std/fmt\"\npub fn sum(a: int, ...rest: int): int {\n    return a\n}\nfn main() {\n    mut i = 0\n    while i < 3 {\n        i = i + 1\n    }\n    if i == 3 {\n        println(sum(i, 1, 2) * 2 + 1)\n    } else {\n        println(-(i - 1))\n    }\n}";
        let parsed = parse(source);
        let before = parsed.program.clone();
        generate_go(&parsed.program, None, &MemoryResolver::new()).expect("should generate");
        assert_eq!(parsed.program, before);
        assert_eq!(parse(source).program.to_string(), before.to_string());
    }
}

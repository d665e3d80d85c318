use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::analysis::{Analyzer, Issue};
use crate::codegen_go::generate_go;
use crate::error::CoreError;
use crate::parser::parse;
use crate::stdlib::{FsResolver, ModuleResolver};

/// Knobs shared by every entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Add the Japanese companion text when rendering errors.
    pub emit_secondary_diagnostics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationArtifact {
    pub go_source: String,
    /// Sibling modules compiled into `go_source`, in load order.
    pub modules: Vec<PathBuf>,
    /// Bridge primitives the program calls.
    pub natives: Vec<&'static str>,
}

/// Compile Zeno source to Go. `origin` is the file the source came from;
/// relative imports are resolved next to it through `resolver`.
pub fn compile_go(
    source: &str,
    origin: Option<&Path>,
    resolver: &dyn ModuleResolver,
) -> Result<CompilationArtifact, CoreError> {
    let parsed = parse(source);
    if parsed.has_errors() {
        return Err(CoreError::Parse {
            diagnostics: parsed.diagnostics,
        });
    }
    let output = generate_go(&parsed.program, origin, resolver)?;
    debug!(
        origin = ?origin,
        modules = output.modules.len(),
        "compiled to go"
    );
    Ok(CompilationArtifact {
        go_source: output.source,
        modules: output.modules,
        natives: output.natives,
    })
}

/// Read `path` and compile it, loading sibling modules from disk.
pub fn compile_file(path: impl AsRef<Path>) -> Result<CompilationArtifact, CoreError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    compile_go(&source, Some(path), &FsResolver)
}

/// Run the default analysis rules over one file. Issues with a blank path
/// are attributed to `path`.
pub fn lint_source(source: &str, path: &str) -> Result<Vec<Issue>, CoreError> {
    let parsed = parse(source);
    if parsed.has_errors() {
        return Err(CoreError::Parse {
            diagnostics: parsed.diagnostics,
        });
    }
    Ok(Analyzer::with_default_rules().analyze(&parsed.program, path))
}

pub fn lint_file(path: impl AsRef<Path>) -> Result<Vec<Issue>, CoreError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    lint_source(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use crate::stdlib::MemoryResolver;

    #[test]
    fn compiles_hello_world() {
        let artifact = compile_go(
            "import { println } from \"std/fmt\"\n\nfn main() {\n    println(\"Hello\", 42)\n}\n",
            None,
            &MemoryResolver::new(),
        )
        .expect("compile should succeed");
        assert!(artifact.go_source.starts_with("package main\n"));
        assert!(artifact.go_source.contains("fmt.Println(\"Hello\", 42)"));
        assert_eq!(artifact.natives, vec!["__native_println"]);
        assert!(artifact.modules.is_empty());
    }

    #[test]
    fn parse_errors_block_generation() {
        let err = compile_go("let = 1\nfn main() {\n    undefined()\n}", None, &MemoryResolver::new())
            .unwrap_err();
        let CoreError::Parse { diagnostics } = err else {
            panic!("expected parse error");
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].span.line, 1);
    }

    #[test]
    fn generation_errors_surface_as_core_errors() {
        let err = compile_go("fn main() {\n    missing()\n}", None, &MemoryResolver::new()).unwrap_err();
        assert!(matches!(err, CoreError::Generate(GenerateError::UndefinedFunction(_))));
        let rendered = err.render(Some("main.zeno"), &CompileOptions { emit_secondary_diagnostics: true });
        assert!(rendered.contains("error: undefined function 'missing'"));
        assert!(rendered.contains("日本語"));
    }

    #[test]
    fn compiles_file_with_sibling_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main = dir.path().join("main.zeno");
        std::fs::write(
            &main,
            "import { double } from \"./util\"\nimport { println } from \"std/fmt\"\nfn main() {\n    println(double(21))\n}\n",
        )
        .expect("write main");
        std::fs::write(
            dir.path().join("util.zeno"),
            "pub fn double(x: int): int {\n    return x * 2\n}\n",
        )
        .expect("write util");

        let artifact = compile_file(&main).expect("compile should succeed");
        assert!(artifact.go_source.contains("func Double(x int) int {"));
        assert!(artifact.go_source.contains("fmt.Println(Double(21))"));
        assert_eq!(artifact.modules.len(), 1);
        assert!(artifact.modules[0].ends_with("util.zeno"));
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = compile_file(dir.path().join("nope.zeno")).unwrap_err();
        assert!(matches!(err, CoreError::SourceIo(_)));
    }

    #[test]
    fn lint_reports_unused_variable_once() {
        let issues = lint_source(
            "import { println } from \"std/fmt\"\nlet x = 10; let unused = 42; let y = x + 5; println(y)",
            "demo.zeno",
        )
        .expect("lint should succeed");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "unused-variable");
        assert!(issues[0].message.contains("'unused'"));
        assert!(issues[0].to_string().starts_with("demo.zeno:2:"));
    }

    #[test]
    fn lint_does_not_report_undeclared_names() {
        let issues = lint_source("fn main() {\n    ghost(phantom)\n}", "x.zeno").expect("lint should succeed");
        assert!(issues.is_empty());
    }

    #[test]
    fn lint_file_uses_the_file_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lonely.zeno");
        std::fs::write(&path, "fn helper() {\n}\nfn main() {\n}\n").expect("write");
        let issues = lint_file(&path).expect("lint should succeed");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "unused-function");
        assert_eq!(issues[0].path, path.display().to_string());
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompileOptions;
use crate::diagnostic::{Diagnostic, Localized};

/// Errors raised while turning a parsed program into Go source.
///
/// Generation errors are fatal for the compilation unit; no partial output
/// is returned.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("Function '{name}' is not imported from '{module}'")]
    NotImported { name: String, module: String },
    #[error("function '{name}' is not exported from module '{module}'")]
    NotExported { name: String, module: String },
    #[error("unknown module '{0}'")]
    UnknownModule(String),
    #[error("failed to read module file '{}': {source}", path.display())]
    ModuleNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse errors in module '{}'", path.display())]
    ModuleParse {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
    #[error("import cycle detected through module '{}'", path.display())]
    ImportCycle { path: PathBuf },
    #[error("in module '{}': {source}", path.display())]
    InModule {
        path: PathBuf,
        source: Box<GenerateError>,
    },
    #[error("unsupported type '{ty}' for {context}")]
    UnsupportedType { ty: String, context: String },
    #[error("parameter '{param}' of function '{function}' must have an explicit type")]
    MissingParamType { function: String, param: String },
    #[error("Function '{0}' contains return statements with values but has no explicit return type")]
    MissingReturnType(String),
    #[error("function 'main' cannot take parameters or return a value")]
    InvalidMain,
    #[error("cannot assign twice to immutable variable '{0}'")]
    ImmutableAssignment(String),
    #[error("variable '{0}' is already declared in this scope")]
    Redeclared(String),
    #[error("function '{0}' is defined more than once")]
    DuplicateFunction(String),
    #[error("function '{name}' expects {expected} argument(s) but received {given}")]
    Arity {
        name: String,
        expected: String,
        given: usize,
    },
    #[error("'{0}' outside of a loop")]
    OutsideLoop(&'static str),
}

impl GenerateError {
    /// The syntax errors of a sibling module, looking through any number
    /// of `InModule` layers.
    pub fn module_parse_errors(&self) -> Option<(&PathBuf, &[Diagnostic])> {
        match self {
            GenerateError::ModuleParse { path, diagnostics } => Some((path, diagnostics)),
            GenerateError::InModule { source, .. } => source.module_parse_errors(),
            _ => None,
        }
    }
}

impl Localized for GenerateError {
    fn secondary_message(&self) -> String {
        match self {
            GenerateError::UndefinedVariable(name) => format!("変数 '{name}' は定義されていません"),
            GenerateError::UndefinedFunction(name) => format!("関数 '{name}' は定義されていません"),
            GenerateError::NotImported { name, module } => {
                format!("関数 '{name}' は '{module}' からインポートされていません")
            }
            GenerateError::NotExported { name, module } => {
                format!("関数 '{name}' はモジュール '{module}' からエクスポートされていません")
            }
            GenerateError::UnknownModule(module) => format!("不明なモジュール '{module}'"),
            GenerateError::ModuleNotFound { path, .. } => {
                format!("モジュールファイル '{}' を読み込めません", path.display())
            }
            GenerateError::ModuleParse { path, .. } => {
                format!("モジュール '{}' に構文エラーがあります", path.display())
            }
            GenerateError::ImportCycle { path } => {
                format!("モジュール '{}' で循環インポートが検出されました", path.display())
            }
            GenerateError::InModule { path, source } => {
                format!("モジュール '{}' 内: {}", path.display(), source.secondary_message())
            }
            GenerateError::UnsupportedType { ty, context } => {
                format!("{context} の型 '{ty}' はサポートされていません")
            }
            GenerateError::MissingParamType { function, param } => {
                format!("関数 '{function}' の引数 '{param}' には型注釈が必要です")
            }
            GenerateError::MissingReturnType(name) => {
                format!("関数 '{name}' は値を返していますが、戻り値の型が指定されていません")
            }
            GenerateError::InvalidMain => {
                "関数 'main' は引数や戻り値を持つことができません".to_string()
            }
            GenerateError::ImmutableAssignment(name) => {
                format!("不変変数 '{name}' に再代入することはできません")
            }
            GenerateError::Redeclared(name) => {
                format!("変数 '{name}' はこのスコープで既に宣言されています")
            }
            GenerateError::DuplicateFunction(name) => format!("関数 '{name}' が重複して定義されています"),
            GenerateError::Arity {
                name,
                expected,
                given,
            } => format!("関数 '{name}' は {expected} 個の引数を必要としますが、{given} 個渡されました"),
            GenerateError::OutsideLoop(what) => format!("'{what}' はループの外では使用できません"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("parsing failed with {} error(s)", diagnostics.len())]
    Parse { diagnostics: Vec<Diagnostic> },
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl CoreError {
    /// User-facing text, one block per underlying error. The secondary
    /// language text is added when `options` asks for it.
    pub fn render(&self, path: Option<&str>, options: &CompileOptions) -> String {
        let show_secondary = options.emit_secondary_diagnostics;
        match self {
            CoreError::Parse { diagnostics } => diagnostics
                .iter()
                .map(|d| d.render(path, show_secondary))
                .collect(),
            CoreError::Generate(err) => {
                let secondary = err.secondary_message();
                let mut out = render_plain(&err.to_string(), Some(&secondary), show_secondary);
                if let Some((module, diagnostics)) = err.module_parse_errors() {
                    let module = module.display().to_string();
                    for diagnostic in diagnostics {
                        out.push_str(&diagnostic.render(Some(&module), show_secondary));
                    }
                }
                out
            }
            CoreError::SourceIo(_) => render_plain(
                &self.to_string(),
                Some("ソースファイルを読み込めません"),
                show_secondary,
            ),
        }
    }

    /// Primary messages only, one per underlying error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CoreError::Parse { diagnostics } => diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.span, d.message))
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

fn render_plain(message: &str, secondary: Option<&str>, show_secondary: bool) -> String {
    let mut out = format!("error: {message}\n");
    if show_secondary {
        if let Some(secondary) = secondary {
            out.push_str(&format!("   = 日本語: {secondary}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    #[test]
    fn generation_error_renders_secondary_on_request() {
        let err = CoreError::from(GenerateError::UndefinedFunction("foo".to_string()));
        let plain = err.render(None, &CompileOptions::default());
        assert_eq!(plain, "error: undefined function 'foo'\n");
        let both = err.render(None, &CompileOptions { emit_secondary_diagnostics: true });
        assert!(both.starts_with(&plain));
        assert!(both.contains("関数 'foo' は定義されていません"));
    }

    #[test]
    fn parse_error_renders_every_diagnostic() {
        let err = CoreError::Parse {
            diagnostics: vec![
                Diagnostic::error("first", Span::new(0, 1, 1, 1)),
                Diagnostic::error("second", Span::new(5, 6, 2, 3)),
            ],
        };
        assert_eq!(err.to_string(), "parsing failed with 2 error(s)");
        let text = err.render(Some("main.zeno"), &CompileOptions::default());
        assert!(text.contains("error: first\n  --> main.zeno:1:1"));
        assert!(text.contains("error: second\n  --> main.zeno:2:3"));
        assert_eq!(err.messages(), vec!["1:1: first", "2:3: second"]);
    }

    #[test]
    fn nested_module_errors_keep_both_messages() {
        let err = GenerateError::InModule {
            path: PathBuf::from("lib/math.zeno"),
            source: Box::new(GenerateError::UndefinedVariable("x".to_string())),
        };
        assert_eq!(err.to_string(), "in module 'lib/math.zeno': undefined variable 'x'");
        assert!(err.secondary_message().contains("変数 'x'"));
    }

    #[test]
    fn module_parse_errors_render_through_module_layers() {
        let err = CoreError::from(GenerateError::InModule {
            path: PathBuf::from("app/a.zeno"),
            source: Box::new(GenerateError::ModuleParse {
                path: PathBuf::from("app/b.zeno"),
                diagnostics: vec![Diagnostic::error("broken", Span::new(4, 5, 3, 2))],
            }),
        });
        let text = err.render(None, &CompileOptions::default());
        assert!(text.starts_with("error: in module 'app/a.zeno': parse errors in module 'app/b.zeno'\n"));
        assert!(text.contains("error: broken\n  --> app/b.zeno:3:2"), "{text}");
    }

    #[test]
    fn not_imported_message_is_capitalized() {
        let err = GenerateError::NotImported {
            name: "println".to_string(),
            module: "std/fmt".to_string(),
        };
        assert_eq!(err.to_string(), "Function 'println' is not imported from 'std/fmt'");
    }
}

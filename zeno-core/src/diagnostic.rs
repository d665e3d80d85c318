//! Diagnostics shared by the parser and the generator.
//!
//! Every diagnostic carries a primary (English) message and a Japanese
//! companion message. Rendering decides whether the companion is shown;
//! the primary text never changes.

use core::fmt;

use crate::span::Span;

/// Errors that can describe themselves in the secondary language.
pub trait Localized {
    /// 日本語のメッセージ
    fn secondary_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub code: Option<&'static str>,
    pub span: Span,
    pub expected: Option<String>,
    pub got: Option<String>,
    pub help: Option<String>,
    pub secondary: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            code: None,
            span,
            expected: None,
            got: None,
            help: None,
            secondary: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_mismatch(mut self, expected: impl Into<String>, got: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.got = Some(got.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    /// Renders the diagnostic in the multi-line terminal format:
    ///
    /// ```text
    /// error[E0101]: expected next token to be ')', got '}' instead
    ///   --> main.zeno:3:5
    ///    = expected ')', but got '}'
    /// help: close the argument list with ')'
    /// ```
    pub fn render(&self, path: Option<&str>, show_secondary: bool) -> String {
        let mut out = String::new();
        match self.code {
            Some(code) => out.push_str(&format!("error[{code}]: {}\n", self.message)),
            None => out.push_str(&format!("error: {}\n", self.message)),
        }
        if !self.span.is_dummy() {
            match path {
                Some(path) => out.push_str(&format!("  --> {}:{}\n", path, self.span)),
                None => out.push_str(&format!("  --> line {}, column {}\n", self.span.line, self.span.column)),
            }
        }
        if let (Some(expected), Some(got)) = (&self.expected, &self.got) {
            out.push_str(&format!("   = expected {expected}, but got {got}\n"));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("help: {help}\n"));
        }
        if show_secondary {
            if let Some(secondary) = &self.secondary {
                out.push_str(&format!("   = 日本語: {secondary}\n"));
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

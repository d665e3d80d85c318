//! Standard library table and module resolution.
//!
//! `std/...` imports never touch the filesystem: every exported std
//! function maps directly onto a bridge primitive. Relative imports
//! (`./x`, `../x`) name sibling `.zeno` files and are loaded through a
//! [`ModuleResolver`], so tests and embedders can serve them from memory.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::trace;

use crate::bridge::{NativeFunction, find_native};
use crate::error::GenerateError;

pub const SOURCE_EXTENSION: &str = "zeno";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdModule {
    pub path: &'static str,
    /// (exported name, bridge primitive)
    pub exports: &'static [(&'static str, &'static str)],
}

impl StdModule {
    pub fn export(&self, name: &str) -> Option<&'static NativeFunction> {
        self.exports
            .iter()
            .find(|(export, _)| *export == name)
            .and_then(|(_, native)| find_native(native))
    }
}

pub const STD_MODULES: &[StdModule] = &[
    StdModule {
        path: "std/fmt",
        exports: &[("print", "__native_print"), ("println", "__native_println")],
    },
    StdModule {
        path: "std/io",
        exports: &[
            ("readFile", "__native_read_file"),
            ("writeFile", "__native_write_file"),
            ("remove", "__native_remove"),
            ("getCurrentDirectory", "__native_getwd"),
        ],
    },
    StdModule {
        path: "std/json",
        exports: &[("parse", "__native_json_parse"), ("stringify", "__native_json_stringify")],
    },
    StdModule {
        path: "std/os",
        exports: &[("panic", "__native_panic"), ("pwd", "__native_getwd")],
    },
];

pub fn find_std_module(path: &str) -> Option<&'static StdModule> {
    STD_MODULES.iter().find(|module| module.path == path)
}

/// First std module exporting `name`, used to suggest a missing import.
pub fn std_module_exporting(name: &str) -> Option<&'static StdModule> {
    STD_MODULES
        .iter()
        .find(|module| module.exports.iter().any(|(export, _)| *export == name))
}

pub fn is_std_path(path: &str) -> bool {
    path.starts_with("std/")
}

pub fn is_relative_path(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../")
}

/// What an import path points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedModule {
    Native(&'static StdModule),
    Source { path: PathBuf, contents: String },
}

/// Source of imported modules.
pub trait ModuleResolver {
    /// Resolve `import` as written in a file located at `importer`
    /// (`None` for source that did not come from a file).
    fn resolve(&self, import: &str, importer: Option<&Path>) -> Result<ResolvedModule, GenerateError>;
}

/// Location of a relative import: the importer's directory joined with the
/// import path, with `.zeno` appended when no extension was written.
pub fn sibling_path(import: &str, importer: Option<&Path>) -> PathBuf {
    let base = importer
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut path = base.join(import);
    if path.extension().is_none() {
        path.set_extension(SOURCE_EXTENSION);
    }
    normalize(&path)
}

/// Lexically drop `.` components and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                match last {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir) => {}
                    _ => out.push(".."),
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn resolve_std(import: &str) -> Result<ResolvedModule, GenerateError> {
    find_std_module(import)
        .map(ResolvedModule::Native)
        .ok_or_else(|| GenerateError::UnknownModule(import.to_string()))
}

/// Reads sibling modules from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl ModuleResolver for FsResolver {
    fn resolve(&self, import: &str, importer: Option<&Path>) -> Result<ResolvedModule, GenerateError> {
        if is_std_path(import) {
            return resolve_std(import);
        }
        if !is_relative_path(import) {
            return Err(GenerateError::UnknownModule(import.to_string()));
        }
        let path = sibling_path(import, importer);
        trace!(import, path = %path.display(), "reading module from disk");
        let contents = fs::read_to_string(&path).map_err(|source| GenerateError::ModuleNotFound {
            path: path.clone(),
            source,
        })?;
        Ok(ResolvedModule::Source { path, contents })
    }
}

/// Serves sibling modules from an in-memory map keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    files: HashMap<PathBuf, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), contents.into());
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(&self, import: &str, importer: Option<&Path>) -> Result<ResolvedModule, GenerateError> {
        if is_std_path(import) {
            return resolve_std(import);
        }
        if !is_relative_path(import) {
            return Err(GenerateError::UnknownModule(import.to_string()));
        }
        let path = sibling_path(import, importer);
        trace!(import, path = %path.display(), "looking up in-memory module");
        match self.files.get(&path) {
            Some(contents) => Ok(ResolvedModule::Source {
                path,
                contents: contents.clone(),
            }),
            None => Err(GenerateError::ModuleNotFound {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory module"),
            }),
        }
    }
}

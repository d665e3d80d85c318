//! Basic types of the Zeno language.
//!
//! Zeno only has a handful of primitive types. Bindings without an
//! annotation get whatever can be read off their initializer, or
//! [`Type::Unknown`] when that is not obvious. There is no real type
//! inference.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    /// Dynamic value, e.g. the result of `json.parse`.
    Any,
    /// Absence of a result. Only valid as a return type.
    Void,
    /// Placeholder for bindings whose type was not annotated and could
    /// not be read off the initializer.
    Unknown,
}

impl Type {
    /// Resolve a type annotation as written in source.
    pub fn from_annotation(name: &str) -> Option<Type> {
        let ty = match name {
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "string" => Type::String,
            "any" => Type::Any,
            "void" => Type::Void,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Result type of `+ - * / %` applied to `self` and `other`.
    ///
    /// * int op int       = int
    /// * float op numeric = float
    /// * string + string  = string
    ///
    /// Anything else is Unknown; the generator leaves the check to Go.
    pub fn arithmetic_result(self, other: Type, is_add: bool) -> Type {
        match (self, other) {
            (Type::Int, Type::Int) => Type::Int,
            (Type::Float, t) | (t, Type::Float) if t.is_numeric() => Type::Float,
            (Type::String, Type::String) if is_add => Type::String,
            _ => Type::Unknown,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::String => "string",
            Type::Any => "any",
            Type::Void => "void",
            Type::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_annotations() {
        assert_eq!(Type::from_annotation("float"), Some(Type::Float));
        assert_eq!(Type::from_annotation("any"), Some(Type::Any));
        assert_eq!(Type::from_annotation("Result"), None);
    }

    #[test]
    fn arithmetic_promotes_to_float() {
        assert_eq!(Type::Int.arithmetic_result(Type::Int, false), Type::Int);
        assert_eq!(Type::Int.arithmetic_result(Type::Float, false), Type::Float);
        assert_eq!(Type::Float.arithmetic_result(Type::Int, true), Type::Float);
    }

    #[test]
    fn only_addition_concatenates_strings() {
        assert_eq!(Type::String.arithmetic_result(Type::String, true), Type::String);
        assert_eq!(Type::String.arithmetic_result(Type::String, false), Type::Unknown);
        assert_eq!(Type::Bool.arithmetic_result(Type::Int, true), Type::Unknown);
    }
}

//! Native bridge primitives.
//!
//! Standard-library functions bottom out in a fixed set of `__native_*`
//! primitives. Each one maps to a Go expression, optionally backed by a
//! helper function that the generator emits once per program when the
//! primitive is actually called.

use crate::types::Type;

/// Descriptor for one bridge primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFunction {
    /// Name at the Zeno level, always prefixed with `__native_`.
    pub name: &'static str,
    /// Go callee emitted at the call site.
    pub go_name: &'static str,
    /// Parameter types. With `variadic` set, the last entry repeats.
    pub params: &'static [Type],
    pub variadic: bool,
    pub returns: Type,
    /// Go source of the helper, if `go_name` is not provided by Go itself.
    pub helper: Option<&'static str>,
    /// Go packages the call site or the helper needs.
    pub go_imports: &'static [&'static str],
}

impl NativeFunction {
    /// Minimum number of arguments a call must supply.
    pub fn min_args(&self) -> usize {
        if self.variadic {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        }
    }

    pub fn accepts(&self, given: usize) -> bool {
        if self.variadic {
            given >= self.min_args()
        } else {
            given == self.params.len()
        }
    }

    /// Human-readable arity, e.g. `2` or `at least 1`.
    pub fn arity_description(&self) -> String {
        if self.variadic {
            format!("at least {}", self.min_args())
        } else {
            self.params.len().to_string()
        }
    }
}

const PRINT_HELPER: &str = "func zenoNativePrint(first interface{}, rest ...interface{}) {
\tfmt.Print(first)
\tfor _, arg := range rest {
\t\tfmt.Print(\" \", arg)
\t}
}
";

const READ_FILE_HELPER: &str = "func zenoNativeReadFile(filename string) string {
\tdata, err := os.ReadFile(filename)
\tif err != nil {
\t\tfmt.Printf(\"Error reading file %s: %v\\n\", filename, err)
\t\treturn \"\"
\t}
\treturn string(data)
}
";

const WRITE_FILE_HELPER: &str = "func zenoNativeWriteFile(filename string, content string) bool {
\terr := os.WriteFile(filename, []byte(content), 0644)
\tif err != nil {
\t\tfmt.Printf(\"Error writing file %s: %v\\n\", filename, err)
\t\treturn false
\t}
\treturn true
}
";

const REMOVE_HELPER: &str = "func zenoNativeRemove(path string) bool {
\terr := os.Remove(path)
\tif err != nil {
\t\tfmt.Fprintf(os.Stderr, \"Error removing %s: %v\\n\", path, err)
\t\treturn false
\t}
\treturn true
}
";

const GETWD_HELPER: &str = "func zenoNativeGetCurrentDirectory() string {
\tpwd, err := os.Getwd()
\tif err != nil {
\t\tfmt.Fprintf(os.Stderr, \"Error getting current directory: %v\\n\", err)
\t\treturn \"\"
\t}
\treturn pwd
}
";

const JSON_PARSE_HELPER: &str = "func zenoNativeJsonParse(jsonString string) interface{} {
\tvar result interface{}
\terr := json.Unmarshal([]byte(jsonString), &result)
\tif err != nil {
\t\tfmt.Fprintf(os.Stderr, \"Error parsing JSON string '%s': %v\\n\", jsonString, err)
\t\treturn nil
\t}
\treturn result
}
";

const JSON_STRINGIFY_HELPER: &str = "func zenoNativeJsonStringify(value interface{}) string {
\tjsonBytes, err := json.Marshal(value)
\tif err != nil {
\t\tfmt.Fprintf(os.Stderr, \"Error stringifying to JSON for value '%v': %v\\n\", value, err)
\t\treturn \"\"
\t}
\treturn string(jsonBytes)
}
";

/// Every primitive the generator understands.
pub const NATIVE_FUNCTIONS: &[NativeFunction] = &[
    NativeFunction {
        name: "__native_print",
        go_name: "zenoNativePrint",
        params: &[Type::Any, Type::Any],
        variadic: true,
        returns: Type::Void,
        helper: Some(PRINT_HELPER),
        go_imports: &["fmt"],
    },
    NativeFunction {
        name: "__native_println",
        go_name: "fmt.Println",
        params: &[Type::Any, Type::Any],
        variadic: true,
        returns: Type::Void,
        helper: None,
        go_imports: &["fmt"],
    },
    NativeFunction {
        name: "__native_panic",
        go_name: "panic",
        params: &[Type::Any],
        variadic: false,
        returns: Type::Void,
        helper: None,
        go_imports: &[],
    },
    NativeFunction {
        name: "__native_read_file",
        go_name: "zenoNativeReadFile",
        params: &[Type::String],
        variadic: false,
        returns: Type::String,
        helper: Some(READ_FILE_HELPER),
        go_imports: &["fmt", "os"],
    },
    NativeFunction {
        name: "__native_write_file",
        go_name: "zenoNativeWriteFile",
        params: &[Type::String, Type::String],
        variadic: false,
        returns: Type::Bool,
        helper: Some(WRITE_FILE_HELPER),
        go_imports: &["fmt", "os"],
    },
    NativeFunction {
        name: "__native_remove",
        go_name: "zenoNativeRemove",
        params: &[Type::String],
        variadic: false,
        returns: Type::Bool,
        helper: Some(REMOVE_HELPER),
        go_imports: &["fmt", "os"],
    },
    NativeFunction {
        name: "__native_getwd",
        go_name: "zenoNativeGetCurrentDirectory",
        params: &[],
        variadic: false,
        returns: Type::String,
        helper: Some(GETWD_HELPER),
        go_imports: &["fmt", "os"],
    },
    NativeFunction {
        name: "__native_json_parse",
        go_name: "zenoNativeJsonParse",
        params: &[Type::String],
        variadic: false,
        returns: Type::Any,
        helper: Some(JSON_PARSE_HELPER),
        go_imports: &["encoding/json", "fmt", "os"],
    },
    NativeFunction {
        name: "__native_json_stringify",
        go_name: "zenoNativeJsonStringify",
        params: &[Type::Any],
        variadic: false,
        returns: Type::String,
        helper: Some(JSON_STRINGIFY_HELPER),
        go_imports: &["encoding/json", "fmt", "os"],
    },
];

/// Look up a primitive by its Zeno-level name.
///
/// The table is tiny, so a linear scan is fine.
pub fn find_native(name: &str) -> Option<&'static NativeFunction> {
    NATIVE_FUNCTIONS.iter().find(|native| native.name == name)
}

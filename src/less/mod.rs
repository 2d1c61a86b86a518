//! LESS to CSS compilation.
//!
//! Supports the stylesheet subset this server serves: `@name` variables
//! with lazy, last-definition-wins resolution, nested rulesets with `&`
//! parent references, and both comment styles. At-rules such as
//! `@import` and `@media` are rejected with a typed error rather than
//! passed through.
//!
//! ```
//! use lessware::less::{from_string, Options};
//!
//! let css = from_string(".a{color:@c}@c:red;", &Options::default())?;
//! assert_eq!(css, ".a {\n  color: red;\n}\n");
//! # Ok::<(), lessware::less::CompileError>(())
//! ```

use std::fs;
use std::path::Path;

mod ast;
mod error;
mod eval;
mod parser;
mod printer;

pub use error::CompileError;

/// Output configuration for a compilation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub style: OutputStyle,
    /// When set, a `/*# sourceMappingURL=... */` comment referencing
    /// this URL is appended to the output. No map file is generated.
    pub source_map_url: Option<String>,
}

/// How the generated CSS is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// One declaration per line, two-space indent, trailing newline.
    #[default]
    Expanded,
    /// Minimal whitespace, no trailing newline.
    Compressed,
}

/// Compiles LESS source text into CSS.
///
/// # Errors
///
/// Returns a [`CompileError`] describing the first parse, resolution or
/// unsupported-construct failure.
pub fn from_string(input: &str, options: &Options) -> Result<String, CompileError> {
    let sheet = parser::parse(input)?;
    let rules = eval::evaluate(&sheet)?;
    Ok(printer::print(&rules, options))
}

/// Reads `path` and compiles its contents into CSS.
///
/// # Errors
///
/// Returns [`CompileError::Io`] if the file cannot be read, otherwise
/// any error [`from_string`] produces.
pub fn from_path(path: &Path, options: &Options) -> Result<String, CompileError> {
    let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_string(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_minimal_stylesheet() {
        let css = from_string(".a{color:@c}@c:red;", &Options::default()).unwrap();
        assert_eq!(css, ".a {\n  color: red;\n}\n");
    }

    #[test]
    fn test_compile_variables_and_nesting() {
        let source = concat!(
            "@bg: #161b22;\n",
            "@accent: #3fb950;\n",
            "\n",
            ".panel {\n",
            "  background: @bg;\n",
            "  .title {\n",
            "    color: @accent;\n",
            "  }\n",
            "  &.wide { width: 100%; }\n",
            "}\n",
        );
        let css = from_string(source, &Options::default()).unwrap();
        let expected = concat!(
            ".panel {\n",
            "  background: #161b22;\n",
            "}\n",
            ".panel .title {\n",
            "  color: #3fb950;\n",
            "}\n",
            ".panel.wide {\n",
            "  width: 100%;\n",
            "}\n",
        );
        assert_eq!(css, expected);
    }

    #[test]
    fn test_compile_keeps_space_after_variable_reference() {
        let css = from_string("@w: 1px;\n.a { border: @w solid red; }", &Options::default())
            .unwrap();
        assert_eq!(css, ".a {\n  border: 1px solid red;\n}\n");
    }

    #[test]
    fn test_compile_keeps_space_between_variable_references() {
        let css = from_string(
            "@a: 4px;\n@b: 8px;\n.a { margin: @a @b; }",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(css, ".a {\n  margin: 4px 8px;\n}\n");
    }

    #[test]
    fn test_compile_preserves_absolute_urls() {
        let css = from_string(
            ".hero { background: url(https://cdn.example/banner@2x.png) no-repeat; }",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(
            css,
            ".hero {\n  background: url(https://cdn.example/banner@2x.png) no-repeat;\n}\n"
        );
    }

    #[test]
    fn test_compile_compressed() {
        let options = Options {
            style: OutputStyle::Compressed,
            source_map_url: None,
        };
        let css = from_string("@c: red;\nh1, h2 { color: @c; margin: 0; }", &options).unwrap();
        assert_eq!(css, "h1,h2{color:red;margin:0}");
    }

    #[test]
    fn test_compile_empty_input() {
        assert_eq!(from_string("", &Options::default()).unwrap(), "");
    }

    #[test]
    fn test_from_path_reads_and_compiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.less");
        std::fs::write(&path, "@c: red; .a { color: @c; }").unwrap();
        let css = from_path(&path, &Options::default()).unwrap();
        assert_eq!(css, ".a {\n  color: red;\n}\n");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.less");
        let err = from_path(&path, &Options::default()).unwrap_err();
        match err {
            CompileError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_options_are_expanded_without_map() {
        let options = Options::default();
        assert_eq!(options.style, OutputStyle::Expanded);
        assert!(options.source_map_url.is_none());
    }
}

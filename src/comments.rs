//! # Comment Extraction
//!
//! Pulls human-readable comment text out of source files so that code files
//! can be searched alongside Markdown documentation.
//!
//! Each supported language maps to one fixed regular expression covering its
//! line and block comment syntax. Unsupported file types are not an error;
//! they simply produce no text.

use regex::Regex;
use std::sync::LazyLock;

/// `// line` and `/* block */` comments (C family, Go, Rust).
static C_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//[^\r\n]*|/\*[\s\S]*?\*/").expect("C_STYLE: hardcoded regex is valid")
});

/// `# line` comments and triple-quoted docstrings.
static PYTHON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#[^\r\n]*|'''[\s\S]*?'''|"""[\s\S]*?""""#).expect("PYTHON: hardcoded regex is valid")
});

/// `# line` comments and `=begin ... =end` blocks.
static RUBY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#[^\r\n]*|=begin[\s\S]*?=end").expect("RUBY: hardcoded regex is valid")
});

/// Look up the comment pattern for a file type tag (an extension without the dot)
fn comment_regex(file_type: &str) -> Option<&'static Regex> {
    match file_type {
        "js" | "ts" | "java" | "cpp" | "c" | "go" | "rs" => Some(&*C_STYLE),
        "py" => Some(&*PYTHON),
        "rb" => Some(&*RUBY),
        _ => None,
    }
}

/// Whether [`extract_comments`] knows the comment syntax of `file_type`
pub fn is_supported(file_type: &str) -> bool {
    comment_regex(file_type).is_some()
}

/// Extract all comments from `content`, joined by newlines in source order.
///
/// Returns an empty string when the file type is unsupported or the content
/// has no comments.
pub fn extract_comments(content: &str, file_type: &str) -> String {
    let Some(regex) = comment_regex(file_type) else {
        return String::new();
    };

    regex
        .find_iter(content)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// File type tag of a repo-relative path: the text after the last `.` of the
/// final path component, or an empty string when there is none.
pub fn file_type_of(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_FAMILY: [&str; 7] = ["js", "ts", "java", "cpp", "c", "go", "rs"];

    #[test]
    fn test_no_comments_yields_empty() {
        for file_type in C_FAMILY.iter().chain(["py", "rb"].iter()) {
            assert_eq!(
                extract_comments("let x = 1;\nreturn x;", file_type),
                "",
                "file type {file_type}"
            );
        }
    }

    #[test]
    fn test_single_line_comment_is_returned_verbatim() {
        for file_type in C_FAMILY {
            assert_eq!(extract_comments("// x", file_type), "// x");
        }
        assert_eq!(extract_comments("# x", "py"), "# x");
        assert_eq!(extract_comments("# x", "rb"), "# x");
    }

    #[test]
    fn test_block_and_line_comments_in_source_order() {
        let source = "/* header\n   block */\nfn main() {} // trailing\n";
        assert_eq!(
            extract_comments(source, "rs"),
            "/* header\n   block */\n// trailing"
        );
    }

    #[test]
    fn test_crlf_line_endings_are_not_captured() {
        let source = "int x; // count\r\nint y; /* a\r\nb */\r\n";
        assert_eq!(extract_comments(source, "c"), "// count\n/* a\r\nb */");

        assert_eq!(extract_comments("x = 1  # one\r\ny = 2\r\n", "py"), "# one");
        assert_eq!(extract_comments("# top\r\nputs 1\r\n", "rb"), "# top");
    }

    #[test]
    fn test_python_docstrings() {
        let source = "def f():\n    \"\"\"Docs here.\"\"\"\n    return 1  # one\n";
        assert_eq!(extract_comments(source, "py"), "\"\"\"Docs here.\"\"\"\n# one");

        let single = "'''module\ndocs'''\nx = 1";
        assert_eq!(extract_comments(single, "py"), "'''module\ndocs'''");
    }

    #[test]
    fn test_ruby_block_comments() {
        let source = "=begin\nExplains things\n=end\nputs 1 # say one\n";
        assert_eq!(
            extract_comments(source, "rb"),
            "=begin\nExplains things\n=end\n# say one"
        );
    }

    #[test]
    fn test_unsupported_type_yields_empty() {
        assert_eq!(extract_comments("// looks like a comment", "txt"), "");
        assert_eq!(extract_comments("# heading", "md"), "");
        assert_eq!(extract_comments("// x", ""), "");
        assert!(!is_supported("hs"));
        assert!(is_supported("go"));
    }

    #[test]
    fn test_file_type_of() {
        assert_eq!(file_type_of("index.js"), "js");
        assert_eq!(file_type_of("src/lib.rs"), "rs");
        assert_eq!(file_type_of("archive.tar.gz"), "gz");
        assert_eq!(file_type_of("Makefile"), "");
        assert_eq!(file_type_of("dir.d/Makefile"), "");
    }
}

//! Stylesheet output: renders generated rules to CSS text.

use crate::errors::{GeneratorError, Result};
use crate::registry::UtilityRule;
use chrono::Utc;
use indexmap::IndexMap;
use std::path::Path;

/// Comment type for CSS minification
#[derive(Debug, Clone, Copy, PartialEq)]
enum CommentType {
    None,
    Block,
}

/// Rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub minify: bool,
    /// Prepend a "generated by" comment
    pub header: bool,
}

/// Render rules to CSS.
///
/// Rules sharing a selector collapse into one: the last rule's declarations
/// are emitted at the position of the first occurrence.
pub fn render(rules: &[UtilityRule], options: RenderOptions) -> String {
    let mut unique: IndexMap<&str, &UtilityRule> = IndexMap::new();
    for rule in rules {
        unique.insert(rule.selector.as_str(), rule);
    }

    let mut css = String::new();
    if options.header {
        css.push_str(&generate_css_header(unique.is_empty(), options.minify));
    }

    for (selector, rule) in &unique {
        css.push_str(selector);
        css.push_str(" {\n");
        for declaration in &rule.declarations {
            css.push_str("  ");
            css.push_str(&declaration.property);
            css.push_str(": ");
            css.push_str(&declaration.value);
            css.push_str(";\n");
        }
        css.push_str("}\n");
    }

    if options.minify {
        minify_css(&css)
    } else {
        css
    }
}

/// Write generated output to `path`, creating parent directories
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GeneratorError::OutputError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
    }

    write_atomic(path, content).map_err(|e| GeneratorError::OutputError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write file atomically by writing to temp file then renaming
fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
    use std::fs;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Generate CSS header comment
fn generate_css_header(empty: bool, minified: bool) -> String {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    if minified {
        if empty {
            "/* windgen: No utilities generated */".to_string()
        } else {
            format!("/* Generated by windgen v{} at {} */", env!("CARGO_PKG_VERSION"), now)
        }
    } else if empty {
        format!(
            r#"/**
 * Generated by windgen v{}
 * Generation time: {}
 *
 * No utility classes found
 */
"#,
            env!("CARGO_PKG_VERSION"),
            now
        )
    } else {
        format!(
            r#"/**
 * Generated by windgen v{}
 * Generation time: {}
 *
 * DO NOT EDIT - This file is auto-generated.
 */

"#,
            env!("CARGO_PKG_VERSION"),
            now
        )
    }
}

/// Collapse whitespace and drop non-header comments
pub fn minify_css(css: &str) -> String {
    let mut result = String::with_capacity(css.len());
    let mut prev_char = ' ';
    let mut in_comment = false;
    let mut comment_type = CommentType::None;

    let chars: Vec<char> = css.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if !in_comment && i + 1 < chars.len() && ch == '/' && chars[i + 1] == '*' {
            // A comment at the very start is the header; keep it.
            if result.trim().is_empty() {
                result.push(ch);
                result.push(chars[i + 1]);
                i += 2;

                while i + 1 < chars.len() {
                    result.push(chars[i]);
                    if chars[i] == '*' && chars[i + 1] == '/' {
                        result.push(chars[i + 1]);
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                prev_char = '/';
                continue;
            }

            in_comment = true;
            comment_type = CommentType::Block;
            i += 2;
            continue;
        }

        if in_comment {
            if comment_type == CommentType::Block && ch == '*' && i + 1 < chars.len() && chars[i + 1] == '/' {
                in_comment = false;
                comment_type = CommentType::None;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if ch.is_whitespace() {
            if !prev_char.is_whitespace() && !"{};:,".contains(prev_char) && i + 1 < chars.len() {
                let next = chars[i + 1];
                if !"{};:,".contains(next) && !next.is_whitespace() {
                    result.push(' ');
                    prev_char = ' ';
                }
            }
        } else if ch == '}' && result.ends_with(';') {
            // Last declaration in a block needs no terminator.
            result.pop();
            result.push(ch);
            prev_char = ch;
        } else {
            result.push(ch);
            prev_char = ch;
        }

        i += 1;
    }

    result
}

//! Static scan of top-level import statements. Nothing is executed.

use crate::error::ExecutionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStmt {
    /// `import a.b [as c]`
    Module { path: String, alias: Option<String> },
    /// `from a.b import x [as y]`
    From {
        module: String,
        name: String,
        alias: Option<String>,
    },
}

impl ImportStmt {
    /// Name the statement binds: the alias, else the last dotted segment / imported name.
    pub fn bound_name(&self) -> &str {
        match self {
            Self::Module { path, alias } => alias
                .as_deref()
                .unwrap_or_else(|| path.rsplit('.').next().unwrap_or(path.as_str())),
            Self::From { name, alias, .. } => alias.as_deref().unwrap_or(name),
        }
    }
}

/// Enumerate the imports at column 0, in source order.
pub fn scan_imports(code: &str) -> Result<Vec<ImportStmt>, ExecutionError> {
    let mut out = Vec::new();
    let mut lines = code.lines().enumerate();
    let mut in_docstring: Option<&'static str> = None;

    while let Some((index, line)) = lines.next() {
        if let Some(quote) = in_docstring {
            if line.matches(quote).count() % 2 == 1 {
                in_docstring = None;
            }
            continue;
        }
        if let Some(quote) = opens_docstring(line) {
            in_docstring = Some(quote);
            continue;
        }
        if !is_import_start(line) {
            continue;
        }

        let mut logical = strip_comment(line).to_string();
        while needs_continuation(&logical) {
            let Some((_, next)) = lines.next() else {
                return Err(ExecutionError::syntax(format!(
                    "unterminated import statement: {}",
                    logical.trim()
                ))
                .with_trace(format!("line {}: {line}", index + 1)));
            };
            if logical.trim_end().ends_with('\\') {
                let trimmed = logical.trim_end().trim_end_matches('\\').to_string();
                logical = trimmed;
            }
            logical.push(' ');
            logical.push_str(strip_comment(next));
        }

        for stmt in logical.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            if stmt.starts_with("import") || stmt.starts_with("from") {
                parse_statement(stmt, &mut out)
                    .map_err(|e| e.with_trace(format!("line {}: {stmt}", index + 1)))?;
            }
        }
    }

    Ok(out)
}

fn is_import_start(line: &str) -> bool {
    let first = line.split_whitespace().next().unwrap_or("");
    let starts_at_col0 = !line.starts_with(char::is_whitespace);
    starts_at_col0 && (first == "import" || (first == "from" && line.contains(" import")))
}

/// A top-level line that opens a triple-quoted string without closing it.
fn opens_docstring(line: &str) -> Option<&'static str> {
    ["\"\"\"", "'''"]
        .into_iter()
        .find(|q| line.matches(q).count() % 2 == 1)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn needs_continuation(logical: &str) -> bool {
    let open = logical.matches('(').count();
    let close = logical.matches(')').count();
    open > close || logical.trim_end().ends_with('\\')
}

fn parse_statement(stmt: &str, out: &mut Vec<ImportStmt>) -> Result<(), ExecutionError> {
    if let Some(rest) = stmt.strip_prefix("import") {
        if !rest.starts_with(char::is_whitespace) {
            return Err(malformed(stmt));
        }
        for part in split_names(rest) {
            let (path, alias) = parse_alias(&part, stmt)?;
            if !is_dotted_path(&path) {
                return Err(malformed(stmt));
            }
            out.push(ImportStmt::Module { path, alias });
        }
        return Ok(());
    }

    let rest = stmt
        .strip_prefix("from")
        .filter(|r| r.starts_with(char::is_whitespace))
        .ok_or_else(|| malformed(stmt))?;
    let (module, names) = rest.split_once(" import").ok_or_else(|| malformed(stmt))?;
    let module = module.trim();
    if module.starts_with('.') {
        return Err(ExecutionError::syntax(format!(
            "relative imports are not supported: {stmt}"
        )));
    }
    if !is_dotted_path(module) {
        return Err(malformed(stmt));
    }
    let names = names.trim().trim_start_matches('(').trim_end_matches(')');
    if names.trim() == "*" {
        return Err(ExecutionError::syntax(format!(
            "wildcard imports are not supported: {stmt}"
        )));
    }
    let mut any = false;
    for part in split_names(names) {
        let (name, alias) = parse_alias(&part, stmt)?;
        if !is_identifier(&name) {
            return Err(malformed(stmt));
        }
        out.push(ImportStmt::From {
            module: module.to_string(),
            name,
            alias,
        });
        any = true;
    }
    if !any {
        return Err(malformed(stmt));
    }
    Ok(())
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_alias(part: &str, stmt: &str) -> Result<(String, Option<String>), ExecutionError> {
    let tokens: Vec<&str> = part.split_whitespace().collect();
    match tokens.as_slice() {
        [name] => Ok((name.to_string(), None)),
        [name, "as", alias] if is_identifier(alias) => {
            Ok((name.to_string(), Some(alias.to_string())))
        }
        _ => Err(malformed(stmt)),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_dotted_path(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

fn malformed(stmt: &str) -> ExecutionError {
    ExecutionError::syntax(format!("malformed import statement: {stmt}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str, alias: Option<&str>) -> ImportStmt {
        ImportStmt::Module {
            path: path.into(),
            alias: alias.map(Into::into),
        }
    }

    fn from(m: &str, name: &str, alias: Option<&str>) -> ImportStmt {
        ImportStmt::From {
            module: m.into(),
            name: name.into(),
            alias: alias.map(Into::into),
        }
    }

    #[test]
    fn plain_and_aliased_imports() {
        let code = "import altair as alt\nimport os, json\nimport matplotlib.pyplot as plt\n";
        let got = scan_imports(code).unwrap();
        assert_eq!(
            got,
            vec![
                module("altair", Some("alt")),
                module("os", None),
                module("json", None),
                module("matplotlib.pyplot", Some("plt")),
            ]
        );
    }

    #[test]
    fn from_imports_with_parens_and_continuation() {
        let code = "from collections import (\n    OrderedDict as OD,  # ordered\n    Counter,\n)\nfrom os.path import join, \\\n    basename\n";
        let got = scan_imports(code).unwrap();
        assert_eq!(
            got,
            vec![
                from("collections", "OrderedDict", Some("OD")),
                from("collections", "Counter", None),
                from("os.path", "join", None),
                from("os.path", "basename", None),
            ]
        );
    }

    #[test]
    fn nested_imports_are_not_top_level() {
        let code = "import a\ndef plot(data):\n    import b\n    from c import d\n    return 1\n";
        assert_eq!(scan_imports(code).unwrap(), vec![module("a", None)]);
    }

    #[test]
    fn docstrings_and_comments_are_skipped() {
        let code = "\"\"\"\nimport fake\n\"\"\"\n# import other\nimport real # trailing\n";
        assert_eq!(scan_imports(code).unwrap(), vec![module("real", None)]);
    }

    #[test]
    fn semicolon_separated() {
        let code = "import a; import b as c";
        assert_eq!(
            scan_imports(code).unwrap(),
            vec![module("a", None), module("b", Some("c"))]
        );
    }

    #[test]
    fn bound_names() {
        assert_eq!(module("matplotlib.pyplot", None).bound_name(), "pyplot");
        assert_eq!(module("matplotlib.pyplot", Some("plt")).bound_name(), "plt");
        assert_eq!(from("a.b", "c", None).bound_name(), "c");
        assert_eq!(from("a.b", "c", Some("d")).bound_name(), "d");
    }

    #[test]
    fn rejects_relative_wildcard_and_malformed() {
        for code in [
            "from . import x",
            "from os import *",
            "import",
            "import a as",
            "from os import",
            "import 3d",
            "from os import (a,\n",
        ] {
            let err = scan_imports(code).unwrap_err();
            assert_eq!(err.kind(), "syntax", "input: {code:?}");
        }
    }

    #[test]
    fn rejected_statement_lands_in_trace() {
        let err = scan_imports("import os\n\nfrom .sibling import helper").unwrap_err();
        assert!(err.to_string().contains("relative imports"));
        assert_eq!(err.trace(), "line 3: from .sibling import helper");

        let err = scan_imports("import a\nfrom os import (a,").unwrap_err();
        assert_eq!(err.trace(), "line 2: from os import (a,");
    }

    #[test]
    fn identifiers_named_like_keywords_are_ignored() {
        let code = "from_date = 1\nimporter = 2\nimport ok\n";
        assert_eq!(scan_imports(code).unwrap(), vec![module("ok", None)]);
    }
}

//! Turns raw LLM output into a single executable code unit.

use std::sync::OnceLock;

use regex::Regex;

pub mod rewrite;

use rewrite::{RewriteTable, POLARS_RENAMES};

/// Terminal invocation every unit must end with; binds the result symbol.
pub const ENTRY_MARKER: &str = "chart = plot(data)";

/// Symbol the entry marker binds.
pub const RESULT_SYMBOL: &str = "chart";

/// Scaffolding markers left over from the prompt template.
pub const PLACEHOLDERS: &[&str] = &["<imports>", "<stub>", "<transforms>"];

const FENCE: &str = "```";

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:\w+\n)?([\s\S]+?)```").expect("valid fence pattern"))
}

/// A normalized program fragment. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    code: String,
    original: String,
}

impl CodeUnit {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The raw text this unit was normalized from.
    pub fn original(&self) -> &str {
        &self.original
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    marker: String,
    placeholders: Vec<String>,
    rewrites: Vec<RewriteTable>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            marker: ENTRY_MARKER.to_string(),
            placeholders: PLACEHOLDERS.iter().map(|p| p.to_string()).collect(),
            rewrites: vec![POLARS_RENAMES],
        }
    }
}

/// Upper bound on cleaning passes; real inputs settle after one or two.
const MAX_PASSES: usize = 8;

impl Normalizer {
    /// Never fails; worst case the unit fails later at execution.
    ///
    /// The cleaning pass is repeated until its output stops changing, since one
    /// removal can expose another (`<imp<stub>orts>`, fences split by placeholders).
    pub fn normalize(&self, raw: &str) -> CodeUnit {
        let mut code = self.clean(raw);
        for _ in 1..MAX_PASSES {
            let next = self.clean(&code);
            if next == code {
                break;
            }
            code = next;
        }

        CodeUnit {
            code,
            original: raw.to_string(),
        }
    }

    fn clean(&self, raw: &str) -> String {
        let mut code = self.strip_placeholders(raw.to_string());

        code = self.truncate_after_marker(code);

        if code.contains(FENCE) {
            if let Some(block) = fenced_block()
                .captures(&code)
                .and_then(|caps| caps.get(1))
            {
                code = block.as_str().to_string();
            }
        }

        if let Some(index) = code.find("import") {
            code = code[index..].to_string();
        }

        code = code.replace(FENCE, "");

        if code.contains(self.marker.as_str()) {
            code = self.truncate_after_marker(code);
        } else {
            code.push('\n');
            code.push_str(&self.marker);
        }

        for table in &self.rewrites {
            if table.applies_to(&code) {
                tracing::trace!(table = table.version, "applying API rewrites");
                code = table.apply(&code);
            }
        }

        code
    }

    fn strip_placeholders(&self, mut code: String) -> String {
        loop {
            let next = self
                .placeholders
                .iter()
                .fold(code.clone(), |acc, p| acc.replace(p.as_str(), ""));
            if next == code {
                return code;
            }
            code = next;
        }
    }

    fn truncate_after_marker(&self, mut code: String) -> String {
        if let Some(index) = code.find(self.marker.as_str()) {
            code.truncate(index + self.marker.len());
        }
        code
    }
}

/// Normalize with the default marker, placeholders and rewrite tables.
pub fn normalize(raw: &str) -> CodeUnit {
    Normalizer::default().normalize(raw)
}

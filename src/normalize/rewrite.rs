//! Literal rewrites for known breaking renames in the tabular library API.

/// One literal substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewrite {
    pub pattern: &'static str,
    pub replacement: &'static str,
    pub rationale: &'static str,
}

/// A versioned set of rewrites, applied only when `trigger` occurs in the code.
#[derive(Debug, Clone, Copy)]
pub struct RewriteTable {
    pub version: &'static str,
    pub trigger: &'static str,
    pub rules: &'static [Rewrite],
}

pub const POLARS_RENAMES: RewriteTable = RewriteTable {
    version: "polars>=0.19",
    trigger: "polars",
    rules: &[
        Rewrite {
            pattern: "groupby",
            replacement: "group_by",
            rationale: "DataFrame.groupby was renamed to group_by in 0.19",
        },
        Rewrite {
            pattern: ".with_column(",
            replacement: ".with_columns(",
            rationale: "DataFrame.with_column was removed in favour of with_columns",
        },
        Rewrite {
            pattern: "reverse=True",
            replacement: "descending=True",
            rationale: "sort(reverse=...) became sort(descending=...)",
        },
    ],
};

impl RewriteTable {
    pub fn applies_to(&self, code: &str) -> bool {
        code.contains(self.trigger)
    }

    /// Apply every rule in order. No-op when the trigger is absent.
    pub fn apply(&self, code: &str) -> String {
        if !self.applies_to(code) {
            return code.to_string();
        }
        self.rules
            .iter()
            .fold(code.to_string(), |acc, rule| {
                if acc.contains(rule.pattern) {
                    acc.replace(rule.pattern, rule.replacement)
                } else {
                    acc
                }
            })
    }
}

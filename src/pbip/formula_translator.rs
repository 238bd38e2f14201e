//! Formula translation - Tableau calculations → DAX
//!
//! Converts calculated-field formulas like `IF [A] THEN 1 ELSE 0 END` to DAX
//! expressions like `IF([A] , 1 , 0)` through ordered lexical rewrite passes.
//! No parse tree is built: irregular nesting may still produce unbalanced
//! parentheses, and the output is never validated.

use crate::error::BridgeResult;
use regex::{Captures, Regex};

/// Tableau function name → DAX function name (matched when followed by `(`)
const FUNCTION_MAP: &[(&str, &str)] = &[
    ("SUM", "SUM"),
    ("AVG", "AVERAGE"),
    ("MIN", "MIN"),
    ("MAX", "MAX"),
    ("COUNTD", "DISTINCTCOUNT"),
    ("COUNT", "COUNT"),
    ("ISNULL", "ISBLANK"),
    ("ABS", "ABS"),
    ("ROUND", "ROUND"),
    ("ATTR", "SELECTEDVALUE"),
    ("DATEDIFF", "DATEDIFF"),
    ("DATEADD", "DATEADD"),
    ("DATETRUNC", "DATE_TRUNC"),
    ("CASE", "SWITCH"),
    ("IIF", "IF"),
    ("IF", "IF"),
];

const MASK_OPEN: char = '\u{E000}';
const MASK_CLOSE: char = '\u{E001}';

/// Translates Tableau calculation formulas to DAX
pub struct FormulaTranslator {
    functions: Regex,
    keywords: Regex,
    zero_null: Regex,
    and: Regex,
    or: Regex,
    comma_runs: Regex,
}

impl FormulaTranslator {
    /// Compile the rewrite passes
    pub fn new() -> BridgeResult<Self> {
        let names: Vec<&str> = FUNCTION_MAP.iter().map(|(name, _)| *name).collect();

        Ok(Self {
            functions: Regex::new(&format!(r"(?i)\b({})\s*\(", names.join("|")))?,
            keywords: Regex::new(r"(?i)\b(ELSEIF|IF|THEN|WHEN|ELSE|END|CASE)\b")?,
            zero_null: Regex::new(r"(?i)\bZN\s*\(")?,
            and: Regex::new(r"(?i)\bAND\b")?,
            or: Regex::new(r"(?i)\bOR\b")?,
            comma_runs: Regex::new(r",(\s*,)+")?,
        })
    }

    /// Translate a Tableau formula to a DAX expression
    ///
    /// Example:
    /// - Input: `ZN([Sales]) - AVG([Cost])`
    /// - Output: `COALESCE([Sales], 0) - AVERAGE([Cost])`
    pub fn translate(&self, formula: &str) -> String {
        if formula.trim().is_empty() {
            return String::new();
        }

        // Field references and string literals are never rewritten
        let (masked, protected) = mask_literals(formula);

        // 1. Function names
        let result = self.functions.replace_all(&masked, |caps: &Captures| {
            format!("{}(", dax_function(&caps[1]))
        });

        // 2. IF/THEN/ELSE/END and CASE/WHEN
        let result = self.rewrite_control_flow(&result);

        // 3. ZN(x) → COALESCE(x, 0)
        let result = self.rewrite_zero_null(&result);

        // 4. Logical operators
        let result = self.and.replace_all(&result, "&&");
        let result = self.or.replace_all(&result, "||");

        // 5. Cleanup
        let result = self.comma_runs.replace_all(&result, ",");

        unmask_literals(result.trim(), &protected)
    }

    /// Rewrite control-flow keywords in one left-to-right scan.
    ///
    /// An `IF` opens a call unless it is already in call form, i.e. directly
    /// followed by `(` with no `THEN` before the next `IF`.
    fn rewrite_control_flow(&self, formula: &str) -> String {
        let tokens: Vec<_> = self.keywords.find_iter(formula).collect();
        let mut out = String::with_capacity(formula.len() + 8);
        let mut cursor = 0;

        for (index, token) in tokens.iter().enumerate() {
            out.push_str(&formula[cursor..token.start()]);
            cursor = token.end();
            let rest = &formula[cursor..];

            match token.as_str().to_ascii_uppercase().as_str() {
                "IF" => {
                    let is_keyword = tokens[index + 1..]
                        .iter()
                        .map(|t| t.as_str().to_ascii_uppercase())
                        .find(|t| t == "IF" || t == "THEN")
                        .is_some_and(|t| t == "THEN");

                    if is_keyword || !rest.trim_start().starts_with('(') {
                        out.push_str("IF(");
                        cursor += leading_whitespace(rest);
                    } else {
                        out.push_str("IF");
                    }
                }
                "CASE" => {
                    out.push_str("SWITCH(");
                    cursor += leading_whitespace(rest);
                }
                "ELSEIF" => {
                    out.push_str(", IF(");
                    cursor += leading_whitespace(rest);
                }
                "THEN" | "WHEN" | "ELSE" => out.push(','),
                _ => {
                    // END
                    out.truncate(out.trim_end().len());
                    out.push(')');
                }
            }
        }

        out.push_str(&formula[cursor..]);
        out
    }

    /// Rewrite `ZN(expr)` to `COALESCE(expr, 0)`, where `expr` runs to the
    /// matching closing parenthesis. An unclosed `ZN(` is left as written.
    fn rewrite_zero_null(&self, formula: &str) -> String {
        let mut out = String::with_capacity(formula.len());
        let mut cursor = 0;

        while let Some(call) = self.zero_null.find_at(formula, cursor) {
            let Some(len) = matching_paren(&formula[call.end()..]) else {
                break;
            };
            let inner = &formula[call.end()..call.end() + len];

            out.push_str(&formula[cursor..call.start()]);
            out.push_str("COALESCE(");
            out.push_str(&self.rewrite_zero_null(inner));
            out.push_str(", 0)");
            cursor = call.end() + len + 1;
        }

        out.push_str(&formula[cursor..]);
        out
    }
}

/// Byte offset of the `)` closing an already opened parenthesis
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn dax_function(name: &str) -> String {
    let upper = name.to_ascii_uppercase();
    FUNCTION_MAP
        .iter()
        .find(|(tableau, _)| *tableau == upper)
        .map(|(_, dax)| dax.to_string())
        .unwrap_or(upper)
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// Replace `[field]`, `'text'` and `"text"` spans with numbered placeholders.
///
/// Doubled closing delimiters (`]]`, `''`, `""`) are escapes and stay inside
/// the span. An unterminated span runs to the end of the formula.
fn mask_literals(formula: &str) -> (String, Vec<String>) {
    let mut masked = String::with_capacity(formula.len());
    let mut protected = Vec::new();
    let mut chars = formula.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let close = match c {
            '[' => ']',
            '\'' | '"' => c,
            _ => {
                masked.push(c);
                continue;
            }
        };

        let mut end = formula.len();
        while let Some((i, next)) = chars.next() {
            if next == close {
                if chars.peek().is_some_and(|&(_, after)| after == close) {
                    chars.next();
                    continue;
                }
                end = i + next.len_utf8();
                break;
            }
        }

        masked.push(MASK_OPEN);
        masked.push_str(&protected.len().to_string());
        masked.push(MASK_CLOSE);
        protected.push(formula[start..end].to_string());
    }

    (masked, protected)
}

fn unmask_literals(masked: &str, protected: &[String]) -> String {
    let mut result = masked.to_string();
    for (index, original) in protected.iter().enumerate().rev() {
        let placeholder = format!("{MASK_OPEN}{index}{MASK_CLOSE}");
        result = result.replace(&placeholder, original);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(formula: &str) -> String {
        FormulaTranslator::new().unwrap().translate(formula)
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(translate(""), "");
        assert_eq!(translate("   "), "");
    }

    #[test]
    fn test_function_names() {
        assert_eq!(translate("SUM([Profit])/SUM([Sales])"), "SUM([Profit])/SUM([Sales])");
        assert_eq!(translate("avg ([Cost])"), "AVERAGE([Cost])");
        assert_eq!(translate("COUNTD([Customer])"), "DISTINCTCOUNT([Customer])");
        assert_eq!(translate("COUNT([Orders])"), "COUNT([Orders])");
        assert_eq!(translate("ATTR([Region])"), "SELECTEDVALUE([Region])");
        assert_eq!(translate("ISNULL([Discount])"), "ISBLANK([Discount])");
        assert_eq!(
            translate("DATETRUNC('month', [Order Date])"),
            "DATE_TRUNC('month', [Order Date])"
        );
    }

    #[test]
    fn test_zero_null() {
        assert_eq!(translate("ZN([Sales])"), "COALESCE([Sales], 0)");
        assert_eq!(
            translate("ZN([Sales]) - zn([Returns])"),
            "COALESCE([Sales], 0) - COALESCE([Returns], 0)"
        );
    }

    #[test]
    fn test_zero_null_nested_call() {
        assert_eq!(
            translate("ZN(SUM([Sales])) + ZN(ZN([Tax]))"),
            "COALESCE(SUM([Sales]), 0) + COALESCE(COALESCE([Tax], 0), 0)"
        );
        assert_eq!(translate("ZN([Sales]"), "ZN([Sales]");
    }

    #[test]
    fn test_if_then_else() {
        assert_eq!(translate("IF [A] THEN 1 ELSE 0 END"), "IF([A] , 1 , 0)");
        assert_eq!(
            translate("if [Profit] > 0 then 'Gain' else 'Loss' end"),
            "IF([Profit] > 0 , 'Gain' , 'Loss')"
        );
    }

    #[test]
    fn test_parenthesized_if_condition() {
        assert_eq!(
            translate("IF ([Sales] > 100) THEN 1 END"),
            "IF(([Sales] > 100) , 1)"
        );
    }

    #[test]
    fn test_case_when() {
        assert_eq!(
            translate("CASE [Segment] WHEN 'Consumer' THEN 1 ELSE 0 END"),
            "SWITCH([Segment] , 'Consumer' , 1 , 0)"
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            translate("[A] > 1 AND [B] < 2 or [C]"),
            "[A] > 1 && [B] < 2 || [C]"
        );
    }

    #[test]
    fn test_no_double_commas() {
        let result = translate("IF [A] THEN ELSE 0 END");
        assert!(!result.contains(",,"));
        assert!(!result.contains(", ,"));
    }

    #[test]
    fn test_literals_are_protected() {
        assert_eq!(
            translate("IF [Weekend Or Holiday] THEN 'End' ELSE \"if then\" END"),
            "IF([Weekend Or Holiday] , 'End' , \"if then\")"
        );
        assert_eq!(translate("SUM([Sales]]Net])"), "SUM([Sales]]Net])");
    }

    #[test]
    fn test_keywords_inside_identifiers_untouched() {
        assert_eq!(translate("[Order Date] + ANDROID_COUNT"), "[Order Date] + ANDROID_COUNT");
    }

    #[test]
    fn test_mask_roundtrip() {
        let formula = "ZN([a]) + 'it''s' + [x";
        let (masked, protected) = mask_literals(formula);
        assert_eq!(protected, vec!["[a]", "'it''s'", "[x"]);
        assert_eq!(unmask_literals(&masked, &protected), formula);
    }
}

//! Code-shape detection and conversion
//!
//! Scenario code arrives with unknown provenance: hand-written, AI-edited,
//! or raw codegen output. The execution harness only runs test-shaped
//! files, so codegen-shaped scripts are converted before use. Detection
//! and conversion are deliberately conservative line-prefix and pattern
//! heuristics, not an AST transform.

use once_cell::sync::Lazy;
use regex::Regex;
use scenably_common::{Error, Result};

/// Detected shape of a piece of scenario code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeShape {
    /// `test()`/`expect()` blocks with the test-framework import
    Test,
    /// Raw browser-launch script as produced by codegen
    Codegen,
    Unknown,
}

static TEST_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import\s+\{[^}]*\btest\b[^}]*\}\s*from|require\s*\(\s*)\s*['"]@playwright/test['"]"#)
        .expect("test import pattern")
});

static TEST_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btest\s*\(").expect("test call pattern"));

static BROWSER_LAUNCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:chromium|firefox|webkit)\.launch\s*\(").expect("launch pattern")
});

static ASYNC_IIFE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*async\s*\(\s*\)\s*=>\s*\{").expect("iife pattern")
});

/// Classify a code string by shape
pub fn classify(code: &str) -> CodeShape {
    let trimmed = code.trim();
    if trimmed.is_empty() || looks_like_identifier(trimmed) {
        return CodeShape::Unknown;
    }

    if TEST_IMPORT.is_match(trimmed) && TEST_CALL.is_match(trimmed) {
        return CodeShape::Test;
    }

    if BROWSER_LAUNCH.is_match(trimmed)
        || (ASYNC_IIFE.is_match(trimmed) && trimmed.contains("const browser ="))
    {
        return CodeShape::Codegen;
    }

    CodeShape::Unknown
}

/// A bare short alphanumeric token is a caller mistake: an id was passed
/// where code was expected.
fn looks_like_identifier(s: &str) -> bool {
    s.len() <= 64
        && !s.contains(char::is_whitespace)
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Convert codegen-shaped code into a single test block.
///
/// Only lines beginning with the page-interaction call prefix survive;
/// browser/context/page construction and teardown are supplied by the
/// test harness and discarded here.
pub fn convert(code: &str) -> String {
    let actions: Vec<String> = code
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("await page."))
        .filter(|line| !line.contains(".close("))
        .map(|line| format!("  {}", line))
        .collect();

    format!(
        "import {{ test, expect }} from '@playwright/test';\n\n\
         test('recorded scenario', async ({{ page }}) => {{\n\
         {}\n\
         }});\n",
        actions.join("\n")
    )
}

/// Produce runnable test-shaped code or fail fast.
///
/// This is a local validation error, raised before any file or process
/// side effect; an `Unknown` shape must never create a session.
pub fn normalize(code: &str) -> Result<String> {
    match classify(code) {
        CodeShape::Test => Ok(code.to_string()),
        CodeShape::Codegen => Ok(convert(code)),
        CodeShape::Unknown => Err(Error::InvalidCode(
            "code is neither test-shaped (test()/expect() with the @playwright/test import) \
             nor codegen-shaped (raw browser-launch script)"
                .to_string(),
        )),
    }
}

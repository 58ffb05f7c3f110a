//! Fallback test templates
//!
//! Interactive recording is the most environment-fragile operation in the
//! system: it needs a real, visible browser. When recording cannot run or
//! produced nothing readable, the user still gets a runnable skeleton
//! referencing their target URL instead of an error.

use crate::materialize::escape_single_quotes;

/// Static, commented test skeleton for a target URL.
///
/// The output is always test-shaped, so it feeds straight into the debug
/// and execution flows without conversion.
pub fn recording_template(url: &str) -> String {
    let url = escape_single_quotes(url);
    format!(
        r#"import {{ test, expect }} from '@playwright/test';

// Generated scenario skeleton.
// Recording was not available in this environment; add your steps below.
test('recorded scenario', async ({{ page }}) => {{
  // Open the target page
  await page.goto('{url}');

  // Example interactions:
  // await page.click('text=Sign in');
  // await page.fill('#email', 'user@example.com');

  // Example assertion:
  // await expect(page).toHaveURL('{url}');
}});
"#,
        url = url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{classify, CodeShape};

    #[test]
    fn template_is_test_shaped() {
        let code = recording_template("https://example.com");
        assert_eq!(classify(&code), CodeShape::Test);
        assert!(code.contains("https://example.com"));
    }

    #[test]
    fn template_escapes_quotes_in_url() {
        let code = recording_template("https://example.com/?q='a'");
        assert!(code.contains("\\'a\\'"));
    }
}

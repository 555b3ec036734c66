//! Shared helpers for the generated pages and scripts.

use serde::Serialize;

use crate::error::Result;

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// JSON for embedding in an inline `<script>`; `</` becomes `<\/`.
pub(crate) fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// `console.warn` calls for compiler warnings.
pub(super) fn warnings_js(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n// ── Compiler warnings ─────────────────────────────────────────\n");
    for w in warnings {
        out.push_str(&format!("console.warn('[nodegame]', {});\n", crate::nodes::js_string(w)));
    }
    out
}

/// Keep inline code from closing its `<script>` element early.
/// HTML matches the closing tag case-insensitively, so `</SCRIPT` counts too.
pub(super) fn inline_script(code: &str) -> String {
    let lower = code.to_ascii_lowercase();
    let mut out = String::with_capacity(code.len());
    let mut last = 0;
    for (at, _) in lower.match_indices("</script") {
        out.push_str(&code[last..at]);
        out.push_str("<\\/");
        last = at + 2;
    }
    out.push_str(&code[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(html_escape("<b a=\"1\">&"), "&lt;b a=&quot;1&quot;&gt;&amp;");
        assert_eq!(script_json("</script>").unwrap(), "\"<\\/script>\"");
        assert_eq!(inline_script("x = '</script>'"), "x = '<\\/script>'");
        assert_eq!(inline_script("a('</SCRIPT>', '</Script ')"), "a('<\\/SCRIPT>', '<\\/Script ')");
        assert_eq!(inline_script("é</sCrIpT"), "é<\\/sCrIpT");
    }

    #[test]
    fn warnings_become_console_calls() {
        let js = warnings_js(&["node #1 'A': sprite has no texture".to_string()]);
        assert!(js.contains(r#"console.warn('[nodegame]', "node #1 'A': sprite has no texture");"#));
        assert!(warnings_js(&[]).is_empty());
    }
}

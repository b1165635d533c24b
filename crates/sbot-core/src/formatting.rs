//! Telegram HTML helpers.
//!
//! Telegram HTML supports only a small subset: `<b>`, `<i>`, `<code>`, `<pre>`, `<a href="...">`.
//! Every bot reply goes through here so user-controlled text (usernames, stored dates) is escaped.

/// Escape HTML special characters for Telegram.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape `text` and wrap it in `<b>`.
pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", escape_html(text))
}

/// Multi-line block where the first line is a bold title and the rest are escaped as-is.
pub fn titled_block(title: &str, lines: &[String]) -> String {
    let mut out = bold(title);
    for line in lines {
        out.push('\n');
        out.push_str(&escape_html(line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_specials() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn bold_escapes_inner_text() {
        assert_eq!(bold("Use /approve <user_id>"), "<b>Use /approve &lt;user_id&gt;</b>");
    }

    #[test]
    fn titled_block_joins_lines() {
        let html = titled_block("Info", &["a<b".to_string(), "c".to_string()]);
        assert_eq!(html, "<b>Info</b>\na&lt;b\nc");
    }
}

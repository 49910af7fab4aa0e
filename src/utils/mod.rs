use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Clean a page url: collapse runs of spaces, trim, lowercase, turn
/// spaces into underscores and backslashes into forward slashes.
/// Every caller constructing urls must go through this.
pub fn clean_url(url: &str) -> String {
    let mut collapsed = String::with_capacity(url.len());
    let mut prev_space = false;
    for ch in url.chars() {
        if ch == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        collapsed.push(ch);
    }
    collapsed
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace("\\\\", "/")
        .replace('\\', "/")
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace("&", "&amp;")
        .replace("<", "&lt;")
        .replace(">", "&gt;")
        .replace("\"", "&quot;")
        .replace("'", "&#39;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    text.replace("&", "&amp;")
        .replace("<", "&lt;")
        .replace(">", "&gt;")
        .replace("\"", "&quot;")
        .replace("'", "&#39;")
}

/// Current time as Unix-epoch seconds
pub fn now_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Format Unix-epoch seconds as RFC 3339 for display
pub fn format_timestamp(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_url_collapses_and_lowercases() {
        assert_eq!(clean_url("My   Page\\Sub"), "my_page/sub");
    }

    #[test]
    fn clean_url_trims_edges() {
        assert_eq!(clean_url("  Hello World  "), "hello_world");
    }

    #[test]
    fn clean_url_handles_double_backslashes() {
        assert_eq!(clean_url("a\\\\b"), "a/b");
        assert_eq!(clean_url("already/clean"), "already/clean");
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(
            escape_html("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

use crate::types::Meta;
use crate::utils::clean_url;

/// Pluggable text transform applied before rendering
pub type TextFilter = fn(&str) -> String;

/// Resolves a cleaned wiki url into an href
pub type UrlFormatter = fn(&str) -> String;

fn default_url_formatter(url: &str) -> String {
    format!("/{}", url)
}

/// Wikilink syntax: `[[Target]]` or `[[target/path|Label]]`. Targets may not
/// start with `<` so markup never leaks into the capture.
const WIKILINK_PATTERN: &str = r"\[\[([^<].+?)\s*(?:\|\s*(.+?)\s*)?\]\]";

/// Rewrite wikilink syntax in rendered HTML into hyperlinks.
///
/// Matches directly preceded by `<code>` are left alone. Replacement runs
/// occurrence-by-occurrence (first match replaced, then re-scanned) rather
/// than as one global substitution, so the formatter can produce distinct
/// output per occurrence.
pub fn wikilink(text: &str, url_formatter: UrlFormatter) -> String {
    let regex = Regex::new(WIKILINK_PATTERN).expect("wikilink pattern is well-formed");

    let found: Vec<(String, String)> = regex
        .captures_iter(text)
        .filter(|caps| !follows_code_tag(text, caps))
        .map(|caps| {
            let target = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let label = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(target);
            (target.to_string(), label.to_string())
        })
        .collect();

    let mut out = text.to_string();
    for (target, label) in found {
        let href = url_formatter(&clean_url(&target));
        let link = format!("<a href='{}'>{}</a>", href, label);
        let range = regex
            .captures_iter(&out)
            .find(|caps| !follows_code_tag(&out, caps))
            .map(|caps| caps.get(0).expect("whole match").range());
        if let Some(range) = range {
            out.replace_range(range, &link);
        }
    }
    out
}

fn follows_code_tag(text: &str, caps: &regex::Captures) -> bool {
    caps.get(0)
        .map(|m| text[..m.start()].ends_with("<code>"))
        .unwrap_or(false)
}

/// Convert the Markdown body to HTML
fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(text, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Front matter and body are separated by the first blank line
fn split_front_matter(text: &str) -> (&str, &str) {
    match text.split_once("\n\n") {
        Some((meta, body)) => (meta, body),
        None => (text, ""),
    }
}

/// Parse `key: value` front-matter lines. Keys are case-insensitive and kept
/// in original order; indented continuation lines join the previous value.
fn parse_meta(raw: &str) -> Meta {
    let mut meta = Meta::new();
    for line in raw.lines() {
        let continuation = line.starts_with(' ') || line.starts_with('\t');
        if !continuation {
            if let Some((key, value)) = line.split_once(':') {
                meta.insert(key.trim(), value.trim());
                continue;
            }
        }
        meta.extend_last(line.trim());
    }
    meta
}

/// The processor turns file content into metadata and HTML.
///
/// Pipeline: preprocessors, front-matter split, Markdown conversion,
/// postprocessing (wikilink rewriting).
pub struct Processor {
    input: String,
    preprocessors: Vec<TextFilter>,
    url_formatter: UrlFormatter,
}

impl Processor {
    pub fn new(text: &str) -> Self {
        Self {
            input: text.to_string(),
            preprocessors: Vec::new(),
            url_formatter: default_url_formatter,
        }
    }

    pub fn with_preprocessor(mut self, filter: TextFilter) -> Self {
        self.preprocessors.push(filter);
        self
    }

    pub fn with_url_formatter(mut self, formatter: UrlFormatter) -> Self {
        self.url_formatter = formatter;
        self
    }

    /// Run the full pipeline; returns (html, body, meta)
    pub fn process(&self) -> (String, String, Meta) {
        let mut current = self.input.clone();
        for filter in &self.preprocessors {
            current = filter(&current);
        }
        let (meta_raw, body) = split_front_matter(&current);
        let meta = parse_meta(meta_raw);
        let html = markdown_to_html(body);
        let final_html = wikilink(&html, self.url_formatter);
        (final_html, body.to_string(), meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wikilink_with_label() {
        let out = wikilink("[[hello|abc]]", default_url_formatter);
        assert_eq!(out, "<a href='/hello'>abc</a>");
    }

    #[test]
    fn wikilink_label_defaults_to_target() {
        let out = wikilink("[[World]]", default_url_formatter);
        assert_eq!(out, "<a href='/world'>World</a>");
    }

    #[test]
    fn wikilink_cleans_target() {
        let out = wikilink("[[My   Page\\Sub|here]]", default_url_formatter);
        assert_eq!(out, "<a href='/my_page/sub'>here</a>");
    }

    #[test]
    fn wikilink_skips_code_spans() {
        let text = "<code>[[literal]]</code> and [[real]]";
        let out = wikilink(text, default_url_formatter);
        assert_eq!(
            out,
            "<code>[[literal]]</code> and <a href='/real'>real</a>"
        );
    }

    #[test]
    fn wikilink_rewrites_every_occurrence() {
        let out = wikilink("[[a b]] then [[a b]]", default_url_formatter);
        assert_eq!(out, "<a href='/a_b'>a b</a> then <a href='/a_b'>a b</a>");
    }

    #[test]
    fn wikilink_custom_formatter() {
        let out = wikilink("[[hello]]", |url| format!("/wiki/{}", url));
        assert_eq!(out, "<a href='/wiki/hello'>hello</a>");
    }

    #[test]
    fn meta_split_at_first_blank_line() {
        let (html, body, meta) =
            Processor::new("title: Home\ntags: a, b\n\n# Heading\n").process();
        assert_eq!(meta.get("title"), Some("Home"));
        assert_eq!(meta.get("tags"), Some("a, b"));
        assert_eq!(body, "# Heading\n");
        assert!(html.contains("<h1>Heading</h1>"));
    }

    #[test]
    fn meta_keys_are_case_insensitive_and_ordered() {
        let (_, _, meta) = Processor::new("Title: X\nAuthor: Y\n\nbody").process();
        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "author"]);
        assert_eq!(meta.get("TITLE"), Some("X"));
    }

    #[test]
    fn meta_continuation_lines_join_with_newlines() {
        let (_, _, meta) = Processor::new("notes: first\n    second\n\nbody").process();
        assert_eq!(meta.get("notes"), Some("first\nsecond"));
    }

    #[test]
    fn no_blank_line_means_no_body() {
        let (_, body, meta) = Processor::new("title: Only Meta").process();
        assert_eq!(meta.get("title"), Some("Only Meta"));
        assert_eq!(body, "");
    }

    #[test]
    fn tables_are_rendered() {
        let (html, _, _) =
            Processor::new("\n\n| a | b |\n|---|---|\n| 1 | 2 |\n").process();
        assert!(html.contains("<table>"));
    }

    #[test]
    fn fenced_code_keeps_language_class() {
        let (html, _, _) = Processor::new("\n\n```rust\nlet x = 1;\n```\n").process();
        assert!(html.contains("language-rust"));
    }

    #[test]
    fn preprocessors_run_before_split() {
        fn upper(text: &str) -> String {
            text.to_uppercase()
        }
        let (_, body, _) = Processor::new("k: v\n\nhello")
            .with_preprocessor(upper)
            .process();
        assert_eq!(body, "HELLO");
    }
}

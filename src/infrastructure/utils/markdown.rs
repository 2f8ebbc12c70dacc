use pulldown_cmark::{html, Options, Parser};
use ammonia::{Builder, UrlRelative};

/// Converts Markdown content to sanitized HTML to prevent XSS attacks.
pub fn safe_markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut raw_html = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut raw_html, parser);

    sanitize_html(&raw_html)
}

/// Strips unsafe tags and attributes, keeping only absolute links.
pub fn sanitize_html(content: &str) -> String {
    Builder::default()
        .link_rel(Some("nofollow noopener noreferrer"))
        .url_relative(UrlRelative::Deny)
        .clean(content)
        .to_string()
}

/// Escapes plain text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

/// First paragraph of the description as plain text, cut at `max_chars`.
pub fn plain_excerpt(markdown: &str, max_chars: usize) -> String {
    let first = markdown
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or("");
    let mut excerpt: String = first.chars().take(max_chars).collect();
    if first.chars().count() > max_chars {
        excerpt.push('…');
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_markdown() {
        let html = safe_markdown_to_html("**bold** and [link](https://example.com)");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("rel=\"nofollow noopener noreferrer\""));
    }

    #[test]
    fn strips_scripts() {
        let html = safe_markdown_to_html("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn escapes_text() {
        let escaped = escape("<b>\"x\"</b>");
        assert!(escaped.starts_with("&lt;b&gt;&quot;x&quot;"));
        assert!(!escaped.contains('<'));
    }

    #[test]
    fn excerpt_takes_the_first_paragraph() {
        assert_eq!(plain_excerpt("\n\nFirst para.\n\nSecond.", 50), "First para.");
        assert_eq!(plain_excerpt("abcdef", 3), "abc…");
    }
}

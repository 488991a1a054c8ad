use std::collections::HashSet;

use ammonia::Builder;
use pulldown_cmark::{html, Options, Parser};

/// Post bodies are stored either as Markdown or as HTML produced by the
/// rich text editor. Anything that opens with a tag is treated as HTML.
pub fn looks_like_html(content: &str) -> bool {
    content.trim_start().starts_with('<')
}

pub fn markdown_to_html(markdown_input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown_input, options);
    let mut unsafe_html = String::new();
    html::push_html(&mut unsafe_html, parser);
    unsafe_html
}

/// Renders a post body to HTML that is safe to embed in admin pages.
pub fn render_post_body(content: &str) -> String {
    let unsafe_html = if looks_like_html(content) {
        content.to_string()
    } else {
        markdown_to_html(content)
    };
    sanitize_html(&unsafe_html)
}

pub fn sanitize_html(unsafe_html: &str) -> String {
    let tags_to_allow = [
        "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "p", "br", "a", "ul", "ol",
        "li", "blockquote", "code", "pre", "hr", "img", "table", "thead", "tbody", "tr", "th",
        "td", "s", "del", "div", "span", "sup", "input",
    ];
    let safe_tags = tags_to_allow.iter().cloned().collect::<HashSet<_>>();

    let safe_attributes = [
        "src", "href", "alt", "title", "class", "width", "height", "align", "type", "checked",
        "disabled", "id",
    ];
    let generic_attributes = safe_attributes.iter().cloned().collect::<HashSet<_>>();

    Builder::new()
        .tags(safe_tags)
        .generic_attributes(generic_attributes)
        .link_rel(Some("nofollow ugc"))
        .clean(unsafe_html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_is_rendered_and_scripts_removed() {
        let html = render_post_body("# Findings\n\nMedian **up** 4%.\n\n<script>alert(1)</script>");
        assert!(html.contains("<h1>Findings</h1>"));
        assert!(html.contains("<strong>up</strong>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn raw_html_bodies_are_sanitized_not_rerendered() {
        let html = render_post_body(r#"<p onclick="steal()">Hi <a href="https://x.example">x</a></p>"#);
        assert!(html.starts_with("<p>Hi"));
        assert!(!html.contains("onclick"));
        assert!(html.contains(r#"rel="nofollow ugc""#));
    }

    #[test]
    fn html_detection_ignores_leading_whitespace() {
        assert!(looks_like_html("\n  <div>x</div>"));
        assert!(!looks_like_html("Plain *markdown*"));
    }
}

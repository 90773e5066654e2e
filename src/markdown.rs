use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{html, Options, Parser};

/// Turns user-supplied Markdown into HTML that is safe to embed in a
/// rendered resume. The stages run in a fixed order: render, sanitize,
/// linkify. Sanitizing after linkification would strip the anchors the
/// linker just added; linkifying before sanitization would let the linker
/// see attacker-controlled markup.
pub fn render_markdown(raw: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(raw, options);

    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);

    let clean = sanitize(&rendered);
    linkify_html(&clean)
}

fn sanitize(rendered: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("span", &["class"])
        .add_tag_attributes("code", &["class"])
        .add_tag_attributes("pre", &["class"])
        .clean(rendered)
        .to_string()
}

/// Wraps bare URLs in anchor tags. Only text outside of markup is
/// considered; anything already inside an <a>, <pre> or <code> element is
/// left alone so existing links and code samples are not rewritten.
fn linkify_html(html: &str) -> String {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);

    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut skip_depth = 0usize;

    while let Some(tag_start) = rest.find('<') {
        let (text, tail) = rest.split_at(tag_start);
        if skip_depth == 0 {
            linkify_text(&finder, text, &mut out);
        } else {
            out.push_str(text);
        }

        let Some(tag_end) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[..=tag_end];

        if let Some(name) = element_name(tag) {
            if matches!(name.as_str(), "a" | "pre" | "code") {
                if tag.starts_with("</") {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if !tag.ends_with("/>") {
                    skip_depth += 1;
                }
            }
        }

        out.push_str(tag);
        rest = &tail[tag_end + 1..];
    }

    if skip_depth == 0 {
        linkify_text(&finder, rest, &mut out);
    } else {
        out.push_str(rest);
    }
    out
}

fn linkify_text(finder: &LinkFinder, text: &str, out: &mut String) {
    let mut last = 0;
    for link in finder.links(text) {
        out.push_str(&text[last..link.start()]);
        let url = link.as_str();
        out.push_str(&format!("<a href=\"{url}\" rel=\"noopener noreferrer\">{url}</a>"));
        last = link.end();
    }
    out.push_str(&text[last..]);
}

fn element_name(tag: &str) -> Option<String> {
    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let name: String = inner
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric())
        .collect();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::render_markdown;

    #[test]
    fn renders_basic_markdown() {
        let html = render_markdown("some **bold** text");
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn strips_script_tags() {
        let html = render_markdown("hello <script>alert(1)</script> world");
        assert!(!html.contains("<script>"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn linkifies_bare_urls() {
        let html = render_markdown("see https://example.com for details");
        assert!(html.contains("<a href=\"https://example.com\""));
    }

    #[test]
    fn does_not_rewrite_existing_links() {
        let html = render_markdown("[docs](https://example.com)");
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn leaves_code_blocks_alone() {
        let html = render_markdown("```\nhttps://example.com\n```");
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn keeps_headings_from_allow_list() {
        let html = render_markdown("## Experience");
        assert!(html.contains("<h2>Experience</h2>"));
    }
}

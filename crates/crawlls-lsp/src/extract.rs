//! HTML content extraction
//!
//! Turns a fetched page into an [`Article`]: page metadata plus the main
//! content converted to Markdown. Navigation, scripts, forms and other page
//! chrome are dropped; links and images are resolved against the page URL so
//! the Markdown stays navigable once it is cached on disk.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose content never belongs in the article body
const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "svg", "iframe", "button", "select", "input", "textarea", "canvas", "head",
];

/// Elements rendered as their own blocks without extra markup
const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "figure", "figcaption", "details",
    "summary", "dl", "dt", "dd", "center", "address", "li", "tbody", "thead",
];

/// Selectors tried in order to find the main content
const CONTENT_ROOTS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    "#content",
    ".content",
    "body",
];

/// Structured result of content extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    /// Page title
    pub title: Option<String>,
    /// Page description
    pub description: Option<String>,
    /// Author, when the page declares one
    pub author: Option<String>,
    /// Host the page was served from, without `www.`
    pub domain: Option<String>,
    /// Main content as Markdown
    pub content: String,
}

impl Article {
    /// Render the cache file: front matter (when any metadata is present) and the body
    pub fn to_markdown(&self) -> String {
        let fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("domain", &self.domain),
            ("author", &self.author),
        ];

        let mut out = String::new();
        let present: Vec<(&str, &str)> = fields
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (*key, v))
            })
            .collect();

        if !present.is_empty() {
            out.push_str("---\n");
            for (key, value) in present {
                out.push_str(&format!("{}: \"{}\"\n", key, escape_front_matter(value)));
            }
            out.push_str("---\n\n");
        }

        out.push_str(self.content.trim());
        out.push('\n');
        out
    }
}

fn escape_front_matter(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

/// Converts raw HTML into an [`Article`]
pub trait ContentExtractor: Send + Sync {
    /// Extract metadata and Markdown content from `html` served at `base_url`
    fn extract(&self, html: &str, base_url: &Url) -> Article;
}

/// Default extractor built on `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }
}

impl ContentExtractor for HtmlExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Article {
        let doc = Html::parse_document(html);

        let title = meta_content(
            &doc,
            &[r#"meta[property="og:title"]"#, r#"meta[name="twitter:title"]"#],
        )
        .or_else(|| first_text(&doc, "title"))
        .or_else(|| first_text(&doc, "h1"));
        let description = meta_content(
            &doc,
            &[r#"meta[property="og:description"]"#, r#"meta[name="description"]"#],
        );
        let author = meta_content(
            &doc,
            &[r#"meta[name="author"]"#, r#"meta[property="article:author"]"#],
        );
        let domain = base_url
            .host_str()
            .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string());

        let content = content_root(&doc)
            .map(|root| MarkdownWriter::new(base_url).render(root))
            .unwrap_or_default();

        Article {
            title,
            description,
            author,
            domain,
            content,
        }
    }
}

fn meta_content(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        doc.select(&selector)
            .filter_map(|meta| meta.value().attr("content"))
            .map(collapse_whitespace)
            .find(|content| !content.is_empty())
    })
}

fn first_text(doc: &Html, sel: &str) -> Option<String> {
    let selector = Selector::parse(sel).ok()?;
    doc.select(&selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn content_root(doc: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOTS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        doc.select(&selector)
            .find(|el| el.text().any(|t| !t.trim().is_empty()))
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `text` with whitespace runs collapsed to single spaces
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') && !out.ends_with('\n') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Walks an element tree and collects Markdown blocks
struct MarkdownWriter<'a> {
    base: &'a Url,
    blocks: Vec<String>,
    paragraph: String,
}

impl<'a> MarkdownWriter<'a> {
    fn new(base: &'a Url) -> Self {
        Self {
            base,
            blocks: Vec::new(),
            paragraph: String::new(),
        }
    }

    fn render(mut self, root: ElementRef<'_>) -> String {
        self.write_children(root);
        self.flush();
        self.blocks.join("\n\n")
    }

    fn write_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => push_collapsed(&mut self.paragraph, text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED.contains(&name) {
            return;
        }

        if let Some(level) = heading_level(name) {
            self.flush();
            let text = self.inline(element);
            if !text.is_empty() {
                self.blocks.push(format!("{} {}", "#".repeat(level), text));
            }
            return;
        }

        match name {
            "p" => {
                self.flush();
                let text = self.inline(element);
                self.push_block(text);
            }
            "pre" => {
                self.flush();
                self.blocks.push(code_block(element));
            }
            "ul" | "ol" => {
                self.flush();
                let list = self.list(element, 0);
                self.push_block(list);
            }
            "blockquote" => {
                self.flush();
                let inner = MarkdownWriter::new(self.base).render(element);
                let quoted = inner
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {}", line)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                self.push_block(quoted);
            }
            "table" => {
                self.flush();
                let table = self.table(element);
                self.push_block(table);
            }
            "hr" => {
                self.flush();
                self.blocks.push("---".to_string());
            }
            "br" => self.paragraph.push('\n'),
            _ if CONTAINERS.contains(&name) => {
                self.flush();
                self.write_children(element);
                self.flush();
            }
            _ => {
                let mut paragraph = std::mem::take(&mut self.paragraph);
                self.inline_element(element, &mut paragraph);
                self.paragraph = paragraph;
            }
        }
    }

    fn push_block(&mut self, block: String) {
        if !block.trim().is_empty() {
            self.blocks.push(block);
        }
    }

    fn flush(&mut self) {
        let text = self
            .paragraph
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        self.paragraph.clear();
        let text = text.trim();
        if !text.is_empty() {
            self.blocks.push(text.to_string());
        }
    }

    /// Inline Markdown for the children of `element`, trimmed
    fn inline(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.inline_children(element, &mut out);
        out.trim().to_string()
    }

    fn inline_children(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => push_collapsed(out, text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.inline_element(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    /// Append the inline rendering of `element` to `out`
    fn inline_element(&self, element: ElementRef<'_>, out: &mut String) {
        let name = element.value().name();
        if SKIPPED.contains(&name) {
            return;
        }

        match name {
            "br" => out.push('\n'),
            "a" => {
                let text = self.inline(element);
                let href = element
                    .value()
                    .attr("href")
                    .filter(|href| !href.trim_start().starts_with("javascript:"))
                    .and_then(|href| self.resolve(href));
                match href {
                    Some(href) if !text.is_empty() => {
                        out.push_str(&format!("[{}]({})", text, href))
                    }
                    _ => out.push_str(&text),
                }
            }
            "strong" | "b" => wrap_inline(out, &self.inline(element), "**"),
            "em" | "i" => wrap_inline(out, &self.inline(element), "*"),
            "del" | "s" | "strike" => wrap_inline(out, &self.inline(element), "~~"),
            "code" | "kbd" | "samp" => {
                let code = collapse_whitespace(&element.text().collect::<String>());
                wrap_inline(out, &code, "`");
            }
            "img" => {
                let alt = element.value().attr("alt").map(collapse_whitespace).unwrap_or_default();
                if let Some(src) = element.value().attr("src").and_then(|src| self.resolve(src)) {
                    out.push_str(&format!("![{}]({})", alt, src));
                }
            }
            _ => self.inline_children(element, out),
        }
    }

    fn list(&self, element: ElementRef<'_>, depth: usize) -> String {
        let ordered = element.value().name() == "ol";
        let mut index = element
            .value()
            .attr("start")
            .and_then(|start| start.trim().parse::<usize>().ok())
            .unwrap_or(1);
        let indent = "  ".repeat(depth);

        let mut lines = Vec::new();
        for item in element.children().filter_map(ElementRef::wrap) {
            if item.value().name() != "li" {
                continue;
            }

            let mut text = String::new();
            let mut nested = Vec::new();
            for child in item.children() {
                match child.value() {
                    Node::Text(t) => push_collapsed(&mut text, t),
                    Node::Element(_) => {
                        let Some(child) = ElementRef::wrap(child) else {
                            continue;
                        };
                        match child.value().name() {
                            "ul" | "ol" => nested.push(self.list(child, depth + 1)),
                            "p" | "div" => {
                                push_collapsed(&mut text, " ");
                                text.push_str(&self.inline(child));
                            }
                            _ => self.inline_element(child, &mut text),
                        }
                    }
                    _ => {}
                }
            }

            let marker = if ordered {
                format!("{}.", index)
            } else {
                "-".to_string()
            };
            lines.push(format!("{}{} {}", indent, marker, collapse_whitespace(&text)));
            lines.extend(nested.into_iter().filter(|n| !n.is_empty()));
            index += 1;
        }
        lines.join("\n")
    }

    fn table(&self, element: ElementRef<'_>) -> String {
        let rows: Vec<Vec<String>> = element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "tr")
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(|cell| self.inline(cell).replace('\n', " ").replace('|', "\\|"))
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();

        let Some(width) = rows.iter().map(Vec::len).max() else {
            return String::new();
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        for (i, row) in rows.iter().enumerate() {
            let mut cells = row.clone();
            cells.resize(width, String::new());
            lines.push(format!("| {} |", cells.join(" | ")));
            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(width)));
            }
        }
        lines.join("\n")
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.base.join(href).ok().map(|url| url.to_string())
    }
}

fn wrap_inline(out: &mut String, text: &str, marker: &str) {
    if !text.is_empty() {
        out.push_str(marker);
        out.push_str(text);
        out.push_str(marker);
    }
}

fn code_block(element: ElementRef<'_>) -> String {
    let language = element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code")
        .and_then(|code| {
            code.value().classes().find_map(|class| {
                class
                    .strip_prefix("language-")
                    .or_else(|| class.strip_prefix("lang-"))
                    .map(str::to_string)
            })
        })
        .unwrap_or_default();
    let code = element.text().collect::<String>();
    format!("```{}\n{}\n```", language, code.trim_matches('\n'))
}

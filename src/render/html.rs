//! Flatten a body tree into HTML

use serde::Serialize;
use std::collections::HashMap;

use super::highlight::Highlighter;
use super::tree::{plain_text, Align, Node};

/// Escape HTML special characters
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// One heading in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// HTML body plus the headings found while writing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyHtml {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Write `nodes` as HTML
pub fn write(nodes: &[Node], highlighter: Option<&Highlighter>) -> BodyHtml {
    let mut writer = HtmlWriter {
        out: String::new(),
        toc: Vec::new(),
        ids: HashMap::new(),
        highlighter,
    };
    writer.blocks(nodes);
    BodyHtml {
        html: writer.out,
        toc: writer.toc,
    }
}

struct HtmlWriter<'h> {
    out: String,
    toc: Vec<TocEntry>,
    ids: HashMap<String, usize>,
    highlighter: Option<&'h Highlighter>,
}

impl HtmlWriter<'_> {
    fn blocks(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn wrap(&mut self, tag: &str, children: &[Node]) {
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.blocks(children);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    /// Unique anchor for a heading; repeats get `-1`, `-2`, ...
    fn heading_id(&mut self, text: &str) -> String {
        let mut base = slug::slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }
        let mut n = self.ids.get(&base).copied().unwrap_or(0);
        let mut id = base.clone();
        if n > 0 {
            id = format!("{}-{}", base, n);
        }
        // A suffixed id can clash with a heading literally named that way
        while n > 0 && self.ids.contains_key(&id) {
            n += 1;
            id = format!("{}-{}", base, n);
        }
        self.ids.insert(base, n + 1);
        self.ids.entry(id.clone()).or_insert(1);
        id
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Heading { level, children } => {
                let text = plain_text(children);
                let id = self.heading_id(&text);
                self.out
                    .push_str(&format!("<h{} id=\"{}\">", level, escape(&id)));
                self.blocks(children);
                self.out.push_str(&format!("</h{}>\n", level));
                self.toc.push(TocEntry {
                    level: *level,
                    id,
                    text,
                });
            }
            Node::Paragraph(children) => {
                self.wrap("p", children);
                self.out.push('\n');
            }
            Node::BlockQuote(children) => {
                self.out.push_str("<blockquote>\n");
                self.blocks(children);
                self.out.push_str("</blockquote>\n");
            }
            Node::List { start, items } => {
                match start {
                    Some(1) => self.out.push_str("<ol>\n"),
                    Some(n) => self.out.push_str(&format!("<ol start=\"{}\">\n", n)),
                    None => self.out.push_str("<ul>\n"),
                }
                self.blocks(items);
                self.out
                    .push_str(if start.is_some() { "</ol>\n" } else { "</ul>\n" });
            }
            Node::ListItem(children) => {
                self.wrap("li", children);
                self.out.push('\n');
            }
            Node::CodeBlock { info, code } => self.code_block(info.as_deref(), code),
            Node::Table { alignments, rows } => self.table(alignments, rows),
            // Rows and cells only appear inside a table
            Node::TableHead(cells) | Node::TableRow(cells) => self.wrap("tr", cells),
            Node::TableCell(children) => self.wrap("td", children),
            Node::Rule => self.out.push_str("<hr />\n"),
            Node::Html(html) => self.out.push_str(html),
            Node::Text(text) => self.out.push_str(&escape(text)),
            Node::Code(code) => {
                self.out.push_str("<code>");
                self.out.push_str(&escape(code));
                self.out.push_str("</code>");
            }
            Node::Emphasis(children) => self.wrap("em", children),
            Node::Strong(children) => self.wrap("strong", children),
            Node::Strikethrough(children) => self.wrap("del", children),
            Node::Link {
                href,
                title,
                children,
            } => {
                self.out.push_str(&format!("<a href=\"{}\"", escape(href)));
                if !title.is_empty() {
                    self.out.push_str(&format!(" title=\"{}\"", escape(title)));
                }
                self.out.push('>');
                self.blocks(children);
                self.out.push_str("</a>");
            }
            Node::Image { src, title, alt } => {
                self.out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"",
                    escape(src),
                    escape(alt)
                ));
                if !title.is_empty() {
                    self.out.push_str(&format!(" title=\"{}\"", escape(title)));
                }
                self.out.push_str(" />");
            }
            Node::SoftBreak => self.out.push('\n'),
            Node::HardBreak => self.out.push_str("<br />\n"),
        }
    }

    fn code_block(&mut self, info: Option<&str>, code: &str) {
        // The first word of the info string names the language
        let lang = info.and_then(|i| i.split_whitespace().next());

        if let (Some(lang), Some(highlighter)) = (lang, self.highlighter) {
            if let Some(html) = highlighter.highlight(code, lang) {
                self.out.push_str(&html);
                self.out.push('\n');
                return;
            }
        }

        match lang {
            Some(lang) => self.out.push_str(&format!(
                "<pre><code class=\"language-{}\">",
                escape(lang)
            )),
            None => self.out.push_str("<pre><code>"),
        }
        self.out.push_str(&escape(code));
        self.out.push_str("</code></pre>\n");
    }

    fn table(&mut self, alignments: &[Align], rows: &[Node]) {
        self.out.push_str("<table>\n");
        let mut body_open = false;
        for row in rows {
            let (cells, head) = match row {
                Node::TableHead(cells) => (cells, true),
                Node::TableRow(cells) => (cells, false),
                other => {
                    self.node(other);
                    continue;
                }
            };
            if head {
                self.out.push_str("<thead>\n");
            } else if !body_open {
                self.out.push_str("<tbody>\n");
                body_open = true;
            }
            self.out.push_str("<tr>");
            let cell_tag = if head { "th" } else { "td" };
            for (i, cell) in cells.iter().enumerate() {
                let children = match cell {
                    Node::TableCell(children) => children.as_slice(),
                    other => std::slice::from_ref(other),
                };
                let align = match alignments.get(i).copied().unwrap_or(Align::None) {
                    Align::None => "",
                    Align::Left => " style=\"text-align: left\"",
                    Align::Center => " style=\"text-align: center\"",
                    Align::Right => " style=\"text-align: right\"",
                };
                self.out.push_str(&format!("<{}{}>", cell_tag, align));
                self.blocks(children);
                self.out.push_str(&format!("</{}>", cell_tag));
            }
            self.out.push_str("</tr>\n");
            if head {
                self.out.push_str("</thead>\n");
            }
        }
        if body_open {
            self.out.push_str("</tbody>\n");
        }
        self.out.push_str("</table>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tree::parse;

    fn html(markup: &str) -> BodyHtml {
        write(&parse(markup), None)
    }

    #[test]
    fn test_heading_with_id() {
        let out = html("# Hello World\n\nThis is a test.");
        assert!(out.html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(out.html.contains("<p>This is a test.</p>"));
        assert_eq!(
            out.toc,
            vec![TocEntry {
                level: 1,
                id: "hello-world".to_string(),
                text: "Hello World".to_string(),
            }]
        );
    }

    #[test]
    fn test_repeated_heading_ids() {
        let out = html("## Setup\n\n## Setup\n\n## Setup\n");
        let ids: Vec<_> = out.toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "setup-2"]);

        let out = html("## Setup\n\n## Setup 1\n\n## Setup\n\n## Setup 1\n");
        let ids: Vec<_> = out.toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "setup-2", "setup-1-1"]);
    }

    #[test]
    fn test_code_block_is_literal() {
        let out = html("```\n# not a heading\n<b>&</b>\n```\n");
        assert!(!out.html.contains("<h1"));
        assert!(out
            .html
            .contains("<pre><code># not a heading\n&lt;b&gt;&amp;&lt;/b&gt;\n</code></pre>"));
        assert!(out.toc.is_empty());
    }

    #[test]
    fn test_code_block_language_class() {
        let out = html("```csharp\nvar x = 1;\n```\n");
        assert!(out
            .html
            .contains("<pre><code class=\"language-csharp\">var x = 1;\n</code></pre>"));
    }

    #[test]
    fn test_inline_elements() {
        let out = html("**bold** *em* `code` ~~gone~~ [link](/a \"t\") ![pic](/p.png)");
        assert!(out.html.contains("<strong>bold</strong>"));
        assert!(out.html.contains("<em>em</em>"));
        assert!(out.html.contains("<code>code</code>"));
        assert!(out.html.contains("<del>gone</del>"));
        assert!(out.html.contains("<a href=\"/a\" title=\"t\">link</a>"));
        assert!(out.html.contains("<img src=\"/p.png\" alt=\"pic\" />"));
    }

    #[test]
    fn test_lists_and_quote() {
        let out = html("- a\n- b\n\n4. four\n\n> quote\n");
        assert!(out.html.contains("<ul>\n<li>a</li>\n<li>b</li>\n</ul>"));
        assert!(out.html.contains("<ol start=\"4\">"));
        assert!(out.html.contains("<blockquote>\n<p>quote</p>\n</blockquote>"));
    }

    #[test]
    fn test_table_html() {
        let out = html("| Name | Qty |\n|------|----:|\n| apple | 3 |\n");
        assert!(out.html.contains("<thead>\n<tr><th>Name</th><th style=\"text-align: right\">Qty</th></tr>\n</thead>"));
        assert!(out.html.contains("<tbody>\n<tr><td>apple</td><td style=\"text-align: right\">3</td></tr>"));
    }

    #[test]
    fn test_malformed_inline_passes_through() {
        let out = html("a *dangling and [broken](link");
        assert!(out.html.contains("a *dangling and [broken](link"));
    }

    #[test]
    fn test_text_is_escaped() {
        let out = html("1 < 2 & 3");
        assert!(out.html.contains("1 &lt; 2 &amp; 3"));
    }
}

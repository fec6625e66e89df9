//! Markup body to a structural tree

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};

/// Column alignment of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl From<Alignment> for Align {
    fn from(a: Alignment) -> Self {
        match a {
            Alignment::None => Align::None,
            Alignment::Left => Align::Left,
            Alignment::Center => Align::Center,
            Alignment::Right => Align::Right,
        }
    }
}

/// One node of a rendered body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading { level: u8, children: Vec<Node> },
    Paragraph(Vec<Node>),
    BlockQuote(Vec<Node>),
    List { start: Option<u64>, items: Vec<Node> },
    ListItem(Vec<Node>),
    /// Fenced or indented code. `info` is the fence's info string, untouched.
    CodeBlock { info: Option<String>, code: String },
    Table { alignments: Vec<Align>, rows: Vec<Node> },
    TableHead(Vec<Node>),
    TableRow(Vec<Node>),
    TableCell(Vec<Node>),
    Rule,
    /// Raw HTML from the source, passed through
    Html(String),
    Text(String),
    Code(String),
    Emphasis(Vec<Node>),
    Strong(Vec<Node>),
    Strikethrough(Vec<Node>),
    Link { href: String, title: String, children: Vec<Node> },
    Image { src: String, title: String, alt: String },
    SoftBreak,
    HardBreak,
}

impl Node {
    /// Concatenated text content, markup dropped
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) | Node::Code(t) => out.push_str(t),
            Node::CodeBlock { code, .. } => out.push_str(code),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::SoftBreak | Node::HardBreak => out.push(' '),
            Node::Rule | Node::Html(_) => {}
            Node::Heading { children, .. }
            | Node::Paragraph(children)
            | Node::BlockQuote(children)
            | Node::List {
                items: children, ..
            }
            | Node::ListItem(children)
            | Node::Table { rows: children, .. }
            | Node::TableHead(children)
            | Node::TableRow(children)
            | Node::TableCell(children)
            | Node::Emphasis(children)
            | Node::Strong(children)
            | Node::Strikethrough(children)
            | Node::Link { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Text of a node list
pub fn plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(Node::plain_text).collect()
}

/// Container waiting for its end event
enum Open {
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Table(Vec<Align>),
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: String },
    Image { src: String, title: String },
    /// Anything else: children are spliced into the parent
    Transparent,
}

impl Open {
    fn from_tag(tag: Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => Open::Paragraph,
            Tag::Heading { level, .. } => Open::Heading(level as u8),
            Tag::BlockQuote(_) => Open::BlockQuote,
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                let info = info.trim();
                Open::CodeBlock((!info.is_empty()).then(|| info.to_string()))
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => Open::CodeBlock(None),
            Tag::List(start) => Open::List(start),
            Tag::Item => Open::Item,
            Tag::Table(alignments) => {
                Open::Table(alignments.into_iter().map(Align::from).collect())
            }
            Tag::TableHead => Open::TableHead,
            Tag::TableRow => Open::TableRow,
            Tag::TableCell => Open::TableCell,
            Tag::Emphasis => Open::Emphasis,
            Tag::Strong => Open::Strong,
            Tag::Strikethrough => Open::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => Open::Link {
                href: dest_url.to_string(),
                title: title.to_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Open::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
            },
            _ => Open::Transparent,
        }
    }
}

struct Frame {
    open: Open,
    children: Vec<Node>,
    code: String,
}

impl Frame {
    fn new(open: Open) -> Self {
        Self {
            open,
            children: Vec::new(),
            code: String::new(),
        }
    }

    fn push(&mut self, node: Node) {
        if let (Node::Text(new), Some(Node::Text(last))) = (&node, self.children.last_mut()) {
            last.push_str(new);
            return;
        }
        self.children.push(node);
    }

    fn close(self) -> Vec<Node> {
        let children = self.children;
        let node = match self.open {
            Open::Paragraph => Node::Paragraph(children),
            Open::Heading(level) => Node::Heading { level, children },
            Open::BlockQuote => Node::BlockQuote(children),
            Open::CodeBlock(info) => Node::CodeBlock {
                info,
                code: self.code,
            },
            Open::List(start) => Node::List {
                start,
                items: children,
            },
            Open::Item => Node::ListItem(children),
            Open::Table(alignments) => Node::Table {
                alignments,
                rows: children,
            },
            Open::TableHead => Node::TableHead(children),
            Open::TableRow => Node::TableRow(children),
            Open::TableCell => Node::TableCell(children),
            Open::Emphasis => Node::Emphasis(children),
            Open::Strong => Node::Strong(children),
            Open::Strikethrough => Node::Strikethrough(children),
            Open::Link { href, title } => Node::Link {
                href,
                title,
                children,
            },
            Open::Image { src, title } => Node::Image {
                src,
                title,
                alt: plain_text(&children),
            },
            Open::Transparent => return children,
        };
        vec![node]
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Parse a markup body into a tree.
///
/// Total over any input: unmatched markers come back as literal text.
pub fn parse(markup: &str) -> Vec<Node> {
    let mut stack = vec![Frame::new(Open::Transparent)];

    for event in Parser::new_ext(markup, options()) {
        match event {
            Event::Start(tag) => stack.push(Frame::new(Open::from_tag(tag))),
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        let nodes = frame.close();
                        if let Some(parent) = stack.last_mut() {
                            for node in nodes {
                                parent.push(node);
                            }
                        }
                    }
                }
            }
            event => {
                let Some(top) = stack.last_mut() else {
                    continue;
                };
                match event {
                    Event::Text(text) => {
                        if matches!(top.open, Open::CodeBlock(_)) {
                            top.code.push_str(&text);
                        } else {
                            top.push(Node::Text(text.to_string()));
                        }
                    }
                    Event::Code(code) => top.push(Node::Code(code.to_string())),
                    Event::Html(html) | Event::InlineHtml(html) => {
                        top.push(Node::Html(html.to_string()))
                    }
                    Event::SoftBreak => top.push(Node::SoftBreak),
                    Event::HardBreak => top.push(Node::HardBreak),
                    Event::Rule => top.push(Node::Rule),
                    _ => {}
                }
            }
        }
    }

    // Unbalanced events cannot come out of the parser, but fold any leftovers
    // into the root rather than losing them.
    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            let nodes = frame.close();
            if let Some(parent) = stack.last_mut() {
                for node in nodes {
                    parent.push(node);
                }
            }
        }
    }

    stack.pop().map(|root| root.children).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn test_heading_and_paragraph() {
        let tree = parse("# Hi\n\nSome *words* here.");
        assert_eq!(
            tree,
            vec![
                Node::Heading {
                    level: 1,
                    children: vec![text("Hi")],
                },
                Node::Paragraph(vec![
                    text("Some "),
                    Node::Emphasis(vec![text("words")]),
                    text(" here."),
                ]),
            ]
        );
    }

    #[test]
    fn test_all_heading_levels() {
        let tree = parse("# a\n## b\n### c\n#### d\n##### e\n###### f\n");
        let levels: Vec<u8> = tree
            .iter()
            .filter_map(|n| match n {
                Node::Heading { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_fenced_code_is_opaque() {
        let tree = parse("```csharp\n# not a heading\n**not bold**\n---\n```\n");
        assert_eq!(
            tree,
            vec![Node::CodeBlock {
                info: Some("csharp".to_string()),
                code: "# not a heading\n**not bold**\n---\n".to_string(),
            }]
        );
    }

    #[test]
    fn test_info_string_kept_verbatim() {
        let tree = parse("```gherkin title=\"feature\"\nGiven x\n```\n");
        assert!(matches!(
            &tree[0],
            Node::CodeBlock { info: Some(info), .. } if info == "gherkin title=\"feature\""
        ));
    }

    #[test]
    fn test_unterminated_emphasis_is_literal() {
        let tree = parse("an *unterminated marker");
        assert_eq!(
            tree,
            vec![Node::Paragraph(vec![text("an *unterminated marker")])]
        );
    }

    #[test]
    fn test_links_images_lists_quotes() {
        let tree = parse(
            "> quoted [link](https://example.com \"T\")\n\n- one\n- two\n\n3. three\n\n![alt *text*](img.png)\n",
        );
        assert!(matches!(&tree[0], Node::BlockQuote(_)));
        assert_eq!(
            tree[0].plain_text(),
            "quoted link",
            "block quote keeps its text"
        );
        assert!(matches!(&tree[1], Node::List { start: None, items } if items.len() == 2));
        assert!(matches!(&tree[2], Node::List { start: Some(3), .. }));
        match &tree[3] {
            Node::Paragraph(children) => assert_eq!(
                children[0],
                Node::Image {
                    src: "img.png".to_string(),
                    title: String::new(),
                    alt: "alt text".to_string(),
                }
            ),
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_table() {
        let tree = parse("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        match &tree[0] {
            Node::Table { alignments, rows } => {
                assert_eq!(alignments, &vec![Align::Left, Align::Right]);
                assert!(matches!(&rows[0], Node::TableHead(cells) if cells.len() == 2));
                assert!(matches!(&rows[1], Node::TableRow(cells) if cells.len() == 2));
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body() {
        assert!(parse("").is_empty());
    }
}

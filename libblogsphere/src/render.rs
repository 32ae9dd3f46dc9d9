//! Typed fragments for everything the interaction layer inserts into a page
//!
//! Fragments are built from [`Node`] values rather than strings. Text only
//! ever enters a fragment as a [`Node::Text`], and serialization escapes it,
//! so server-supplied content cannot turn into markup.

use crate::types::{CommentView, PostId};

/// A node in an insertable fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// `<br>`
    LineBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one or more space-separated classes
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::LineBreak => out.push('\n'),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Serialize to HTML, escaping all text and attribute values
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::LineBreak => out.push_str("<br>"),
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                if let Some(id) = &element.id {
                    push_attr(out, "id", id);
                }
                if !element.classes.is_empty() {
                    push_attr(out, "class", &element.classes.join(" "));
                }
                for (name, value) in &element.attrs {
                    push_attr(out, name, value);
                }
                out.push('>');
                for child in &element.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }
}

/// Serialize a sequence of sibling nodes
pub fn fragment_html(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_html).collect()
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Text with every `\n` turned into a line break
pub fn multiline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::LineBreak);
        }
        if !line.is_empty() {
            nodes.push(Node::text(line));
        }
    }
    nodes
}

fn icon(classes: &str) -> Node {
    Element::new("i").class(classes).into()
}

/// A freshly created comment, ready to prepend to `#comments-list`
pub fn comment_item(comment: &CommentView) -> Node {
    let header = Element::new("div")
        .class("comment-header")
        .child(
            Element::new("strong")
                .class("comment-author")
                .text(comment.author.as_str()),
        )
        .child(
            Element::new("small")
                .class("text-muted ms-2 comment-time")
                .text(comment.display_time()),
        );

    let body = Element::new("div").class("comment-body").child(
        Element::new("p")
            .class("mt-2 mb-0")
            .children(multiline(&comment.content)),
    );

    let actions = Element::new("div").class("comment-actions").child(
        Element::new("button")
            .class("btn btn-sm btn-outline-danger delete-comment-btn")
            .attr("data-comment-id", comment.id.to_string())
            .attr("title", "Delete comment")
            .child(icon("fas fa-trash")),
    );

    Element::new("div")
        .class("comment-item animate__animated animate__fadeInDown")
        .id(comment.element_id())
        .child(
            Element::new("div")
                .class("d-flex justify-content-between align-items-start")
                .child(
                    Element::new("div")
                        .class("comment-content")
                        .child(header)
                        .child(body),
                )
                .child(actions),
        )
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
}

pub fn toast(message: &str, kind: ToastKind) -> Node {
    let background = match kind {
        ToastKind::Success => "bg-success",
        ToastKind::Info => "bg-primary",
    };

    Element::new("div")
        .class("toast show align-items-center text-white border-0")
        .class(background)
        .attr("role", "alert")
        .child(
            Element::new("div")
                .class("d-flex")
                .child(Element::new("div").class("toast-body").text(message))
                .child(
                    Element::new("button")
                        .class("btn-close btn-close-white me-2 m-auto")
                        .attr("type", "button")
                        .attr("data-bs-dismiss", "toast"),
                ),
        )
        .into()
}

/// Banner shown above a form when submission is blocked
pub fn form_error(message: &str) -> Node {
    Element::new("div")
        .class("alert alert-danger form-error-message mt-3")
        .attr("role", "alert")
        .child(icon("fas fa-exclamation-triangle"))
        .text(format!(" {}", message))
        .into()
}

/// Inline message placed right after an invalid field
pub fn invalid_feedback(message: &str) -> Node {
    Element::new("div")
        .class("invalid-feedback")
        .text(message)
        .into()
}

/// Submit button contents while a submission is in flight
pub fn loading_label(text: &str) -> Vec<Node> {
    vec![icon("fas fa-spinner fa-spin"), Node::text(format!(" {}", text))]
}

pub fn bookmark_label(bookmarked: bool) -> Vec<Node> {
    if bookmarked {
        vec![icon("fas fa-bookmark"), Node::text(" Bookmarked")]
    } else {
        vec![icon("far fa-bookmark"), Node::text(" Bookmark")]
    }
}

pub fn reading_progress() -> Node {
    Element::new("div")
        .class("reading-progress")
        .child(Element::new("div").class("progress-bar"))
        .into()
}

/// Counter line created under the comment box when the page lacks one
pub fn comment_counter(max: usize) -> Node {
    Element::new("div")
        .class("form-text")
        .child(Element::new("span").id("comment-counter").text("0"))
        .text(format!("/{} characters", max))
        .into()
}

pub fn post_url(origin: &str, post_id: PostId) -> String {
    format!("{}/post/{}", origin.trim_end_matches('/'), post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommentId;

    fn sample_comment(content: &str) -> CommentView {
        CommentView {
            id: CommentId(42),
            author: "alice".to_string(),
            content: content.to_string(),
            created_at: "2024-01-02 03:04:05".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_multiline_converts_newlines() {
        assert_eq!(
            multiline("hi\nthere"),
            vec![Node::text("hi"), Node::LineBreak, Node::text("there")]
        );
        assert_eq!(multiline("a\n\nb").len(), 4);
    }

    #[test]
    fn test_comment_item_is_addressable_and_escaped() {
        let html = comment_item(&sample_comment("hi\nthere")).to_html();
        assert!(html.contains(r#"id="comment-42""#));
        assert!(html.contains("hi<br>there"));
        assert!(html.contains(r#"data-comment-id="42""#));
        assert!(html.contains(">alice<"));

        let html = comment_item(&sample_comment("<script>alert(1)</script>")).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_author_is_escaped() {
        let mut comment = sample_comment("hi");
        comment.author = "<img src=x>".to_string();
        let html = comment_item(&comment).to_html();
        assert!(html.contains("&lt;img src=x&gt;"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let node: Node = Element::new("a").attr("title", "\"><x").into();
        assert_eq!(node.to_html(), r#"<a title="&quot;&gt;&lt;x"></a>"#);
    }

    #[test]
    fn test_text_content() {
        let node = form_error("Passwords do not match!");
        assert_eq!(node.text_content(), " Passwords do not match!");
    }

    #[test]
    fn test_toast_classes() {
        let html = toast("Saved", ToastKind::Success).to_html();
        assert!(html.contains("bg-success"));
        assert!(html.contains("Saved"));
        assert!(toast("Hi", ToastKind::Info).to_html().contains("bg-primary"));
    }

    #[test]
    fn test_bookmark_label() {
        assert_eq!(
            fragment_html(&bookmark_label(true)),
            r#"<i class="fas fa-bookmark"></i> Bookmarked"#
        );
        assert_eq!(
            fragment_html(&bookmark_label(false)),
            r#"<i class="far fa-bookmark"></i> Bookmark"#
        );
    }

    #[test]
    fn test_post_url() {
        assert_eq!(
            post_url("https://blog.example.com/", PostId(9)),
            "https://blog.example.com/post/9"
        );
    }
}

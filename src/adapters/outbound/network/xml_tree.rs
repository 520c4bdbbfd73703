use regex::Regex;
use std::sync::LazyLock;

static IGNORED_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<\?.*?\?>|<!DOCTYPE[^>]*>")
        .expect("ignored markup pattern is valid")
});

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("CDATA pattern is valid"));

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z_][\w.:-]*)(?:\s+(?:[^>"']|"[^"]*"|'[^']*')*?)?\s*(/?)>"#)
        .expect("tag pattern is valid")
});

/// Element of a parsed XML document: name, concatenated text and child elements
///
/// Attributes and namespaces are dropped; descriptor and metadata files
/// carry everything of interest in element text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(name: &str) -> Self {
        Self {
            name: local_name(name).to_string(),
            ..Default::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the first child called `name`, if it is not blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// Parses `document` into its root element.
///
/// # Errors
/// Returns a description of the first structural problem: a closing tag
/// that does not match, an unclosed element, or no root element at all.
pub fn parse(document: &str) -> Result<XmlElement, String> {
    let document = IGNORED_MARKUP.replace_all(document, "");
    let document = CDATA.replace_all(&document, |captures: &regex::Captures| {
        escape(&captures[1])
    });

    let mut stack = vec![XmlElement::default()];
    let mut position = 0;

    for captures in TAG.captures_iter(&document) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(2)) else {
            continue;
        };
        append_text(&mut stack, &document[position..whole.start()]);
        position = whole.end();

        let closing = !captures[1].is_empty();
        let self_closing = !captures[3].is_empty();

        if closing {
            // The bottom of the stack is the document itself and is never closed
            let Some(element) = stack.pop().filter(|_| !stack.is_empty()) else {
                return Err(format!("Unexpected closing tag </{}>", name.as_str()));
            };
            if element.name != local_name(name.as_str()) {
                return Err(format!(
                    "Closing tag </{}> does not match <{}>",
                    name.as_str(),
                    element.name
                ));
            }
            push_child(&mut stack, element);
        } else if self_closing {
            push_child(&mut stack, XmlElement::named(name.as_str()));
        } else {
            stack.push(XmlElement::named(name.as_str()));
        }
    }

    if stack.len() != 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(format!("Element <{}> is not closed", open));
    }

    stack
        .pop()
        .and_then(|document| document.children.into_iter().next())
        .ok_or_else(|| "Document has no root element".to_string())
}

fn push_child(stack: &mut [XmlElement], element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    }
}

fn append_text(stack: &mut [XmlElement], raw: &str) {
    if raw.trim().is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.text.push_str(&unescape(raw));
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(
            r#"<?xml version="1.0"?>
<!-- leading comment -->
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <name>Demo &amp; Co</name>
  <licenses>
    <license><name>MIT</name></license>
    <license><name>Apache-2.0</name><url>https://x</url></license>
  </licenses>
  <empty/>
</project>"#,
        )
        .unwrap();

        assert_eq!(root.name, "project");
        assert_eq!(root.child_text("name"), Some("Demo & Co"));
        let licenses: Vec<_> = root
            .child("licenses")
            .unwrap()
            .children_named("license")
            .collect();
        assert_eq!(licenses.len(), 2);
        assert_eq!(licenses[1].child_text("url"), Some("https://x"));
        assert!(root.child("empty").is_some());
        assert_eq!(root.child_text("empty"), None);
    }

    #[test]
    fn test_cdata_and_attributes() {
        let root = parse(
            r#"<a id="1" note='x > y'><b><![CDATA[<not a tag>]]></b></a>"#,
        )
        .unwrap();
        assert_eq!(root.child_text("b"), Some("<not a tag>"));
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(parse("<a><b></a></b>").is_err());
        assert!(parse("<a><b></b>").is_err());
        assert!(parse("</a>").is_err());
        assert!(parse("just text").is_err());
    }
}

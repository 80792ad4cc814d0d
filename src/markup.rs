use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

// `text` is the character data before the first child; `tail` follows the
// end tag up to the next sibling or the parent's end tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_tail(mut self, tail: &str) -> Self {
        self.tail = Some(tail.to_string());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map_or("", str::trim)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

fn append(slot: &mut Option<String>, data: &str) {
    match slot {
        Some(existing) => existing.push_str(data),
        None => *slot = Some(data.to_string()),
    }
}

fn open(start: &BytesStart) -> Result<Element> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(&tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Markup(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Markup(e.to_string()))?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

pub fn load(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    // Character data goes to the open element's text until it has a child,
    // then to the last child's tail.
    let push_data = |stack: &mut Vec<Element>, data: &str| {
        if let Some(current) = stack.last_mut() {
            match current.children.last_mut() {
                Some(last) => append(&mut last.tail, data),
                None => append(&mut current.text, data),
            }
        }
    };

    let mut close = |stack: &mut Vec<Element>, element: Element| -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => root = Some(element),
            None => return Err(Error::Markup("multiple root elements".to_string())),
        }
        Ok(())
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Markup(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(start) => stack.push(open(&start)?),
            Event::Empty(start) => {
                let element = open(&start)?;
                close(&mut stack, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Markup("unbalanced end tag".to_string()))?;
                close(&mut stack, element)?;
            }
            Event::Text(data) => {
                let data = data.unescape().map_err(|e| Error::Markup(e.to_string()))?;
                push_data(&mut stack, &data);
            }
            Event::CData(data) => {
                let data = String::from_utf8_lossy(&data.into_inner()).into_owned();
                push_data(&mut stack, &data);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::Markup("unclosed element at end of input".to_string()));
    }
    root.ok_or_else(|| Error::Markup("no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_tail() {
        let root = load("<m><f>Hello <name/> and <e>world</e>!</f></m>").unwrap();
        let f = &root.children[0];
        assert_eq!(f.text.as_deref(), Some("Hello "));
        assert_eq!(f.children[0].tag, "name");
        assert_eq!(f.children[0].tail.as_deref(), Some(" and "));
        assert_eq!(f.children[1].text.as_deref(), Some("world"));
        assert_eq!(f.children[1].tail.as_deref(), Some("!"));
    }

    #[test]
    fn test_attributes_keep_order() {
        let root = load(r#"<m><e cast="bytes" encoding="ascii">a</e></m>"#).unwrap();
        let e = &root.children[0];
        let keys: Vec<&str> = e.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["cast", "encoding"]);
        assert_eq!(e.attr("encoding"), Some("ascii"));
    }

    #[test]
    fn test_entities_unescaped() {
        let root = load("<m><e>a &lt; b &amp; c</e></m>").unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("a < b & c"));
    }

    #[test]
    fn test_cdata_verbatim() {
        let root = load("<m><e><![CDATA[<raw>]]></e></m>").unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("<raw>"));
    }

    #[test]
    fn test_declaration_and_comments_ignored() {
        let root = load("<?xml version=\"1.0\"?>\n<!-- c --><m><!-- x --><a/></m>").unwrap();
        assert_eq!(root.tag, "m");
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_unicode_text_preserved() {
        let root = load("<m><e>ÇĞİÖŞÜ çğıöşü</e></m>").unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("ÇĞİÖŞÜ çğıöşü"));
    }

    #[test]
    fn test_no_root_is_error() {
        assert!(matches!(load("   "), Err(Error::Markup(_))));
    }

    #[test]
    fn test_mismatched_tags_are_error() {
        assert!(load("<m><a></b></m>").is_err());
    }

    #[test]
    fn test_trimmed_text() {
        let e = Element::new("e").with_text("  15 \n");
        assert_eq!(e.trimmed_text(), "15");
        assert_eq!(Element::new("e").trimmed_text(), "");
    }
}

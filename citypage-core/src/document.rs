//! In-memory XML tree used by the site list and city documents.
//!
//! Parsing, lookups, path enumeration, cloning and dropping all walk the
//! tree with explicit stacks, so arbitrarily deep documents never exhaust
//! the call stack. `Debug` prints a child count instead of the subtree.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::error::WeatherError;

/// One element of a parsed document.
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, WeatherError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((name, value));
        }

        Ok(Self { tag, attributes, text: None, children: Vec::new() })
    }

    /// Copy of this element without its children.
    fn shallow(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            text: self.text.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in the order they appear in the document.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Text preceding the first child element; empty when there is none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn matches(&self, segment: &str) -> bool {
        segment == "*" || self.tag == segment
    }

    fn push_text(&mut self, text: &str) {
        // Text after the first child is tail content of that child; not kept.
        if !self.children.is_empty() {
            return;
        }
        self.text.get_or_insert_with(String::new).push_str(text);
    }

    /// Path segment for this element, e.g. `temperature[@unitType='metric'][@units='C']`.
    fn segment(&self, with_predicates: bool) -> String {
        let mut segment = self.tag.clone();
        if with_predicates {
            for (name, value) in &self.attributes {
                segment.push_str(&format!("[@{name}='{value}']"));
            }
        }
        segment
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        let mut open = vec![(self, self.shallow())];
        let mut finished = None;

        while let Some((source, copy)) = open.pop() {
            if let Some(child) = source.children.get(copy.children.len()) {
                open.push((source, copy));
                open.push((child, child.shallow()));
            } else if let Some((_, parent)) = open.last_mut() {
                parent.children.push(copy);
            } else {
                finished = Some(copy);
            }
        }

        finished.unwrap_or_else(|| self.shallow())
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("children", &self.children.len())
            .finish()
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// A parsed XML document. The default value has no root and answers every
/// lookup with "not found".
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Option<Element>,
}

impl Document {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(xml: &str) -> Result<Self, WeatherError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => open.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    close(&mut open, &mut root, element)?;
                }
                Event::End(end) => {
                    let element = open.pop().ok_or_else(|| {
                        WeatherError::MalformedDocument(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    close(&mut open, &mut root, element)?;
                }
                Event::Text(text) => push_text(&mut open, &text.unescape()?)?,
                Event::CData(data) => {
                    let raw = data.into_inner();
                    push_text(&mut open, &String::from_utf8_lossy(&raw))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = open.last() {
            return Err(WeatherError::MalformedDocument(format!(
                "unclosed element <{}>",
                element.tag
            )));
        }

        match root {
            Some(root) => Ok(Self { root: Some(root) }),
            None => Err(WeatherError::MalformedDocument("no root element".to_string())),
        }
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Every element matching a plain tag path, in document order.
    ///
    /// The path is relative to the root element: `forecastGroup/forecast`
    /// selects `forecast` children of `forecastGroup` children of the root.
    /// A `*` segment matches any tag; empty and `.` segments are skipped, so
    /// an empty path selects the root itself.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let Some(root) = &self.root else {
            return Vec::new();
        };

        let mut current = vec![root];
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(move |c| c.matches(segment)))
                .collect();

            if current.is_empty() {
                break;
            }
        }
        current
    }

    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// Text of the first element matching `path`.
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).map(Element::text)
    }

    /// Full path of every leaf element, depth-first in document order.
    ///
    /// The root tag never appears in a path unless the root itself is the
    /// only leaf. With `with_predicates`, each segment carries its
    /// attributes as `[@name='value']` predicates; those paths are for
    /// display and are not accepted by [`Document::find`].
    pub fn leaf_paths(&self, with_predicates: bool) -> Vec<String> {
        let Some(root) = &self.root else {
            return Vec::new();
        };

        if root.is_leaf() {
            return vec![root.segment(with_predicates)];
        }

        let mut paths = Vec::new();
        let mut stack: Vec<(&Element, String)> =
            root.children.iter().rev().map(|child| (child, String::new())).collect();

        while let Some((element, prefix)) = stack.pop() {
            let segment = element.segment(with_predicates);
            let path = if prefix.is_empty() { segment } else { format!("{prefix}/{segment}") };

            if element.is_leaf() {
                paths.push(path);
            } else {
                stack.extend(element.children.iter().rev().map(|child| (child, path.clone())));
            }
        }

        paths
    }
}

fn close(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), WeatherError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
        return Ok(());
    }

    if root.is_some() {
        return Err(WeatherError::MalformedDocument(format!(
            "second root element <{}>",
            element.tag
        )));
    }

    *root = Some(element);
    Ok(())
}

fn push_text(open: &mut [Element], text: &str) -> Result<(), WeatherError> {
    match open.last_mut() {
        Some(element) => {
            element.push_text(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(WeatherError::MalformedDocument(
            "text content outside the root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<siteData>
  <location>
    <name code="s0000430" lat="45.40N" lon="75.70W">Ottawa (Kanata - Orléans)</name>
    <province code="ON">Ontario</province>
  </location>
  <currentConditions>
    <temperature unitType="metric" units="C">-3.4</temperature>
    <condition/>
  </currentConditions>
</siteData>"#;

    #[test]
    fn parse_keeps_structure_and_attribute_order() {
        let doc = Document::parse(SAMPLE).expect("sample must parse");
        let root = doc.root().expect("root must exist");

        assert_eq!(root.tag(), "siteData");
        assert_eq!(root.children().len(), 2);

        let name = doc.find("location/name").expect("name must exist");
        let keys: Vec<&str> = name.attributes().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["code", "lat", "lon"]);
        assert_eq!(name.text(), "Ottawa (Kanata - Orléans)");
    }

    #[test]
    fn find_text_of_empty_element_is_empty_string() {
        let doc = Document::parse(SAMPLE).unwrap();

        assert_eq!(doc.find_text("currentConditions/condition"), Some(""));
        assert_eq!(doc.find_text("currentConditions/humidex"), None);
    }

    #[test]
    fn find_supports_wildcard_and_dot_segments() {
        let doc = Document::parse(SAMPLE).unwrap();

        assert_eq!(doc.find_text("*/temperature"), Some("-3.4"));
        assert_eq!(doc.find_text("./currentConditions/temperature"), Some("-3.4"));
        assert_eq!(doc.find("").map(Element::tag), Some("siteData"));
    }

    #[test]
    fn find_all_returns_matches_in_document_order() {
        let doc = Document::parse(
            "<r><g><p n='1'/><p n='2'/></g><x/><g><p n='3'/></g></r>",
        )
        .unwrap();

        let found: Vec<&str> =
            doc.find_all("g/p").into_iter().filter_map(|e| e.attribute("n")).collect();
        assert_eq!(found, ["1", "2", "3"]);
        assert_eq!(doc.find("g/p").and_then(|e| e.attribute("n")), Some("1"));
    }

    #[test]
    fn text_after_first_child_is_ignored() {
        let doc = Document::parse("<r><a>head<b>inner</b>tail</a></r>").unwrap();

        assert_eq!(doc.find_text("a"), Some("head"));
        assert_eq!(doc.find_text("a/b"), Some("inner"));
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let doc = Document::parse(
            "<r><a k='x &amp; y'>1 &lt; 2</a><b><![CDATA[<raw>]]></b></r>",
        )
        .unwrap();

        assert_eq!(doc.find_text("a"), Some("1 < 2"));
        assert_eq!(doc.find("a").and_then(|e| e.attribute("k")), Some("x & y"));
        assert_eq!(doc.find_text("b"), Some("<raw>"));
    }

    #[test]
    fn leaf_paths_with_predicates() {
        let doc = Document::parse(SAMPLE).unwrap();

        assert_eq!(
            doc.leaf_paths(true),
            [
                "location/name[@code='s0000430'][@lat='45.40N'][@lon='75.70W']",
                "location/province[@code='ON']",
                "currentConditions/temperature[@unitType='metric'][@units='C']",
                "currentConditions/condition",
            ]
        );
    }

    #[test]
    fn plain_leaf_paths_resolve_with_find() {
        let doc = Document::parse(SAMPLE).unwrap();
        let paths = doc.leaf_paths(false);

        assert_eq!(paths[2], "currentConditions/temperature");
        for path in &paths {
            assert!(doc.find(path).is_some(), "{path} should resolve");
        }
    }

    #[test]
    fn leaf_paths_of_childless_root() {
        let doc = Document::parse("<siteData version='1'/>").unwrap();
        assert_eq!(doc.leaf_paths(true), ["siteData[@version='1']"]);
    }

    #[test]
    fn empty_document_finds_nothing() {
        let doc = Document::empty();

        assert!(doc.is_empty());
        assert!(doc.find("").is_none());
        assert!(doc.find_all("a/b").is_empty());
        assert!(doc.leaf_paths(true).is_empty());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        for xml in ["", "<a><b></a>", "<a>", "<a/><b/>", "<a/>junk"] {
            let err = Document::parse(xml).unwrap_err();
            assert!(
                matches!(err, WeatherError::MalformedDocument(_)),
                "{xml:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn deeply_nested_document() {
        const DEPTH: usize = 10_000;
        let xml = format!("{}{}", "<n>".repeat(DEPTH), "</n>".repeat(DEPTH));

        let doc = Document::parse(&xml).expect("deep document must parse");
        let paths = doc.leaf_paths(false);

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].split('/').count(), DEPTH - 1);
        assert!(doc.find(&paths[0]).is_some());
    }

    fn depth(doc: &Document) -> usize {
        let mut depth = 0;
        let mut current = doc.root();
        while let Some(element) = current {
            depth += 1;
            current = element.children().first();
        }
        depth
    }

    #[test]
    fn deep_document_clones_and_debug_prints() {
        const DEPTH: usize = 200_000;
        let xml = format!("{}<leaf k='v'>x</leaf>{}", "<n>".repeat(DEPTH), "</n>".repeat(DEPTH));

        let doc = Document::parse(&xml).expect("deep document must parse");
        let copy = doc.clone();
        drop(doc);

        assert_eq!(depth(&copy), DEPTH + 1);
        let mut leaf = copy.root();
        while let Some(element) = leaf.filter(|e| !e.is_leaf()) {
            leaf = element.children().first();
        }
        let leaf = leaf.expect("leaf must exist");
        assert_eq!(leaf.tag(), "leaf");
        assert_eq!(leaf.attribute("k"), Some("v"));
        assert_eq!(leaf.text(), "x");

        let printed = format!("{copy:?}");
        assert!(printed.contains("tag: \"n\""));
        assert!(printed.contains("children: 1"));
    }

    #[test]
    fn clone_keeps_sibling_order() {
        let doc = Document::parse("<r><a><b>1</b><c>2</c></a><d>3</d></r>").unwrap();
        let copy = doc.clone();

        assert_eq!(copy.leaf_paths(false), doc.leaf_paths(false));
        assert_eq!(copy.find_text("a/c"), Some("2"));
        assert_eq!(copy.find_text("d"), Some("3"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_from_text() {
        let doc = Document::parse("<r><a>\n   padded value \t\n</a><b>   </b></r>").unwrap();

        assert_eq!(doc.find_text("a"), Some("padded value"));
        assert_eq!(doc.find_text("b"), Some(""));
    }
}

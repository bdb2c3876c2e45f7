//! CSS selector subset used by [`MemoryDom`](super::MemoryDom)
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr="v"]`,
//! `[attr^="v"]`, `[attr$="v"]`, `[attr*="v"]`, the descendant combinator and
//! comma-separated lists. That covers every selector the page behaviours and
//! the smoke-test checklist use.

use crate::error::{SiteError, SiteResult};

/// Read access to an element tree, enough to evaluate a selector
pub trait SelectorTree {
    type Id: Copy;

    fn tag(&self, id: Self::Id) -> &str;
    fn attribute(&self, id: Self::Id, name: &str) -> Option<&str>;
    fn has_class(&self, id: Self::Id, class: &str) -> bool;
    fn parent(&self, id: Self::Id) -> Option<Self::Id>;
}

/// A parsed selector list (`a, b c, d.e`)
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    alternatives: Vec<Complex>,
}

/// Compounds joined by descendant combinators, left to right
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatcher>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeMatcher {
    name: String,
    test: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOp {
    Equals,
    Prefix,
    Suffix,
    Contains,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> SiteResult<Self> {
        let mut parser = Parser {
            source: input,
            chars: input.chars().collect(),
            pos: 0,
        };
        let alternatives = parser.list()?;
        Ok(Self { alternatives })
    }

    /// Whether the element matches any selector in the list
    pub fn matches<T: SelectorTree>(&self, tree: &T, id: T::Id) -> bool {
        self.alternatives.iter().any(|c| c.matches(tree, id))
    }
}

impl Complex {
    fn matches<T: SelectorTree>(&self, tree: &T, id: T::Id) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(tree, id) {
            return false;
        }

        // Descendant-only chains can be matched greedily from the nearest ancestor.
        let mut cursor = tree.parent(id);
        for compound in ancestors.iter().rev() {
            loop {
                match cursor {
                    None => return false,
                    Some(ancestor) => {
                        cursor = tree.parent(ancestor);
                        if compound.matches(tree, ancestor) {
                            break;
                        }
                    }
                }
            }
        }
        true
    }
}

impl Compound {
    fn matches<T: SelectorTree>(&self, tree: &T, id: T::Id) -> bool {
        if let Some(tag) = &self.tag {
            if !tree.tag(id).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(wanted) = &self.id {
            if tree.attribute(id, "id") != Some(wanted.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| tree.has_class(id, c)) {
            return false;
        }
        self.attributes.iter().all(|m| m.matches(tree.attribute(id, &m.name)))
    }
}

impl AttributeMatcher {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match &self.test {
            None => true,
            Some((AttributeOp::Equals, v)) => actual == v.as_str(),
            Some((AttributeOp::Prefix, v)) => !v.is_empty() && actual.starts_with(v.as_str()),
            Some((AttributeOp::Suffix, v)) => !v.is_empty() && actual.ends_with(v.as_str()),
            Some((AttributeOp::Contains, v)) => !v.is_empty() && actual.contains(v.as_str()),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn list(&mut self) -> SiteResult<Vec<Complex>> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }
        Ok(list)
    }

    fn complex(&mut self) -> SiteResult<Complex> {
        let mut compounds = vec![self.compound()?];
        loop {
            let separated = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some(_) if separated => compounds.push(self.compound()?),
                Some(c) => return Err(self.error(format!("unsupported combinator '{c}'"))),
            }
        }
        Ok(Complex { compounds })
    }

    fn compound(&mut self) -> SiteResult<Compound> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if is_ident_char(c) => compound.tag = Some(self.ident()?.to_ascii_lowercase()),
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector".to_string()));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> SiteResult<AttributeMatcher> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttributeMatcher { name, test: None });
            }
            Some('=') => {
                self.pos += 1;
                AttributeOp::Equals
            }
            Some(c @ ('^' | '$' | '*')) => {
                self.pos += 1;
                self.expect('=')?;
                match c {
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    _ => AttributeOp::Contains,
                }
            }
            _ => return Err(self.error("malformed attribute selector".to_string())),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.peek() {
                        None => return Err(self.error("unterminated string".to_string())),
                        Some(c) if c == q => {
                            self.pos += 1;
                            break;
                        }
                        Some(c) => {
                            value.push(c);
                            self.pos += 1;
                        }
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        self.expect(']')?;

        Ok(AttributeMatcher {
            name,
            test: Some((op, value)),
        })
    }

    fn ident(&mut self) -> SiteResult<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier".to_string()));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn expect(&mut self, wanted: char) -> SiteResult<()> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error(format!("expected '{wanted}'"))),
        }
    }

    /// Returns true if any whitespace was consumed
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self, reason: String) -> SiteError {
        SiteError::InvalidSelector {
            selector: self.source.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    /// Flat test tree: (tag, id, classes, attributes, parent)
    struct Flat(Vec<(&'static str, Vec<&'static str>, Vec<(&'static str, &'static str)>, Option<usize>)>);

    impl SelectorTree for Flat {
        type Id = usize;

        fn tag(&self, id: usize) -> &str {
            self.0[id].0
        }

        fn attribute(&self, id: usize, name: &str) -> Option<&str> {
            self.0[id].2.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        }

        fn has_class(&self, id: usize, class: &str) -> bool {
            self.0[id].1.iter().any(|c| *c == class)
        }

        fn parent(&self, id: usize) -> Option<usize> {
            self.0[id].3
        }
    }

    fn tree() -> Flat {
        Flat(vec![
            ("footer", vec!["footer"], vec![], None),
            ("div", vec!["footer-links"], vec![], Some(0)),
            ("a", vec![], vec![("href", "#about")], Some(1)),
            ("button", vec!["filter-btn", "active"], vec![("data-filter", "web")], None),
            ("section", vec![], vec![("id", "contact")], None),
        ])
    }

    #[test_case(".footer-links a", 2, true ; "descendant")]
    #[test_case(".footer a", 2, true ; "distant descendant")]
    #[test_case(".hero a", 2, false ; "missing ancestor")]
    #[test_case("a[href^=\"#\"]", 2, true ; "prefix attribute")]
    #[test_case("a[href=\"#contact\"]", 2, false ; "exact attribute mismatch")]
    #[test_case(".filter-btn.active[data-filter=\"web\"]", 3, true ; "compound")]
    #[test_case(".filter-btn[data-filter='mobile']", 3, false ; "single quoted")]
    #[test_case("section[id]", 4, true ; "presence")]
    #[test_case("#contact", 4, true ; "id")]
    #[test_case(".about-card, #contact", 4, true ; "list")]
    #[test_case("*", 1, true ; "universal")]
    fn test_matches(selector: &str, node: usize, expected: bool) {
        let list = SelectorList::parse(selector).unwrap();
        assert_eq!(list.matches(&tree(), node), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case(".nav > a" ; "child combinator")]
    #[test_case("a[href" ; "unterminated attribute")]
    #[test_case("a[href=\"#x]" ; "unterminated string")]
    #[test_case(".a,," ; "empty alternative")]
    fn test_rejects(selector: &str) {
        assert!(matches!(
            SelectorList::parse(selector),
            Err(SiteError::InvalidSelector { .. })
        ));
    }
}

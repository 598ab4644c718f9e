//! Fence info string parsing.
//!
//! A fenced code block's info string carries an optional language followed by
//! an optional brace-enclosed attribute list:
//!
//! ```text
//! go {.good .wide #example1 title="Hello world"}
//! ```
//!
//! Tokens are whitespace separated and take one of three forms:
//! - `.name` adds a class (order kept, duplicates kept)
//! - `#name` sets the element id (last one wins)
//! - `key="value"` sets an attribute if `key` is on the allow-list, otherwise
//!   it is dropped

/// Language used for the `language-*` class when a fence has none.
pub const DEFAULT_LANGUAGE: &str = "unknown";

/// HTML global attributes accepted from fence attribute lists.
const ALLOWED_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "enterkeyhint",
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "part",
    "role",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
];

/// Whether an attribute name may be copied onto a rendered element.
///
/// Accepts the HTML global attributes plus `data-*` attributes.
#[must_use]
pub fn is_allowed_attribute(name: &str) -> bool {
    if let Some(suffix) = name.strip_prefix("data-") {
        return !suffix.is_empty()
            && suffix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    }
    ALLOWED_ATTRIBUTES.contains(&name)
}

/// Parsed fence attribute list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeList {
    /// Classes in order of appearance.
    pub classes: Vec<String>,
    /// Element id.
    pub id: Option<String>,
    /// Other allowed attributes in order of first appearance.
    pub attributes: Vec<(String, String)>,
}

impl AttributeList {
    /// Parse the contents of a brace group (without the braces).
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut list = Self::default();
        let mut cursor = Cursor::new(input);

        while let Some(c) = cursor.skip_whitespace() {
            match c {
                '.' => {
                    cursor.bump();
                    let name = cursor.take_word();
                    if !name.is_empty() {
                        list.classes.push(name.to_owned());
                    }
                }
                '#' => {
                    cursor.bump();
                    let name = cursor.take_word();
                    if !name.is_empty() {
                        list.id = Some(name.to_owned());
                    }
                }
                _ => {
                    let key = cursor.take_key();
                    if cursor.peek() == Some('=') {
                        cursor.bump();
                        let value = cursor.take_value();
                        list.set(key, value);
                    } else if key.is_empty() {
                        // Stray character such as a lone quote
                        cursor.bump();
                    }
                }
            }
        }

        list
    }

    /// Whether the list carries nothing to render.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.id.is_none() && self.attributes.is_empty()
    }

    fn set(&mut self, key: &str, value: String) {
        if key.is_empty() {
            return;
        }
        if !is_allowed_attribute(key) {
            tracing::debug!(key, "Dropping disallowed fence attribute");
            return;
        }
        match key {
            "class" => self
                .classes
                .extend(value.split_whitespace().map(str::to_owned)),
            "id" => {
                if !value.is_empty() {
                    self.id = Some(value);
                }
            }
            _ => {
                if let Some(existing) = self.attributes.iter_mut().find(|(k, _)| k == key) {
                    existing.1 = value;
                } else {
                    self.attributes.push((key.to_owned(), value));
                }
            }
        }
    }
}

/// Parsed fence info string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FenceInfo {
    /// Language tag, if the fence named one.
    pub language: Option<String>,
    /// Attribute list, if the fence had a brace group.
    pub attributes: Option<AttributeList>,
}

impl FenceInfo {
    /// Parse a fence info string such as `go {.good #example1}`.
    ///
    /// A brace group only counts when it closes at the end of the info string;
    /// otherwise the fence has no attribute list.
    #[must_use]
    pub fn parse(info: &str) -> Self {
        let info = info.trim();
        let (head, attributes) = match info.find('{') {
            Some(open) if info.ends_with('}') => (
                &info[..open],
                Some(AttributeList::parse(&info[open + 1..info.len() - 1])),
            ),
            _ => (info, None),
        };

        Self {
            language: head.split_whitespace().next().map(str::to_owned),
            attributes,
        }
    }

    /// Language tag, falling back to [`DEFAULT_LANGUAGE`].
    #[must_use]
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Minimal character cursor over an attribute list.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace and return the next character.
    fn skip_whitespace(&mut self) -> Option<char> {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                return Some(c);
            }
            self.bump();
        }
        None
    }

    fn take_while(&mut self, mut keep: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn take_word(&mut self) -> &'a str {
        self.take_while(|c| !c.is_whitespace())
    }

    fn take_key(&mut self) -> &'a str {
        self.take_while(|c| !c.is_whitespace() && c != '=' && c != '"' && c != '\'')
    }

    fn take_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_while(|c| c != quote);
                self.bump();
                value.to_owned()
            }
            _ => self.take_word().to_owned(),
        }
    }
}

//! Parse and output configuration.

use std::borrow::Cow;
use std::collections::BTreeSet;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];
const PRESERVE_WHITESPACE_ELEMENTS: &[&str] = &["pre"];

fn fold(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

fn name_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Element classification tables used by the tokenizer, builder and serializer.
///
/// Names are matched ASCII case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementRules {
    /// Elements that never have content and are never pushed on the open stack.
    void: BTreeSet<String>,
    /// Elements whose content is consumed verbatim up to the matching close tag.
    raw_text: BTreeSet<String>,
    /// Elements whose text children keep `\n`, `\r` and `\t` when materialized.
    preserve_whitespace: BTreeSet<String>,
}

impl Default for ElementRules {
    fn default() -> Self {
        Self {
            void: name_set(VOID_ELEMENTS),
            raw_text: name_set(RAW_TEXT_ELEMENTS),
            preserve_whitespace: name_set(PRESERVE_WHITESPACE_ELEMENTS),
        }
    }
}

impl ElementRules {
    /// Rules with every table empty.
    pub fn empty() -> Self {
        Self {
            void: BTreeSet::new(),
            raw_text: BTreeSet::new(),
            preserve_whitespace: BTreeSet::new(),
        }
    }

    pub fn with_void(mut self, name: &str) -> Self {
        self.void.insert(fold(name).into_owned());
        self
    }

    pub fn with_raw_text(mut self, name: &str) -> Self {
        self.raw_text.insert(fold(name).into_owned());
        self
    }

    pub fn with_preserve_whitespace(mut self, name: &str) -> Self {
        self.preserve_whitespace.insert(fold(name).into_owned());
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        let name = fold(name);
        self.void.remove(name.as_ref());
        self.raw_text.remove(name.as_ref());
        self.preserve_whitespace.remove(name.as_ref());
        self
    }

    pub fn is_void(&self, name: &str) -> bool {
        self.void.contains(fold(name).as_ref())
    }

    pub fn is_raw_text(&self, name: &str) -> bool {
        self.raw_text.contains(fold(name).as_ref())
    }

    /// True when text under `name` keeps its control whitespace.
    pub fn preserves_whitespace(&self, name: &str) -> bool {
        let name = fold(name);
        self.preserve_whitespace.contains(name.as_ref()) || self.raw_text.contains(name.as_ref())
    }
}

/// How the tree builder treats elements still open below the element an end
/// tag closes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClosePolicy {
    /// Drop them from the open registry without giving them an end node.
    #[default]
    ForceClose,
    /// Give each of them a synthetic end node first, innermost first.
    Cascade,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum element depth below the document. Deeper input aborts the parse,
    /// and the same bound guards every recursive walk over the tree.
    pub max_depth: usize,
    /// Close elements still open at end of input against a synthetic end node.
    pub auto_close_on_end: bool,
    /// Maintain the id index.
    pub track_ids: bool,
    pub close_policy: ClosePolicy,
    pub elements: ElementRules,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 4096,
            auto_close_on_end: true,
            track_ids: true,
            close_policy: ClosePolicy::default(),
            elements: ElementRules::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_auto_close_on_end(mut self, auto_close: bool) -> Self {
        self.auto_close_on_end = auto_close;
        self
    }

    pub fn with_track_ids(mut self, track_ids: bool) -> Self {
        self.track_ids = track_ids;
        self
    }

    pub fn with_close_policy(mut self, policy: ClosePolicy) -> Self {
        self.close_policy = policy;
        self
    }

    pub fn with_elements(mut self, elements: ElementRules) -> Self {
        self.elements = elements;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Html,
    Xml,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub mode: OutputMode,
    /// Wrap document output in an `<html><head>…</head><body>…</body></html>` shell.
    pub wrap_document: bool,
    /// Upper-case element and attribute names.
    pub upper_case: bool,
    /// Use the names as they were written in the source.
    pub original_case: bool,
    /// Leave attribute values unquoted when they contain no whitespace.
    pub optimize_attribute_values: bool,
    /// Write childless void and self-closing elements as `<name />`.
    pub write_empty_nodes: bool,
    /// Add `_closed`, `_children` and `_child_N` attributes to every element.
    pub debugging_attributes: bool,
}

impl OutputOptions {
    pub fn xml() -> Self {
        Self {
            mode: OutputMode::Xml,
            ..Self::default()
        }
    }

    pub fn is_xml(&self) -> bool {
        self.mode == OutputMode::Xml
    }

    /// Whether unchanged parsed nodes may be written as their source slice.
    pub fn preserves_source(&self) -> bool {
        self.mode == OutputMode::Html
            && !self.upper_case
            && !self.original_case
            && !self.optimize_attribute_values
            && !self.write_empty_nodes
            && !self.debugging_attributes
    }
}

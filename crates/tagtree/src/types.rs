use crate::source::Span;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handle to a node in a [`Document`](crate::Document) arena.
///
/// Handles stay valid for the lifetime of the document; removing a node only
/// detaches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "node arena overflow");
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
}

/// Which quote character an attribute value was written with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    /// `name="value"`, also used for unquoted source values.
    #[default]
    Double,
    /// `name='value'`
    Single,
    /// Written without a value, e.g. `disabled`.
    Bare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Interned, ASCII-lower-cased tag and attribute names.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_ascii_lowercase(&mut self, name: &str) -> AtomId {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            let folded = name.to_ascii_lowercase();
            return self.intern_folded(&folded);
        }
        self.intern_folded(name)
    }

    fn intern_folded(&mut self, folded: &str) -> AtomId {
        if let Some(id) = self.map.get(folded) {
            return *id;
        }
        let id = AtomId(self.atoms.len() as u32);
        let atom: Arc<str> = Arc::from(folded);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    pub fn resolve(&self, id: AtomId) -> &str {
        &self.atoms[id.0 as usize]
    }

    /// Shared handle to an interned name, reused by element nodes.
    pub fn resolve_arc(&self, id: AtomId) -> Arc<str> {
        Arc::clone(&self.atoms[id.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// An attribute as it appeared inside a start or end tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: AtomId,
    /// Source casing of the name.
    pub name_span: Span,
    /// Raw, undecoded value. `None` for bare attributes and `<%…%>` directives.
    pub value: Option<Span>,
    pub quote: QuoteStyle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Text(Span),
    StartTag {
        name: AtomId,
        name_span: Span,
        attributes: Vec<RawAttribute>,
        span: Span,
        /// Written as `<x/>` or a void element.
        self_closing: bool,
    },
    EndTag {
        name: AtomId,
        name_span: Span,
        attributes: Vec<RawAttribute>,
        span: Span,
    },
    /// `<!--payload-->`
    Comment { payload: Span, span: Span },
    /// `<!DOCTYPE …>`, kept whole.
    Doctype { span: Span },
    /// `<![CDATA[…]]>`, `<?…>` and other `<!…>` markup, kept whole.
    Declaration { span: Span },
}

impl Token {
    pub fn span(&self) -> Span {
        match self {
            Token::Text(span) => *span,
            Token::StartTag { span, .. }
            | Token::EndTag { span, .. }
            | Token::Comment { span, .. }
            | Token::Doctype { span }
            | Token::Declaration { span } => *span,
        }
    }
}

#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    atoms: AtomTable,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, atoms: AtomTable) -> Self {
        Self { tokens, atoms }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

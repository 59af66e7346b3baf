//! Forgiving HTML parsing into an editable tree that writes unedited markup
//! back byte for byte.
//!
//! ```
//! use tagtree::Document;
//!
//! let mut doc = Document::parse("<ul><li>one<li>two</ul>").unwrap();
//! let ul = doc.element(doc.root(), "ul").unwrap();
//! doc.set_attribute(ul, "class", "list").unwrap();
//! assert_eq!(doc.to_html().unwrap(), r#"<ul class="list"><li>one<li>two</ul>"#);
//! ```

pub mod debug;

mod attributes;
mod collect;
mod config;
mod document;
mod dom_builder;
mod entities;
mod error;
mod id_index;
mod mutation;
mod node;
mod serialize;
mod source;
mod tokenizer;
mod traverse;
mod types;

pub use crate::attributes::{Attribute, Attributes, FromAttributeValue};
pub use crate::config::{ClosePolicy, ElementRules, OutputMode, OutputOptions, ParseOptions};
pub use crate::debug::outline;
pub use crate::document::Document;
pub use crate::entities::deentitize;
pub use crate::error::{Error, Result};
pub use crate::node::{Closing, ElementData, EndTag, Node};
pub use crate::source::{Source, Span};
pub use crate::tokenizer::tokenize;
pub use crate::traverse::{Ancestors, Descendants};
pub use crate::types::{AtomId, AtomTable, NodeId, NodeType, QuoteStyle, RawAttribute, Token, TokenStream};

use crate::types::QuoteStyle;

const DATA_PREFIX: &str = "data-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    original_name: String,
    value: Option<String>,
    quote: QuoteStyle,
}

impl Attribute {
    pub fn new(name: &str, value: Option<String>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            original_name: name.to_string(),
            value,
            quote: QuoteStyle::default(),
        }
    }

    /// An attribute read from the source; `name` is already folded.
    pub(crate) fn parsed(name: &str, original: &str, value: String, quote: QuoteStyle) -> Self {
        Self {
            name: name.to_string(),
            original_name: original.to_string(),
            value: Some(value),
            quote,
        }
    }

    /// ASCII-lower-cased name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as written in the source or passed to the API.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// `None` suppresses the attribute on output.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn quote(&self) -> QuoteStyle {
        self.quote
    }

    /// A `<%…%>` template directive kept in attribute position.
    pub fn is_directive(&self) -> bool {
        self.original_name.starts_with("<%") && self.original_name.ends_with("%>")
    }
}

/// Conversion used by [`Attributes::value_or`].
pub trait FromAttributeValue: Sized {
    fn from_attribute_value(value: &str) -> Option<Self>;
}

impl FromAttributeValue for String {
    fn from_attribute_value(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromAttributeValue for bool {
    fn from_attribute_value(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

macro_rules! integer_attribute_value {
    ($($t:ty),*) => {
        $(impl FromAttributeValue for $t {
            fn from_attribute_value(value: &str) -> Option<Self> {
                value.trim().parse().ok()
            }
        })*
    };
}

integer_attribute_value!(i32, i64, u32, u64, usize);

/// Ordered attribute list; names are unique ASCII case-insensitively.
///
/// Mutation goes through the owning [`Document`](crate::Document) so the id
/// index and dirty flags stay consistent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.position(name).map(|i| &self.items[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Attribute::value)
    }

    /// Value of `name` converted to `T`, or `default` when the attribute is
    /// missing, has no value, or does not convert.
    pub fn value_or<T: FromAttributeValue>(&self, name: &str, default: T) -> T {
        self.value(name)
            .and_then(T::from_attribute_value)
            .unwrap_or(default)
    }

    /// The attributes named in `names` that are present, in `names` order.
    pub fn with_names<'a>(&'a self, names: &'a [&str]) -> impl Iterator<Item = &'a Attribute> {
        names.iter().filter_map(|name| self.get(name))
    }

    /// `data-{key}`
    pub fn data_attribute(&self, key: &str) -> Option<&Attribute> {
        self.items.iter().find(|a| {
            a.name.len() == DATA_PREFIX.len() + key.len()
                && a.name.starts_with(DATA_PREFIX)
                && a.name[DATA_PREFIX.len()..].eq_ignore_ascii_case(key)
        })
    }

    pub fn data_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.items
            .iter()
            .filter(|a| a.name.starts_with(DATA_PREFIX))
    }

    /// Appends a parsed attribute; duplicates are dropped.
    pub(crate) fn push(&mut self, attribute: Attribute) {
        if !self.contains(&attribute.name) {
            self.items.push(attribute);
        }
    }

    /// Sets `name` in place or appends it. Returns false when nothing changed.
    pub(crate) fn set(&mut self, name: &str, value: Option<String>) -> bool {
        match self.position(name) {
            Some(i) => {
                if self.items[i].value == value {
                    return false;
                }
                self.items[i].value = value;
                true
            }
            None => {
                self.items.push(Attribute::new(name, value));
                true
            }
        }
    }

    pub(crate) fn set_quote(&mut self, name: &str, quote: QuoteStyle) -> bool {
        match self.position(name) {
            Some(i) if self.items[i].quote != quote => {
                self.items[i].quote = quote;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.position(name).map(|i| self.items.remove(i))
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

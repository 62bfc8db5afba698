//! Component Descriptors
//!
//! The static, declarative side of the tree. Descriptors arrive already
//! parsed (or deserialized from JSON) and are never mutated once shared.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Style map (`position`, `width`, `color`, ...)
pub type Style = BTreeMap<String, Value>;

/// Component type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    View,
    List,
    ChatList,
    ListItem,
    ChatItem,
    Page,
    Label,
    Timer,
    ScrollView,
    Image,
    LineBreak,
    /// Any type this crate has no special handling for
    Other(String),
}

impl ComponentKind {
    /// Type string as it appears in descriptors
    pub fn as_str(&self) -> &str {
        match self {
            ComponentKind::View => "view",
            ComponentKind::List => "list",
            ComponentKind::ChatList => "chatList",
            ComponentKind::ListItem => "listItem",
            ComponentKind::ChatItem => "chatItem",
            ComponentKind::Page => "page",
            ComponentKind::Label => "label",
            ComponentKind::Timer => "timer",
            ComponentKind::ScrollView => "scrollView",
            ComponentKind::Image => "image",
            ComponentKind::LineBreak => "br",
            ComponentKind::Other(name) => name,
        }
    }

    /// `list` or `chatList`
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, ComponentKind::List | ComponentKind::ChatList)
    }
}

impl From<&str> for ComponentKind {
    fn from(name: &str) -> Self {
        match name {
            "view" => ComponentKind::View,
            "list" => ComponentKind::List,
            "chatList" => ComponentKind::ChatList,
            "listItem" => ComponentKind::ListItem,
            "chatItem" => ComponentKind::ChatItem,
            "page" => ComponentKind::Page,
            "label" => ComponentKind::Label,
            "timer" => ComponentKind::Timer,
            "scrollView" => ComponentKind::ScrollView,
            "image" => ComponentKind::Image,
            "br" => ComponentKind::LineBreak,
            other => ComponentKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ComponentKind {
    fn from(name: String) -> Self {
        ComponentKind::from(name.as_str())
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a list gets its records from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListSource {
    /// Records written inline in the descriptor
    Inline(Vec<Value>),
    /// Key of a record array held by the data store
    Key(String),
}

/// Declarative description of one UI node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: Style,
    /// Shared so blueprints and page components are stamped without deep copies
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Rc<Descriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_object: Option<ListSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterator_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Left untyped: a non-array board is reported, not rejected at parse time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_board: Option<Value>,
}

impl Descriptor {
    /// Bare descriptor of the given type
    pub fn new(kind: impl Into<ComponentKind>) -> Self {
        Self {
            kind: kind.into(),
            style: Style::new(),
            children: Vec::new(),
            list_object: None,
            iterator_var: None,
            data_key: None,
            content_type: None,
            path: None,
            text: None,
            text_board: None,
        }
    }

    /// Parse a descriptor from a JSON value
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn with_child(mut self, child: Descriptor) -> Self {
        self.children.push(Rc::new(child));
        self
    }

    pub fn with_style(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.style.insert(key.to_string(), value.into());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_data_key(mut self, key: &str) -> Self {
        self.data_key = Some(key.to_string());
        self
    }

    pub fn with_text_board(mut self, board: Value) -> Self {
        self.text_board = Some(board);
        self
    }

    /// Bind a list to records, iterated under `iterator_var`
    pub fn with_list(mut self, source: ListSource, iterator_var: &str) -> Self {
        self.list_object = Some(source);
        self.iterator_var = Some(iterator_var.to_string());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Rc<Descriptor>>),
    One(Rc<Descriptor>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Rc<Descriptor>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(children)) => children,
        Some(OneOrMany::One(child)) => vec![child],
        None => Vec::new(),
    })
}

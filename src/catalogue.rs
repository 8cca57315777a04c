//! Node Catalogue
//!
//! The closed set of node types the editor offers, and the typed union each raw
//! attribute bag is converted into. Builders match exhaustively on [`NodeKind`]
//! and never read raw attributes.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::graph::Attributes;

// ═══════════════════════════════════════════════════════════════════════════════
// CATALOGUE TABLES
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// HTML node types mapped to the tag they render when no `tag` attribute is set.
    static ref ELEMENT_TAGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // Containers
        m.insert("html_div", "div");
        m.insert("html_span", "span");
        m.insert("html_header", "header");
        m.insert("html_footer", "footer");
        m.insert("html_main", "main");
        m.insert("html_nav", "nav");
        m.insert("html_section", "section");
        m.insert("html_article", "article");
        m.insert("html_aside", "aside");
        // Text content
        m.insert("html_h1", "h1");
        m.insert("html_h2", "h2");
        m.insert("html_h3", "h3");
        m.insert("html_h4", "h4");
        m.insert("html_h5", "h5");
        m.insert("html_h6", "h6");
        m.insert("html_p", "p");
        m.insert("html_a", "a");
        m.insert("html_blockquote", "blockquote");
        m.insert("html_pre", "pre");
        m.insert("html_code", "code");
        // Lists
        m.insert("html_ul", "ul");
        m.insert("html_ol", "ol");
        m.insert("html_li", "li");
        // Forms
        m.insert("html_form", "form");
        m.insert("html_input_text", "input");
        m.insert("html_label", "label");
        m.insert("html_textarea", "textarea");
        m.insert("html_button", "button");
        m.insert("html_input_submit", "input");
        // Media
        m.insert("html_img", "img");
        m.insert("html_video", "video");
        m.insert("html_audio", "audio");
        m
    };

    /// Input types implied by the node type when the `type` attribute is missing.
    static ref INPUT_TYPES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("html_input_text", "text");
        m.insert("html_input_submit", "submit");
        m
    };

    /// CSS declaration node types.
    static ref STYLE_NODE_TYPES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        // Layout
        s.insert("css_display");
        s.insert("css_position");
        s.insert("css_top");
        s.insert("css_left");
        s.insert("css_z_index");
        // Box model
        s.insert("css_width");
        s.insert("css_height");
        s.insert("css_padding");
        s.insert("css_margin");
        // Flexbox
        s.insert("css_flex_direction");
        s.insert("css_justify_content");
        s.insert("css_align_items");
        s.insert("css_gap");
        // Typography
        s.insert("css_color");
        s.insert("css_font_family");
        s.insert("css_font_size");
        s.insert("css_font_weight");
        s.insert("css_text_align");
        // Background & border
        s.insert("css_background_color");
        s.insert("css_background_image");
        s.insert("css_border");
        s.insert("css_border_radius");
        // Effects
        s.insert("css_box_shadow");
        s.insert("css_opacity");
        s.insert("css_transform");
        s.insert("css_transition");
        s.insert("css_cursor");
        s
    };

    static ref EVENT_TAG_RE: Regex = Regex::new(r"^js_event_on_([a-z]+)$").unwrap();

    /// Tag names accepted from the `tag` attribute.
    static ref TAG_NAME_RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Html,
    Css,
    Javascript,
}

impl Category {
    /// Category implied by the type-tag namespace, whether or not the tag is known.
    pub fn of_type_tag(type_tag: &str) -> Option<Self> {
        if type_tag.starts_with("html_") {
            Some(Category::Html)
        } else if type_tag.starts_with("css_") {
            Some(Category::Css)
        } else if type_tag.starts_with("js_event_") || type_tag.starts_with("js_action_") {
            Some(Category::Javascript)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementProps),
    Style(StyleDeclaration),
    Event(EventKind),
    Action(Action),
    Unknown,
}

impl NodeKind {
    pub fn classify(type_tag: &str, attrs: &Attributes) -> Self {
        if let Some(default_tag) = ELEMENT_TAGS.get(type_tag) {
            return NodeKind::Element(ElementProps::from_attributes(type_tag, default_tag, attrs));
        }
        if STYLE_NODE_TYPES.contains(type_tag) {
            return NodeKind::Style(StyleDeclaration {
                property: text_attr(attrs, &["property"]),
                value: text_attr(attrs, &["value"]),
            });
        }
        if let Some(caps) = EVENT_TAG_RE.captures(type_tag) {
            if let Some(kind) = EventKind::from_dom_name(&caps[1]) {
                return NodeKind::Event(kind);
            }
        }
        match Action::from_attributes(type_tag, attrs) {
            Some(action) => NodeKind::Action(action),
            None => NodeKind::Unknown,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            NodeKind::Element(_) => Some(Category::Html),
            NodeKind::Style(_) => Some(Category::Css),
            NodeKind::Event(_) | NodeKind::Action(_) => Some(Category::Javascript),
            NodeKind::Unknown => None,
        }
    }
}

/// Fields of an HTML element node, already resolved against the catalogue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementProps {
    pub tag: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub src: Option<String>,
    pub alt: Option<String>,
    pub href: Option<String>,
    pub for_id: Option<String>,
    pub placeholder: Option<String>,
    pub input_type: Option<String>,
    pub value: Option<String>,
    pub controls: bool,
    pub text: Option<String>,
}

impl ElementProps {
    fn from_attributes(type_tag: &str, default_tag: &str, attrs: &Attributes) -> Self {
        let tag = text_attr(attrs, &["tag"])
            .filter(|t| TAG_NAME_RE.is_match(t))
            .unwrap_or_else(|| default_tag.to_string());

        ElementProps {
            tag,
            id: text_attr(attrs, &["id"]),
            class_name: text_attr(attrs, &["className", "class"]),
            src: text_attr(attrs, &["src"]),
            alt: text_attr(attrs, &["alt"]),
            href: text_attr(attrs, &["href"]),
            for_id: text_attr(attrs, &["forId", "for"]),
            placeholder: text_attr(attrs, &["placeholder"]),
            input_type: text_attr(attrs, &["type"])
                .or_else(|| INPUT_TYPES.get(type_tag).map(|t| t.to_string())),
            value: text_attr(attrs, &["value"]),
            controls: attrs.get("controls").map_or(false, |v| v.is_truthy()),
            text: text_attr(attrs, &["childrenText", "text"]),
        }
    }

    /// Attributes in output order, present values only.
    pub fn ordered_attributes(&self) -> Vec<(&'static str, &str)> {
        [
            ("id", &self.id),
            ("class", &self.class_name),
            ("src", &self.src),
            ("alt", &self.alt),
            ("href", &self.href),
            ("for", &self.for_id),
            ("placeholder", &self.placeholder),
            ("type", &self.input_type),
            ("value", &self.value),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDeclaration {
    pub property: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseOver,
    MouseOut,
    Change,
    Submit,
    Load,
    KeyDown,
}

impl EventKind {
    pub fn from_dom_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(EventKind::Click),
            "mouseover" => Some(EventKind::MouseOver),
            "mouseout" => Some(EventKind::MouseOut),
            "change" => Some(EventKind::Change),
            "submit" => Some(EventKind::Submit),
            "load" => Some(EventKind::Load),
            "keydown" => Some(EventKind::KeyDown),
            _ => None,
        }
    }

    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::MouseOver => "mouseover",
            EventKind::MouseOut => "mouseout",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
            EventKind::Load => "load",
            EventKind::KeyDown => "keydown",
        }
    }

    /// Load events run at document-ready time and need no element.
    pub fn is_global(self) -> bool {
        self == EventKind::Load
    }
}

/// Action nodes, one variant per action type.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Alert { message: String },
    ConsoleLog { message: String },
    ToggleClass { selector: String, class_name: String },
    AddClass { selector: String, class_name: String },
    RemoveClass { selector: String, class_name: String },
    SetText { selector: String, text: String },
    SetAttribute { selector: String, attribute: String, value: String },
    SetCssProperty { selector: String, property: String, value: String },
    FetchApi { url: String },
    Redirect { url: String },
    /// `js_action_set_timeout`: its successor runs inside a delayed block.
    Delay { millis: u64 },
}

impl Action {
    fn from_attributes(type_tag: &str, attrs: &Attributes) -> Option<Self> {
        let field = |key: &str| text_attr(attrs, &[key]).unwrap_or_default();

        let action = match type_tag {
            "js_action_alert" => Action::Alert { message: field("message") },
            "js_action_console_log" => Action::ConsoleLog { message: field("message") },
            "js_action_toggle_class" => Action::ToggleClass {
                selector: field("selector"),
                class_name: field("className"),
            },
            "js_action_add_class" => Action::AddClass {
                selector: field("selector"),
                class_name: field("className"),
            },
            "js_action_remove_class" => Action::RemoveClass {
                selector: field("selector"),
                class_name: field("className"),
            },
            "js_action_set_text" => Action::SetText {
                selector: field("selector"),
                text: field("text"),
            },
            "js_action_set_attribute" => Action::SetAttribute {
                selector: field("selector"),
                attribute: field("attribute"),
                value: field("value"),
            },
            "js_action_set_css_property" => Action::SetCssProperty {
                selector: field("selector"),
                property: field("property"),
                value: field("value"),
            },
            "js_action_fetch_api" => Action::FetchApi { url: field("url") },
            "js_action_redirect" => Action::Redirect { url: field("url") },
            "js_action_set_timeout" => Action::Delay {
                millis: attrs.get("delay").and_then(|v| v.as_millis()).unwrap_or(0),
            },
            _ => return None,
        };
        Some(action)
    }
}

fn text_attr(attrs: &Attributes, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| attrs.get(*key).and_then(|v| v.as_text()))
}

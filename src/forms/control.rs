use crate::dom::{NodeId, NodeRef};
use crate::errors::Result;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, "application/octet-stream", content))
    }
}

/// What a control is, together with its current value.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// `<input>` of any free-text type (text, password, email, search, ...).
    Text { input_type: String, value: String },
    Hidden { value: String },
    Textarea { value: String },
    Checkbox { value: String, checked: bool },
    Radio { value: String, checked: bool },
    SelectSingle {
        options: Vec<SelectOption>,
        selected: Option<usize>,
    },
    SelectMultiple {
        options: Vec<SelectOption>,
        selected: BTreeSet<usize>,
    },
    /// Submit buttons; `image` marks `<input type=image>`, which submits click
    /// coordinates instead of its value.
    Submit { value: String, image: bool },
    /// Reset and plain buttons; never submitted.
    Button,
    File { upload: Option<FileUpload> },
}

impl ControlKind {
    pub fn type_name(&self) -> &str {
        match self {
            ControlKind::Text { input_type, .. } => input_type,
            ControlKind::Hidden { .. } => "hidden",
            ControlKind::Textarea { .. } => "textarea",
            ControlKind::Checkbox { .. } => "checkbox",
            ControlKind::Radio { .. } => "radio",
            ControlKind::SelectSingle { .. } => "select",
            ControlKind::SelectMultiple { .. } => "select-multiple",
            ControlKind::Submit { .. } => "submit",
            ControlKind::Button => "button",
            ControlKind::File { .. } => "file",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormControl {
    pub node: NodeId,
    pub name: Option<String>,
    pub element_id: Option<String>,
    pub disabled: bool,
    pub kind: ControlKind,
}

impl FormControl {
    /// Builds a control from an `input`, `select`, `textarea` or `button`
    /// element; any other node yields `None`.
    pub fn from_node(node: NodeRef<'_>, inherited_disabled: bool) -> Option<Self> {
        let kind = match node.tag() {
            "input" => input_kind(&node),
            "button" => match node.attr("type", "submit").trim().to_ascii_lowercase().as_str() {
                "reset" | "button" => ControlKind::Button,
                _ => ControlKind::Submit {
                    value: node.attr("value", "").to_string(),
                    image: false,
                },
            },
            "textarea" => ControlKind::Textarea { value: node.text() },
            "select" => select_kind(&node),
            _ => return None,
        };

        Some(Self {
            node: node.id(),
            name: node.get_attr("name").map(str::to_string),
            element_id: node.get_attr("id").map(str::to_string),
            disabled: inherited_disabled || node.has_attr("disabled"),
            kind,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the control can contribute to a submission at all.
    pub fn is_successful_candidate(&self) -> bool {
        !self.disabled && self.name.as_deref().map(|n| !n.is_empty()).unwrap_or(false)
    }

    pub fn is_submit(&self) -> bool {
        matches!(self.kind, ControlKind::Submit { .. })
    }

    pub fn is_checked(&self) -> bool {
        matches!(
            self.kind,
            ControlKind::Checkbox { checked: true, .. } | ControlKind::Radio { checked: true, .. }
        )
    }
}

fn input_kind(node: &NodeRef<'_>) -> ControlKind {
    let input_type = node.attr("type", "text").trim().to_ascii_lowercase();
    let value = node.get_attr("value");
    match input_type.as_str() {
        "checkbox" => ControlKind::Checkbox {
            value: value.unwrap_or("on").to_string(),
            checked: node.has_attr("checked"),
        },
        "radio" => ControlKind::Radio {
            value: value.unwrap_or("on").to_string(),
            checked: node.has_attr("checked"),
        },
        "hidden" => ControlKind::Hidden {
            value: value.unwrap_or("").to_string(),
        },
        "file" => ControlKind::File { upload: None },
        "submit" | "image" => ControlKind::Submit {
            value: value.unwrap_or("").to_string(),
            image: input_type == "image",
        },
        "reset" | "button" => ControlKind::Button,
        "" => ControlKind::Text {
            input_type: "text".to_string(),
            value: value.unwrap_or("").to_string(),
        },
        _ => ControlKind::Text {
            value: value.unwrap_or("").to_string(),
            input_type,
        },
    }
}

fn select_kind(node: &NodeRef<'_>) -> ControlKind {
    let mut options = Vec::new();
    let mut marked = Vec::new();
    for (index, option) in node.find(|n| n.tag() == "option").enumerate() {
        let label = option.text_content();
        options.push(SelectOption {
            value: option.get_attr("value").map(str::to_string).unwrap_or_else(|| label.clone()),
            label,
            disabled: option.has_attr("disabled"),
        });
        if option.has_attr("selected") {
            marked.push(index);
        }
    }

    if node.has_attr("multiple") {
        ControlKind::SelectMultiple {
            options,
            selected: marked.into_iter().collect(),
        }
    } else {
        // Last `selected` wins, as in browsers; default to the first option
        let selected = marked
            .last()
            .copied()
            .or(if options.is_empty() { None } else { Some(0) });
        ControlKind::SelectSingle { options, selected }
    }
}

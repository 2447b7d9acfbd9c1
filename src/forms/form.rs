use crate::dom::{Document, NodeId, NodeRef};
use crate::errors::{BrowserError, Result};
use crate::forms::control::{ControlKind, FileUpload, FormControl};
use crate::forms::encoding::{self, FormEntry, MultipartBody};
use crate::types::{HttpRequest, Method};
use encoding_rs::Encoding;
use std::collections::HashSet;
use tracing::warn;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enctype {
    UrlEncoded,
    Multipart,
}

impl Enctype {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Enctype::UrlEncoded => "application/x-www-form-urlencoded",
            Enctype::Multipart => "multipart/form-data",
        }
    }
}

/// A value to assign with [`Form::set_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Multiple(Vec<String>),
    Checked(bool),
    File(FileUpload),
}

impl FieldValue {
    fn shape(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "a text value",
            FieldValue::Multiple(_) => "a list of values",
            FieldValue::Checked(_) => "a checked state",
            FieldValue::File(_) => "a file",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(checked: bool) -> Self {
        FieldValue::Checked(checked)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multiple(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

impl From<FileUpload> for FieldValue {
    fn from(upload: FileUpload) -> Self {
        FieldValue::File(upload)
    }
}

/// Designates the submit control that was "clicked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonHandle(usize);

/// A `<form>` with its controls in document order.
///
/// The form is a snapshot: values are tracked here, never written back into
/// the document. It stays tied to the document it was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    document_id: Uuid,
    node: NodeId,
    name: Option<String>,
    element_id: Option<String>,
    action: Url,
    method: Method,
    enctype: Enctype,
    encoding: &'static Encoding,
    controls: Vec<FormControl>,
}

impl Form {
    pub fn extract(document: &Document, form: NodeRef<'_>) -> Self {
        let action = resolve_action(document, &form);

        let method = if form.attr("method", "").trim().eq_ignore_ascii_case("post") {
            Method::Post
        } else {
            Method::Get
        };

        let enctype = if form
            .attr("enctype", "")
            .trim()
            .eq_ignore_ascii_case("multipart/form-data")
        {
            Enctype::Multipart
        } else {
            Enctype::UrlEncoded
        };

        let encoding = form
            .attr("accept-charset", "")
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .find_map(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or_else(|| document.encoding())
            .output_encoding();

        let mut controls = collect_controls(form);
        normalize_radio_groups(&mut controls);

        Self {
            document_id: document.id(),
            node: form.id(),
            name: form.get_attr("name").map(str::to_string),
            element_id: form.get_attr("id").map(str::to_string),
            action,
            method,
            enctype,
            encoding,
            controls,
        }
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn action(&self) -> &Url {
        &self.action
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn enctype(&self) -> Enctype {
        self.enctype
    }

    /// Encoding used for submitted names and values.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&FormControl> {
        self.controls.iter().find(|c| c.name() == Some(name))
    }

    fn indices_named(&self, name: &str) -> Vec<usize> {
        self.controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name() == Some(name))
            .map(|(i, _)| i)
            .collect()
    }

    /// The single current value for `name`: the text of a text-like control,
    /// the checked radio or checkbox value, or the selected option.
    pub fn value(&self, name: &str) -> Result<Option<&str>> {
        let indices = self.indices_named(name);
        let first = indices
            .first()
            .map(|&i| &self.controls[i])
            .ok_or_else(|| BrowserError::ControlNotFound(name.to_string()))?;

        match &first.kind {
            ControlKind::Radio { .. } | ControlKind::Checkbox { .. } => Ok(indices
                .iter()
                .map(|&i| &self.controls[i])
                .find(|c| c.is_checked())
                .and_then(|c| match &c.kind {
                    ControlKind::Radio { value, .. } | ControlKind::Checkbox { value, .. } => {
                        Some(value.as_str())
                    }
                    _ => None,
                })),
            ControlKind::Text { value, .. }
            | ControlKind::Hidden { value }
            | ControlKind::Textarea { value }
            | ControlKind::Submit { value, .. } => Ok(Some(value.as_str())),
            ControlKind::SelectSingle { options, selected } => {
                Ok(selected.map(|i| options[i].value.as_str()))
            }
            ControlKind::SelectMultiple { .. } | ControlKind::File { .. } | ControlKind::Button => {
                Err(BrowserError::InvalidControlState(format!(
                    "'{}' is a {} control and has no single value",
                    name,
                    first.kind.type_name()
                )))
            }
        }
    }

    /// Every value currently selected or checked under `name`, in document order.
    pub fn values(&self, name: &str) -> Result<Vec<&str>> {
        let indices = self.indices_named(name);
        if indices.is_empty() {
            return Err(BrowserError::ControlNotFound(name.to_string()));
        }

        let mut values = Vec::new();
        for control in indices.iter().map(|&i| &self.controls[i]) {
            match &control.kind {
                ControlKind::Radio { value, checked } | ControlKind::Checkbox { value, checked } => {
                    if *checked {
                        values.push(value.as_str());
                    }
                }
                ControlKind::SelectSingle { options, selected } => {
                    values.extend(selected.map(|i| options[i].value.as_str()));
                }
                ControlKind::SelectMultiple { options, selected } => {
                    values.extend(selected.iter().map(|&i| options[i].value.as_str()));
                }
                ControlKind::Text { value, .. }
                | ControlKind::Hidden { value }
                | ControlKind::Textarea { value } => values.push(value.as_str()),
                ControlKind::File { upload } => {
                    values.extend(upload.as_ref().map(|u| u.filename.as_str()));
                }
                ControlKind::Submit { .. } | ControlKind::Button => {}
            }
        }
        Ok(values)
    }

    /// Assigns a value to the control(s) named `name`.
    ///
    /// Radio groups take a `Text` naming the button to check. Checkboxes take
    /// `Checked` (every box of the name) or `Multiple` (exactly those values).
    /// Selects take a `Text` (single) or `Multiple` (multiple) of existing
    /// option values. Files take `File`. Anything else takes `Text`, applied to
    /// the first control of that name.
    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        let indices = self.indices_named(name);
        let first = *indices
            .first()
            .ok_or_else(|| BrowserError::ControlNotFound(name.to_string()))?;

        match self.controls[first].kind {
            ControlKind::Radio { .. } => self.set_radio_group(name, &indices, value),
            ControlKind::Checkbox { .. } => self.set_checkbox_group(name, &indices, value),
            _ => set_single(&mut self.controls[first], name, value),
        }
    }

    /// Checks or unchecks the checkbox or radio button `name` with the given
    /// value. Checking a radio button unchecks the rest of its group.
    pub fn set_checked(&mut self, name: &str, value: &str, checked: bool) -> Result<()> {
        let indices = self.indices_named(name);
        if indices.is_empty() {
            return Err(BrowserError::ControlNotFound(name.to_string()));
        }

        let target = indices
            .iter()
            .copied()
            .find(|&i| match &self.controls[i].kind {
                ControlKind::Radio { value: v, .. } | ControlKind::Checkbox { value: v, .. } => v == value,
                _ => false,
            })
            .ok_or_else(|| {
                BrowserError::InvalidControlState(format!(
                    "no checkbox or radio button '{}' with value '{}'",
                    name, value
                ))
            })?;

        let is_radio = matches!(self.controls[target].kind, ControlKind::Radio { .. });
        for &i in &indices {
            match &mut self.controls[i].kind {
                ControlKind::Radio { checked: c, .. } if is_radio => {
                    *c = if i == target { checked } else { *c && !checked };
                }
                ControlKind::Checkbox { checked: c, .. } if i == target => *c = checked,
                _ => {}
            }
        }
        Ok(())
    }

    fn set_radio_group(&mut self, name: &str, indices: &[usize], value: FieldValue) -> Result<()> {
        let wanted = match value {
            FieldValue::Text(text) => text,
            other => return Err(shape_error(name, "radio", &other)),
        };

        let target = indices
            .iter()
            .copied()
            .find(|&i| matches!(&self.controls[i].kind, ControlKind::Radio { value, .. } if *value == wanted))
            .ok_or_else(|| {
                BrowserError::InvalidControlState(format!(
                    "no radio button '{}' with value '{}'",
                    name, wanted
                ))
            })?;

        for &i in indices {
            if let ControlKind::Radio { checked, .. } = &mut self.controls[i].kind {
                *checked = i == target;
            }
        }
        Ok(())
    }

    fn set_checkbox_group(&mut self, name: &str, indices: &[usize], value: FieldValue) -> Result<()> {
        match value {
            FieldValue::Checked(state) => {
                for &i in indices {
                    if let ControlKind::Checkbox { checked, .. } = &mut self.controls[i].kind {
                        *checked = state;
                    }
                }
                Ok(())
            }
            FieldValue::Multiple(wanted) => {
                let available: HashSet<&str> = indices
                    .iter()
                    .filter_map(|&i| match &self.controls[i].kind {
                        ControlKind::Checkbox { value, .. } => Some(value.as_str()),
                        _ => None,
                    })
                    .collect();
                if let Some(missing) = wanted.iter().find(|w| !available.contains(w.as_str())) {
                    return Err(BrowserError::InvalidControlState(format!(
                        "no checkbox '{}' with value '{}'",
                        name, missing
                    )));
                }

                for &i in indices {
                    if let ControlKind::Checkbox { value, checked } = &mut self.controls[i].kind {
                        *checked = wanted.iter().any(|w| *w == *value);
                    }
                }
                Ok(())
            }
            other => Err(shape_error(name, "checkbox", &other)),
        }
    }

    /// Finds an enabled submit control by name.
    pub fn button(&self, name: &str) -> Result<ButtonHandle> {
        self.find_button(name, None)
    }

    /// Like [`Form::button`], for several buttons sharing a name.
    pub fn button_with_value(&self, name: &str, value: &str) -> Result<ButtonHandle> {
        self.find_button(name, Some(value))
    }

    fn find_button(&self, name: &str, wanted: Option<&str>) -> Result<ButtonHandle> {
        let mut named = self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name() == Some(name))
            .peekable();
        if named.peek().is_none() {
            return Err(BrowserError::ControlNotFound(name.to_string()));
        }

        named
            .find(|(_, c)| match &c.kind {
                ControlKind::Submit { value, .. } => !c.disabled && wanted.map_or(true, |w| w == value),
                _ => false,
            })
            .map(|(i, _)| ButtonHandle(i))
            .ok_or_else(|| {
                BrowserError::InvalidControlState(format!(
                    "'{}' is not an enabled submit button{}",
                    name,
                    wanted.map(|w| format!(" with value '{}'", w)).unwrap_or_default()
                ))
            })
    }

    /// The entry list a browser would build for this form, in document order.
    pub fn form_data(&self, clicked: Option<ButtonHandle>) -> Result<Vec<FormEntry>> {
        if let Some(ButtonHandle(index)) = clicked {
            match self.controls.get(index) {
                Some(control) if control.is_submit() && !control.disabled => {}
                _ => {
                    return Err(BrowserError::InvalidControlState(format!(
                        "control #{} is not an enabled submit button of this form",
                        index
                    )))
                }
            }
        }

        let mut entries = Vec::new();
        for (index, control) in self.controls.iter().enumerate() {
            if !control.is_successful_candidate() {
                continue;
            }
            let name = control.name.as_deref().unwrap_or_default();

            match &control.kind {
                ControlKind::Text { value, .. }
                | ControlKind::Hidden { value }
                | ControlKind::Textarea { value } => entries.push(FormEntry::text(name, value)),
                ControlKind::Checkbox { value, checked } | ControlKind::Radio { value, checked } => {
                    if *checked {
                        entries.push(FormEntry::text(name, value));
                    }
                }
                // Disabled options are never submitted, even when selected
                ControlKind::SelectSingle { options, selected } => {
                    if let Some(option) = selected.map(|i| &options[i]).filter(|o| !o.disabled) {
                        entries.push(FormEntry::text(name, &option.value));
                    }
                }
                ControlKind::SelectMultiple { options, selected } => {
                    for option in selected.iter().map(|&i| &options[i]).filter(|o| !o.disabled) {
                        entries.push(FormEntry::text(name, &option.value));
                    }
                }
                ControlKind::Submit { value, image } => {
                    if clicked != Some(ButtonHandle(index)) {
                        continue;
                    }
                    if *image {
                        // No pointer, so the click lands on the image origin
                        entries.push(FormEntry::text(&format!("{}.x", name), "0"));
                        entries.push(FormEntry::text(&format!("{}.y", name), "0"));
                    } else {
                        entries.push(FormEntry::text(name, value));
                    }
                }
                // An empty file input contributes nothing
                ControlKind::File { upload: Some(upload) } => entries.push(FormEntry::File {
                    name: encoding::normalize_newlines(name),
                    upload: upload.clone(),
                }),
                ControlKind::File { upload: None } | ControlKind::Button => {}
            }
        }
        Ok(entries)
    }

    /// Builds the request that submitting this form performs.
    pub fn encode(&self, clicked: Option<ButtonHandle>) -> Result<HttpRequest> {
        let entries = self.form_data(clicked)?;

        match (self.method, self.enctype) {
            (Method::Get, _) => {
                let mut url = self.action.clone();
                url.set_query(Some(&encoding::urlencode(&entries, self.encoding)));
                Ok(HttpRequest::get(url))
            }
            (Method::Post, Enctype::UrlEncoded) => Ok(HttpRequest::post(
                self.action.clone(),
                Enctype::UrlEncoded.mime_type(),
                encoding::urlencode(&entries, self.encoding).into_bytes(),
            )),
            (Method::Post, Enctype::Multipart) => {
                let body = MultipartBody::encode(&entries, self.encoding);
                Ok(HttpRequest::post(
                    self.action.clone(),
                    &body.content_type(),
                    body.into_bytes(),
                ))
            }
        }
    }
}

fn resolve_action(document: &Document, form: &NodeRef<'_>) -> Url {
    let action = form.attr("action", "").trim();
    if action.is_empty() {
        // An empty action means the document itself, not the base URL
        return document.url().clone();
    }

    match document.base_url().join(action) {
        Ok(url) => url,
        Err(err) => {
            warn!(action, error = %err, "unresolvable form action, using document URL");
            document.url().clone()
        }
    }
}

/// Collects controls below `form` without entering nested forms.
fn collect_controls(form: NodeRef<'_>) -> Vec<FormControl> {
    let mut controls = Vec::new();
    let mut stack: Vec<(NodeRef<'_>, bool)> = form
        .children()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|child| (child, false))
        .collect();

    while let Some((node, inherited_disabled)) = stack.pop() {
        match node.tag() {
            "form" => continue,
            // Options are read by the select itself
            "input" | "button" | "textarea" | "select" => {
                controls.extend(FormControl::from_node(node, inherited_disabled));
                continue;
            }
            _ => {}
        }

        let disabled = inherited_disabled || (node.tag() == "fieldset" && node.has_attr("disabled"));
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, disabled)));
    }

    controls
}

/// Leaves at most one checked radio button per name, keeping the last one.
fn normalize_radio_groups(controls: &mut [FormControl]) {
    let mut seen = HashSet::new();
    for control in controls.iter_mut().rev() {
        if let ControlKind::Radio { checked, .. } = &mut control.kind {
            // Unnamed radios form no group
            let Some(name) = control.name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            if *checked && !seen.insert(name.to_string()) {
                *checked = false;
            }
        }
    }
}

fn set_single(control: &mut FormControl, name: &str, value: FieldValue) -> Result<()> {
    let type_name = control.kind.type_name().to_string();
    match (&mut control.kind, value) {
        (ControlKind::Text { value, .. }, FieldValue::Text(new))
        | (ControlKind::Hidden { value }, FieldValue::Text(new))
        | (ControlKind::Textarea { value }, FieldValue::Text(new)) => {
            *value = new;
            Ok(())
        }
        (ControlKind::SelectSingle { options, selected }, FieldValue::Text(new)) => {
            let index = options.iter().position(|o| o.value == new).ok_or_else(|| {
                BrowserError::InvalidControlState(format!(
                    "select '{}' has no option with value '{}'",
                    name, new
                ))
            })?;
            *selected = Some(index);
            Ok(())
        }
        (ControlKind::SelectMultiple { options, selected }, FieldValue::Multiple(wanted)) => {
            let mut indices = std::collections::BTreeSet::new();
            for w in &wanted {
                let index = options.iter().position(|o| &o.value == w).ok_or_else(|| {
                    BrowserError::InvalidControlState(format!(
                        "select '{}' has no option with value '{}'",
                        name, w
                    ))
                })?;
                indices.insert(index);
            }
            *selected = indices;
            Ok(())
        }
        (ControlKind::File { upload }, FieldValue::File(file)) => {
            *upload = Some(file);
            Ok(())
        }
        (_, other) => Err(shape_error(name, &type_name, &other)),
    }
}

fn shape_error(name: &str, type_name: &str, value: &FieldValue) -> BrowserError {
    BrowserError::InvalidControlState(format!(
        "cannot assign {} to {} control '{}'",
        value.shape(),
        type_name,
        name
    ))
}

//! Settings pages: form definitions bound to options.
//!
//! A plugin describes its page as sections of labeled text fields, each
//! bound 1:1 to an option name. The host renders the form and persists
//! submitted values verbatim. Both operations are gated on the page's
//! capability.

use crate::capability::{Capability, Viewer};
use crate::error::{HostError, HostResult};
use crate::options::OptionStore;
use askama::Template;
use std::collections::HashMap;
use tracing::{debug, warn};

/// A single text input bound to an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsField {
    pub id: String,
    pub option: String,
    pub label: String,
    pub description: Option<String>,
}

impl SettingsField {
    pub fn new(option: impl Into<String>, label: impl Into<String>) -> Self {
        let option = option.into();
        Self {
            id: format!("{option}_settings_field"),
            option,
            label: label.into(),
            description: None,
        }
    }

    /// Help text shown under the input. Newlines become line breaks.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// A titled group of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSection {
    pub id: String,
    pub title: String,
    pub intro: Option<String>,
    pub fields: Vec<SettingsField>,
}

impl SettingsSection {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            intro: None,
            fields: Vec::new(),
        }
    }

    pub fn intro(mut self, text: impl Into<String>) -> Self {
        self.intro = Some(text.into());
        self
    }

    pub fn field(mut self, field: SettingsField) -> Self {
        self.fields.push(field);
        self
    }
}

/// An administrative settings page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPage {
    pub slug: String,
    pub page_title: String,
    pub menu_title: String,
    pub capability: Capability,
    pub intro: Option<String>,
    pub sections: Vec<SettingsSection>,
}

impl SettingsPage {
    pub fn new(
        slug: impl Into<String>,
        page_title: impl Into<String>,
        menu_title: impl Into<String>,
        capability: Capability,
    ) -> Self {
        Self {
            slug: slug.into(),
            page_title: page_title.into(),
            menu_title: menu_title.into(),
            capability,
            intro: None,
            sections: Vec::new(),
        }
    }

    pub fn intro(mut self, text: impl Into<String>) -> Self {
        self.intro = Some(text.into());
        self
    }

    pub fn section(mut self, section: SettingsSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Option names bound to this page, in display order.
    pub fn registered_options(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter())
            .map(|field| field.option.as_str())
    }

    /// Render the page as HTML.
    ///
    /// Returns `Ok(None)` when the viewer lacks the page capability, in which
    /// case nothing is shown.
    pub fn render(&self, viewer: &Viewer, options: &dyn OptionStore) -> HostResult<Option<String>> {
        if !viewer.can(&self.capability) {
            debug!(page = %self.slug, viewer = %viewer.name, "Settings page hidden from viewer");
            return Ok(None);
        }

        let mut sections = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let mut fields = Vec::with_capacity(section.fields.len());
            for field in &section.fields {
                fields.push(FieldView {
                    id: &field.id,
                    option: &field.option,
                    label: &field.label,
                    value: options.get(&field.option)?.unwrap_or_default(),
                    description_lines: field
                        .description
                        .as_deref()
                        .filter(|d| !d.is_empty())
                        .map(|d| d.split('\n').collect())
                        .unwrap_or_default(),
                });
            }
            sections.push(SectionView {
                id: &section.id,
                title: &section.title,
                intro: section.intro.as_deref(),
                fields,
            });
        }

        let template = SettingsPageTemplate {
            slug: &self.slug,
            page_title: &self.page_title,
            intro: self.intro.as_deref(),
            sections,
        };
        template
            .render()
            .map(Some)
            .map_err(|e| HostError::Render(e.to_string()))
    }

    /// Persist a submitted form.
    ///
    /// Values of registered fields are stored verbatim; unknown keys are
    /// ignored and fields absent from the form keep their current value.
    /// Returns the number of options written.
    pub fn submit(
        &self,
        viewer: &Viewer,
        options: &dyn OptionStore,
        form: &HashMap<String, String>,
    ) -> HostResult<usize> {
        if !viewer.can(&self.capability) {
            warn!(page = %self.slug, viewer = %viewer.name, "Rejected settings submission");
            return Err(HostError::MissingCapability(
                self.capability.as_str().to_string(),
            ));
        }

        let mut written = 0;
        for option in self.registered_options() {
            if let Some(value) = form.get(option) {
                options.update(option, value)?;
                written += 1;
            }
        }

        debug!(page = %self.slug, written, "Settings saved");
        Ok(written)
    }
}

#[derive(Template)]
#[template(path = "settings_page.html")]
struct SettingsPageTemplate<'a> {
    slug: &'a str,
    page_title: &'a str,
    intro: Option<&'a str>,
    sections: Vec<SectionView<'a>>,
}

struct SectionView<'a> {
    id: &'a str,
    title: &'a str,
    intro: Option<&'a str>,
    fields: Vec<FieldView<'a>>,
}

struct FieldView<'a> {
    id: &'a str,
    option: &'a str,
    label: &'a str,
    value: String,
    description_lines: Vec<&'a str>,
}

//! DLT message template catalog

use crate::error::{Result, SmsError};

/// Ordered, immutable list of DLT-registered message bodies.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<String>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }

    /// Message body stored at `index`.
    pub fn resolve(&self, index: usize) -> Result<&str> {
        self.templates
            .get(index)
            .map(String::as_str)
            .filter(|body| !body.trim().is_empty())
            .ok_or(SmsError::TemplateNotFound { index })
    }

    pub fn all(&self) -> &[String] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

//! Patch validation
//!
//! A [`Validator`] is constructed explicitly and handed to whoever applies
//! patches. It checks field-level length and size rules and renders failures
//! through a [`Translator`], so messages can be swapped for another locale or
//! wording without touching the rules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::TodoError;
use super::todo::UpdateTodo;

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: usize = 255;
/// Maximum description length in characters
pub const DESCRIPTION_MAX_CHARS: usize = 1024;
/// Maximum number of labels on a todo
pub const LABELS_MAX_ITEMS: usize = 10;

/// What a rule measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Length of a string, in characters
    Characters,
    /// Number of items in a list
    Items,
}

/// A violated bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Min(usize),
    Max(usize),
}

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: Rule,
    pub measure: Measure,
}

/// Turns field errors into human-readable messages
pub trait Translator: Send + Sync {
    fn translate(&self, error: &FieldError) -> String;
}

/// Default English messages
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Translator for English {
    fn translate(&self, error: &FieldError) -> String {
        let (unit, units) = match error.measure {
            Measure::Characters => ("character", "characters"),
            Measure::Items => ("item", "items"),
        };
        let plural = |n: usize| if n == 1 { unit } else { units };

        match (error.measure, error.rule) {
            (Measure::Characters, Rule::Min(n)) => format!(
                "{} must be at least {} {} in length",
                error.field,
                n,
                plural(n)
            ),
            (Measure::Characters, Rule::Max(n)) => format!(
                "{} must be a maximum of {} {} in length",
                error.field,
                n,
                plural(n)
            ),
            (Measure::Items, Rule::Min(n)) => {
                format!("{} must contain at least {} {}", error.field, n, plural(n))
            }
            (Measure::Items, Rule::Max(n)) => {
                format!("{} must contain a maximum of {} {}", error.field, n, plural(n))
            }
        }
    }
}

/// All field errors found in one patch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<_> = self.0.iter().map(|e| e.field).collect();
        write!(f, "validation failed for {}", fields.join(", "))
    }
}

/// Inclusive bounds for one field
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Option<usize>,
    max: usize,
}

impl Bounds {
    fn check(&self, field: &'static str, measure: Measure, value: usize) -> Option<FieldError> {
        let rule = match self.min {
            Some(min) if value < min => Rule::Min(min),
            _ if value > self.max => Rule::Max(self.max),
            _ => return None,
        };
        Some(FieldError {
            field,
            rule,
            measure,
        })
    }
}

/// Validates [`UpdateTodo`] patches
#[derive(Clone)]
pub struct Validator {
    title: Bounds,
    description: Bounds,
    labels: Bounds,
    translator: Arc<dyn Translator>,
}

impl Validator {
    /// Creates a validator with the standard rules and English messages
    pub fn new() -> Self {
        Self::with_translator(English)
    }

    /// Creates a validator with the standard rules and custom messages
    pub fn with_translator(translator: impl Translator + 'static) -> Self {
        Self {
            title: Bounds {
                min: Some(1),
                max: TITLE_MAX_CHARS,
            },
            description: Bounds {
                min: None,
                max: DESCRIPTION_MAX_CHARS,
            },
            labels: Bounds {
                min: Some(1),
                max: LABELS_MAX_ITEMS,
            },
            translator: Arc::new(translator),
        }
    }

    /// Checks every present field of the patch; absent fields are not checked
    pub fn validate(&self, patch: &UpdateTodo) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if let Some(title) = &patch.title {
            let len = title.chars().count();
            errors.extend(self.title.check("title", Measure::Characters, len));
        }

        if let Some(description) = &patch.description {
            let len = description.chars().count();
            errors.extend(
                self.description
                    .check("description", Measure::Characters, len),
            );
        }

        if let Some(labels) = &patch.labels {
            errors.extend(self.labels.check("labels", Measure::Items, labels.len()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Maps each failed field to its translated message
    pub fn translate(&self, errors: &ValidationErrors) -> BTreeMap<String, String> {
        errors
            .iter()
            .map(|e| (e.field.to_string(), self.translator.translate(e)))
            .collect()
    }

    /// Validates and converts failures into [`TodoError::InvalidInput`]
    pub fn check(&self, patch: &UpdateTodo) -> Result<(), TodoError> {
        self.validate(patch).map_err(|errors| {
            let fields = self.translate(&errors);
            let reason = fields.values().cloned().collect::<Vec<_>>().join("; ");
            TodoError::InvalidInput { reason, fields }
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl Extend<FieldError> for ValidationErrors {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        for error in iter {
            self.push(error);
        }
    }
}

use std::collections::BTreeSet;

use nextform_models::{
    contact::{ContactField, ContactFormData},
    email_address::is_valid_email,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
}

/// Validation rules of the contact form. The rules of each field are listed
/// in the order their errors take precedence.
pub const RULES: &[(ContactField, Rule)] = &[
    (ContactField::Name, Rule::Required),
    (ContactField::Name, Rule::MinLength(2)),
    (ContactField::Surname, Rule::Required),
    (ContactField::Surname, Rule::MinLength(2)),
    (ContactField::Email, Rule::Required),
    (ContactField::Email, Rule::Email),
    (ContactField::Message, Rule::Required),
    (ContactField::Message, Rule::MinLength(10)),
];

impl Rule {
    fn check(self, field: ContactField, value: &str) -> Result<(), ValidationError> {
        // Only `Required` reports empty values.
        let ok = match self {
            Self::Required => !value.is_empty(),
            Self::Email => value.is_empty() || is_valid_email(value),
            Self::MinLength(min) => value.is_empty() || value.chars().count() >= min,
        };
        if ok {
            return Ok(());
        }

        Err(match self {
            Self::Required => ValidationError::Required { field },
            Self::Email => ValidationError::Email { field },
            Self::MinLength(min) => ValidationError::MinLength { field, min },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: ContactField },
    #[error("Invalid email format")]
    Email { field: ContactField },
    #[error("Minimum {min} characters required")]
    MinLength { field: ContactField, min: usize },
}

impl ValidationError {
    pub fn field(&self) -> ContactField {
        match *self {
            Self::Required { field } | Self::Email { field } | Self::MinLength { field, .. } => {
                field
            }
        }
    }
}

/// The first error of every invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| format!("{}: {err}", err.field()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormModel {
    values: ContactFormData,
    touched: BTreeSet<ContactField>,
}

impl FormModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &ContactFormData {
        &self.values
    }

    pub fn value(&self, field: ContactField) -> &str {
        self.values.get(field)
    }

    pub fn set_field(&mut self, field: ContactField, value: impl Into<String>) {
        self.values.set(field, value);
    }

    pub fn touch(&mut self, field: ContactField) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: ContactField) -> bool {
        self.touched.contains(&field)
    }

    pub fn mark_all_touched(&mut self) {
        self.touched.extend(ContactField::ALL);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn first_error(&self, field: ContactField) -> Option<ValidationError> {
        let value = self.values.get(field);
        RULES
            .iter()
            .filter(|&&(f, _)| f == field)
            .find_map(|&(_, rule)| rule.check(field, value).err())
    }

    /// Untouched fields never report invalid, whatever they contain.
    pub fn is_field_invalid(&self, field: ContactField) -> bool {
        self.is_touched(field) && self.first_error(field).is_some()
    }

    /// Message of the first failing rule of `field`, or an empty string.
    pub fn field_error(&self, field: ContactField) -> String {
        self.first_error(field)
            .map(|err| err.to_string())
            .unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        ContactField::ALL
            .into_iter()
            .all(|field| self.first_error(field).is_none())
    }

    pub fn validate(&self) -> Result<ContactFormData, ValidationErrors> {
        let errors = ContactField::ALL
            .into_iter()
            .filter_map(|field| self.first_error(field))
            .collect::<Vec<_>>();

        if errors.is_empty() {
            Ok(self.values.clone())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

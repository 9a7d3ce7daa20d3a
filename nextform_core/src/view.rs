use std::fmt;

use nextform_models::{contact::ContactField, submission::SubmissionState};

use crate::form::FormModel;

pub const SUCCESS_MESSAGE: &str = "Thank you! Your message has been sent.";

/// Text rendering of the contact form.
#[derive(Debug, Clone)]
pub struct ContactView<'a> {
    form: &'a FormModel,
    state: SubmissionState,
}

impl<'a> ContactView<'a> {
    pub fn new(form: &'a FormModel, state: SubmissionState) -> Self {
        Self { form, state }
    }
}

impl fmt::Display for ContactView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contact us")?;
        writeln!(f)?;

        for field in ContactField::ALL {
            let label = format!("{}:", field.label());
            writeln!(f, "  {label:<9} {}", self.form.value(field))?;
            if self.form.is_field_invalid(field) {
                writeln!(f, "  {:<9} ! {}", "", self.form.field_error(field))?;
            }
        }
        writeln!(f)?;

        match &self.state {
            SubmissionState::Loading => writeln!(f, "  [ Sending... ] (disabled)")?,
            _ => writeln!(f, "  [ Send message ]")?,
        }

        match &self.state {
            SubmissionState::Success => writeln!(f, "\n  {SUCCESS_MESSAGE}"),
            SubmissionState::Error { message } => writeln!(f, "\n  Error: {message}"),
            SubmissionState::Idle | SubmissionState::Loading => Ok(()),
        }
    }
}

/// Shown when a submission fails and the server did not say why.
pub const SUBMISSION_FALLBACK_ERROR: &str = "Failed to submit form. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error {
        message: String,
    },
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

use std::{fmt, sync::Arc};

use nextform_extern_contracts::{ContactApiError, ContactApiService};
use nextform_models::{
    contact::ContactField,
    submission::{SubmissionState, SUBMISSION_FALLBACK_ERROR},
};
use thiserror::Error;
use tokio::{
    sync::watch,
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, error, info};

use crate::{
    form::{FormModel, ValidationErrors},
    view::ContactView,
};

/// Drives the submit lifecycle of a contact form. At most one submission is
/// in flight at a time.
#[derive(Debug)]
pub struct ContactSubmitter<Api> {
    api: Arc<Api>,
    form: FormModel,
    state: watch::Sender<SubmissionState>,
    /// Identifies the latest submission. Results of older ones are ignored.
    generation: u64,
    /// Request of the latest submission.
    request: Option<AbortHandle>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in progress.")]
    InFlight,
    #[error("The form is invalid: {0}")]
    Invalid(ValidationErrors),
}

/// Why a submission failed, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    message: String,
}

impl SubmissionError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ContactApiError> for SubmissionError {
    fn from(value: ContactApiError) -> Self {
        let message = match value {
            ContactApiError::Rejected {
                detail: Some(detail),
                ..
            } => detail,
            ContactApiError::Rejected { detail: None, .. } | ContactApiError::Other(_) => {
                SUBMISSION_FALLBACK_ERROR.into()
            }
        };
        Self { message }
    }
}

/// The request of a submission that has entered the loading state.
///
/// The request is already running. Dropping this handle does not cancel it,
/// but its outcome is lost: the submitter stays loading until the request has
/// finished, after which the form can be submitted again.
#[must_use = "the outcome must be passed to `ContactSubmitter::complete`"]
pub struct PendingSubmission {
    generation: u64,
    request: JoinHandle<Result<(), ContactApiError>>,
}

impl fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PendingSubmission {
    pub async fn wait(self) -> SubmissionResult {
        let outcome = match self.request.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                error!("Failed to submit contact form: {err:#}");
                Err(err.into())
            }
            Err(err) => {
                error!("Contact form request did not finish: {err}");
                Err(SubmissionError {
                    message: SUBMISSION_FALLBACK_ERROR.into(),
                })
            }
        };

        SubmissionResult {
            generation: self.generation,
            outcome,
        }
    }
}

#[derive(Debug)]
pub struct SubmissionResult {
    generation: u64,
    outcome: Result<(), SubmissionError>,
}

impl SubmissionResult {
    pub fn outcome(&self) -> &Result<(), SubmissionError> {
        &self.outcome
    }
}

impl<Api> ContactSubmitter<Api>
where
    Api: ContactApiService,
{
    pub fn new(api: Api) -> Self {
        Self {
            api: Arc::new(api),
            form: FormModel::new(),
            state: watch::channel(SubmissionState::Idle).0,
            generation: 0,
            request: None,
        }
    }

    pub fn form(&self) -> &FormModel {
        &self.form
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_in_flight()
    }

    /// Loading and the request has not finished yet.
    fn is_in_flight(&self) -> bool {
        self.state.borrow().is_loading()
            && self
                .request
                .as_ref()
                .is_some_and(|request| !request.is_finished())
    }

    pub fn view(&self) -> ContactView<'_> {
        ContactView::new(&self.form, self.state())
    }

    /// Update a field. Editing after a successful submission starts over.
    pub fn set_field(&mut self, field: ContactField, value: impl Into<String>) {
        self.form.set_field(field, value);
        self.state.send_if_modified(|state| {
            let success = *state == SubmissionState::Success;
            if success {
                *state = SubmissionState::Idle;
            }
            success
        });
    }

    pub fn touch(&mut self, field: ContactField) {
        self.form.touch(field);
    }

    /// Clear the form and return to idle. A submission still in flight is
    /// superseded and its result will be ignored.
    pub fn reset(&mut self) {
        self.form.reset();
        self.generation += 1;
        self.state.send_replace(SubmissionState::Idle);
    }

    /// Start a submission of the current form.
    ///
    /// The loading state is entered and the request is spawned onto the
    /// Tokio runtime before this returns. An invalid form marks all fields
    /// touched and sends nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.is_in_flight() {
            debug!("Ignoring submit while a submission is in flight");
            return Err(SubmitError::InFlight);
        }

        let form = match self.form.validate() {
            Ok(form) => form,
            Err(errors) => {
                debug!("Contact form is invalid: {errors}");
                self.form.mark_all_touched();
                return Err(SubmitError::Invalid(errors));
            }
        };

        self.generation += 1;
        self.state.send_replace(SubmissionState::Loading);
        info!("Submitting contact form");

        let api = Arc::clone(&self.api);
        let request = tokio::spawn(async move { api.submit(&form).await });
        self.request = Some(request.abort_handle());

        Ok(PendingSubmission {
            generation: self.generation,
            request,
        })
    }

    /// Apply the outcome of a submission and return the new state.
    pub fn complete(&mut self, result: SubmissionResult) -> SubmissionState {
        if result.generation != self.generation || !self.state.borrow().is_loading() {
            debug!("Ignoring result of a superseded submission");
            return self.state();
        }

        let state = match result.outcome {
            Ok(()) => {
                info!("Contact form submitted");
                self.form.reset();
                SubmissionState::Success
            }
            Err(err) => SubmissionState::Error {
                message: err.message,
            },
        };

        self.state.send_replace(state.clone());
        state
    }

    /// Submit the form and wait for the outcome.
    pub async fn submit_and_wait(&mut self) -> Result<SubmissionState, SubmitError> {
        let result = self.submit()?.wait().await;
        Ok(self.complete(result))
    }
}

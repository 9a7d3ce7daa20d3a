use std::future::Future;

use nextform_models::contact::ContactFormData;
use thiserror::Error;

/// The backend endpoint receiving contact form submissions.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactApiService: Send + Sync + 'static {
    /// Send the form to the backend. Resolves to `Ok` on any 2xx response.
    fn submit(
        &self,
        form: &ContactFormData,
    ) -> impl Future<Output = Result<(), ContactApiError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactApiError {
    #[error("The contact endpoint responded with status {status}.")]
    Rejected {
        status: u16,
        /// Human-readable reason supplied by the server.
        detail: Option<String>,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactApiService {
    pub fn with_submit(
        mut self,
        form: ContactFormData,
        result: Result<(), ContactApiError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(mockall::predicate::eq(form))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}

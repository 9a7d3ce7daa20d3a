use nextform_extern_contracts::{ContactApiError, MockContactApiService};
use nextform_models::{
    contact::{ContactField, ContactFormData},
    submission::{SubmissionState, SUBMISSION_FALLBACK_ERROR},
};
use pretty_assertions::assert_eq;

use super::{fill, jane, Sut};
use crate::{form::FormModel, submitter::SubmitError};

#[tokio::test]
async fn ok() {
    // Arrange
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    // Act
    let pending = sut.submit().unwrap();
    let loading = sut.state();
    let result = pending.wait().await;
    let state = sut.complete(result);

    // Assert
    assert_eq!(loading, SubmissionState::Loading);
    assert_eq!(state, SubmissionState::Success);
    assert_eq!(sut.state(), SubmissionState::Success);
    assert_eq!(sut.form(), &FormModel::new());
}

#[tokio::test]
async fn loading_is_observable() {
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());
    let mut rx = sut.subscribe();

    let pending = sut.submit().unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), SubmissionState::Loading);
    assert!(!sut.can_submit());
    assert!(sut.view().to_string().contains("(disabled)"));

    let result = pending.wait().await;
    sut.complete(result);

    assert_eq!(*rx.borrow_and_update(), SubmissionState::Success);
    assert!(sut.can_submit());
}

#[tokio::test]
async fn invalid_form_sends_nothing() {
    for data in [
        ContactFormData::default(),
        ContactFormData {
            name: "J".into(),
            ..jane()
        },
        ContactFormData {
            surname: "D".into(),
            ..jane()
        },
        ContactFormData {
            email: "jane.example.com".into(),
            ..jane()
        },
        ContactFormData {
            message: "Too short".into(),
            ..jane()
        },
        ContactFormData {
            message: "".into(),
            ..jane()
        },
    ] {
        // Arrange
        let api = MockContactApiService::new();
        let mut sut = Sut::new(api);
        for field in ContactField::ALL {
            sut.set_field(field, data.get(field));
        }

        // Act
        let result = sut.submit();

        // Assert
        assert!(matches!(result, Err(SubmitError::Invalid(_))), "{result:?}");
        assert_eq!(sut.state(), SubmissionState::Idle);
        assert!(ContactField::ALL
            .into_iter()
            .all(|field| sut.form().is_touched(field)));
        assert_eq!(sut.form().values(), &data);
    }
}

#[tokio::test]
async fn rejected_with_detail() {
    // Arrange
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(ContactApiError::Rejected {
            status: 409,
            detail: Some("Email already used".into()),
        }),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    // Act
    let result = sut.submit_and_wait().await;

    // Assert
    assert_eq!(
        result.unwrap(),
        SubmissionState::Error {
            message: "Email already used".into()
        }
    );
    assert_eq!(sut.form().values(), &jane());
    assert!(sut.can_submit());
}

#[tokio::test]
async fn rejected_without_detail() {
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(ContactApiError::Rejected {
            status: 500,
            detail: None,
        }),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let result = sut.submit_and_wait().await;

    assert_eq!(
        result.unwrap(),
        SubmissionState::Error {
            message: SUBMISSION_FALLBACK_ERROR.into()
        }
    );
}

#[tokio::test]
async fn transport_failure() {
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(anyhow::anyhow!("connection refused").into()),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let result = sut.submit_and_wait().await;

    assert_eq!(
        result.unwrap(),
        SubmissionState::Error {
            message: "Failed to submit form. Please try again.".into()
        }
    );
    assert_eq!(sut.form().values(), &jane());
}

#[tokio::test]
async fn retry_after_error() {
    let mut api = MockContactApiService::new();
    let mut seq = mockall::Sequence::new();
    api.expect_submit()
        .once()
        .in_sequence(&mut seq)
        .return_once(|_| {
            Box::pin(std::future::ready(Err(ContactApiError::Rejected {
                status: 503,
                detail: None,
            })))
        });
    api.expect_submit()
        .once()
        .in_sequence(&mut seq)
        .with(mockall::predicate::eq(jane()))
        .return_once(|_| Box::pin(std::future::ready(Ok(()))));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let first = sut.submit_and_wait().await.unwrap();
    let retry = sut.submit().unwrap();
    assert_eq!(sut.state(), SubmissionState::Loading);
    let result = retry.wait().await;
    let second = sut.complete(result);

    assert!(matches!(first, SubmissionState::Error { .. }));
    assert_eq!(second, SubmissionState::Success);
}

#[tokio::test]
async fn no_second_submit_while_loading() {
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let pending = sut.submit().unwrap();
    let second = sut.submit();

    assert!(matches!(second, Err(SubmitError::InFlight)), "{second:?}");
    assert_eq!(sut.state(), SubmissionState::Loading);

    let result = pending.wait().await;
    assert_eq!(sut.complete(result), SubmissionState::Success);
}

#[tokio::test]
async fn edits_during_loading_are_kept_until_success() {
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let pending = sut.submit().unwrap();
    sut.set_field(ContactField::Message, "Something else entirely.");
    assert_eq!(sut.state(), SubmissionState::Loading);

    let result = pending.wait().await;
    sut.complete(result);

    assert_eq!(sut.form(), &FormModel::new());
}

#[tokio::test]
async fn reset_supersedes_pending_submission() {
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(ContactApiError::Rejected {
            status: 500,
            detail: Some("late".into()),
        }),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    let pending = sut.submit().unwrap();
    sut.reset();
    let result = pending.wait().await;
    let state = sut.complete(result);

    assert_eq!(state, SubmissionState::Idle);
    assert_eq!(sut.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn edit_after_success_returns_to_idle() {
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());
    sut.submit_and_wait().await.unwrap();

    sut.set_field(ContactField::Name, "John");

    assert_eq!(sut.state(), SubmissionState::Idle);
    assert_eq!(sut.form().value(ContactField::Name), "John");
}

#[tokio::test]
async fn edit_after_error_keeps_message() {
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(ContactApiError::Rejected {
            status: 409,
            detail: Some("Email already used".into()),
        }),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());
    sut.submit_and_wait().await.unwrap();

    sut.set_field(ContactField::Email, "john@example.com");

    assert_eq!(sut.state().error_message(), Some("Email already used"));
}

#[tokio::test]
async fn reset_after_success() {
    let api = MockContactApiService::new().with_submit(jane(), Ok(()));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());
    sut.submit_and_wait().await.unwrap();

    sut.reset();

    assert_eq!(sut.state(), SubmissionState::Idle);
    for field in ContactField::ALL {
        assert_eq!(sut.form().value(field), "");
        assert!(!sut.form().is_touched(field));
    }
}

#[tokio::test]
async fn reset_after_error() {
    let api = MockContactApiService::new().with_submit(
        jane(),
        Err(ContactApiError::Rejected {
            status: 500,
            detail: None,
        }),
    );
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());
    sut.submit_and_wait().await.unwrap();

    sut.reset();

    assert_eq!(sut.state(), SubmissionState::Idle);
    assert_eq!(sut.form(), &FormModel::new());
}

#[tokio::test]
async fn dropped_submission_is_still_sent() {
    // Arrange
    let mut api = MockContactApiService::new();
    api.expect_submit()
        .times(2)
        .with(mockall::predicate::eq(jane()))
        .returning(|_| Box::pin(std::future::ready(Ok(()))));
    let mut sut = Sut::new(api);
    fill(&mut sut, &jane());

    // Act
    drop(sut.submit().unwrap());
    for _ in 0..10 {
        if sut.can_submit() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let unblocked = sut.can_submit();
    let resubmit = sut.submit_and_wait().await;

    // Assert
    assert!(unblocked);
    assert_eq!(resubmit.unwrap(), SubmissionState::Success);
}

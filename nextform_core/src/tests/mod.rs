use nextform_extern_contracts::MockContactApiService;
use nextform_models::contact::{ContactField, ContactFormData};

use crate::submitter::ContactSubmitter;

mod submit;

type Sut = ContactSubmitter<MockContactApiService>;

fn jane() -> ContactFormData {
    ContactFormData {
        name: "Jane".into(),
        surname: "Doe".into(),
        email: "jane@example.com".into(),
        message: "Hello there, this is a test.".into(),
    }
}

/// Enter `data` into the form the way a user would.
fn fill(sut: &mut Sut, data: &ContactFormData) {
    for field in ContactField::ALL {
        sut.set_field(field, data.get(field));
        sut.touch(field);
    }
}

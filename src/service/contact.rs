//! Contact form

use super::Storefront;
use crate::domain::aggregates::NewContact;
use crate::error::ContactError;
use crate::validation::{CheckInput, ContactForm};

impl Storefront {
    /// Stores a contact-form message and returns its id.
    pub async fn submit_contact_form(&self, form: ContactForm) -> Result<i64, ContactError> {
        let form = form.normalized();
        form.check()?;

        let contact = NewContact { name: form.name, email: form.email, phone: form.phone, message: form.message };
        let id = self.db.contacts().insert(&contact).await.map_err(|e| {
            tracing::error!(error = %e, "Saving contact message failed");
            ContactError::Store(e)
        })?;
        tracing::info!(contact_id = id, "Contact message received");
        Ok(id)
    }
}

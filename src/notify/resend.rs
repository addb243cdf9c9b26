//! Resend-backed inquiry delivery.

use async_trait::async_trait;
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use tracing::{info, warn};

use super::{Inquiry, InquiryNotifier, NotifyError, render_inquiry_html};
use crate::config::NotifyConfig;

/// Sends inquiries from a verified sender to the fixed business recipient.
#[derive(Debug, Clone)]
pub struct ResendNotifier {
    api_key: String,
    from: String,
    to: String,
}

impl ResendNotifier {
    #[must_use]
    pub fn new(config: &NotifyConfig) -> Self {
        Self { api_key: config.api_key.clone(), from: config.from.clone(), to: config.to.clone() }
    }

    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.to
    }
}

#[async_trait]
impl InquiryNotifier for ResendNotifier {
    async fn send_inquiry(&self, inquiry: &Inquiry) -> Result<(), NotifyError> {
        let resend = Resend::new(&self.api_key);
        let to = [self.to.as_str()];
        let subject = inquiry.subject();
        let html = render_inquiry_html(inquiry);

        let email = CreateEmailBaseOptions::new(&self.from, to, &subject).with_html(&html);
        match resend.emails.send(email).await {
            Ok(_) => {
                info!(to = %self.to, count = inquiry.items.len(), "wishlist inquiry sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, to = %self.to, "wishlist inquiry delivery failed");
                Err(NotifyError::Delivery(e.to_string()))
            }
        }
    }
}

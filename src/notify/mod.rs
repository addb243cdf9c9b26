//! Wishlist inquiry notification.
//!
//! DESIGN
//! ======
//! A visitor sends their resolved wishlist plus contact details to the
//! business inbox. Composition (validation, HTML rendering) lives here and
//! is transport-free; delivery sits behind `InquiryNotifier` so the Resend
//! adapter can be swapped in tests. A failed send is reported to the caller
//! and never touches the wishlist itself.

pub mod resend;

use async_trait::async_trait;

use crate::catalog::ProductDetails;

pub use resend::ResendNotifier;

const INQUIRY_TEMPLATE: &str = include_str!("../../templates/wishlist_inquiry.html");

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("contact name is required")]
    MissingName,
    #[error("invalid email")]
    InvalidEmail,
    #[error("wishlist is empty")]
    EmptyWishlist,
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

/// A visitor's request for a consultation about their wishlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub event_date: Option<String>,
    pub message: Option<String>,
    pub items: Vec<ProductDetails>,
}

impl Inquiry {
    /// Trim and check the inquiry, normalizing the email address.
    pub fn validated(mut self) -> Result<Self, NotifyError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(NotifyError::MissingName);
        }
        self.email = normalize_email(&self.email).ok_or(NotifyError::InvalidEmail)?;
        self.phone = non_blank(self.phone);
        self.event_date = non_blank(self.event_date);
        self.message = non_blank(self.message);
        if self.items.is_empty() {
            return Err(NotifyError::EmptyWishlist);
        }
        Ok(self)
    }

    #[must_use]
    pub fn subject(&self) -> String {
        format!("Wishlist inquiry from {} ({} items)", self.name, self.items.len())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let mut parts = normalized.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(normalized)
}

/// Delivery channel for validated inquiries.
#[async_trait]
pub trait InquiryNotifier: Send + Sync {
    async fn send_inquiry(&self, inquiry: &Inquiry) -> Result<(), NotifyError>;
}

/// Render the business-facing HTML body for `inquiry`.
#[must_use]
pub fn render_inquiry_html(inquiry: &Inquiry) -> String {
    let items = inquiry
        .items
        .iter()
        .map(render_item)
        .collect::<Vec<_>>()
        .join("\n");
    let or_dash = |v: &Option<String>| v.as_deref().map_or_else(|| "-".to_owned(), escape_html);

    INQUIRY_TEMPLATE
        .replace("{{ITEMS}}", &items)
        .replace("{{ITEM_COUNT}}", &inquiry.items.len().to_string())
        .replace("{{NAME}}", &escape_html(&inquiry.name))
        .replace("{{EMAIL}}", &escape_html(&inquiry.email))
        .replace("{{PHONE}}", &or_dash(&inquiry.phone))
        .replace("{{EVENT_DATE}}", &or_dash(&inquiry.event_date))
        .replace("{{MESSAGE}}", &inquiry.message.as_deref().map(escape_html).unwrap_or_default())
}

fn render_item(item: &ProductDetails) -> String {
    let mut line = format!("      <li><strong>{}</strong>", escape_html(&item.name));
    if let Some(subtitle) = &item.subtitle {
        line.push_str(&format!(" &middot; {}", escape_html(subtitle)));
    }
    if let Some(quantity) = item.quantity {
        line.push_str(&format!(" &middot; qty {quantity}"));
    }
    if let Some(dimensions) = &item.dimensions {
        line.push_str(&format!(" &middot; {}", escape_html(dimensions)));
    }
    line.push_str(&format!(" <small>({})</small></li>", escape_html(&item.id)));
    line
}

// Braces are escaped too so visitor text can never form a template placeholder.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;

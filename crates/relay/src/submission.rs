use maud::html;
use serde::Deserialize;

use crate::error::{RelayError, RelayResult};

/// Raw contact form payload as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A submission whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEnquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    pub fn validate(self) -> RelayResult<ContactEnquiry> {
        let required = |value: Option<String>, field: &'static str| {
            value
                .filter(|value| !value.is_empty())
                .ok_or(RelayError::MissingField(field))
        };

        Ok(ContactEnquiry {
            name: required(self.name, "name")?,
            email: required(self.email, "email")?,
            phone: self.phone.filter(|phone| !phone.is_empty()),
            message: required(self.message, "message")?,
        })
    }
}

impl ContactEnquiry {
    /// HTML body for the notification email. Submitted text is escaped.
    pub fn html_body(&self) -> String {
        html! {
            h2 { "New Contact Enquiry" }
            p { strong { "Name:" } " " (self.name) }
            p { strong { "Email:" } " " (self.email) }
            @if let Some(phone) = &self.phone {
                p { strong { "Phone:" } " " (phone) }
            }
            p { strong { "Message:" } }
            p { (self.message) }
        }
        .into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, email: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: None,
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn empty_or_absent_fields_are_missing() {
        let err = submission("", "a@b.com", "hi").validate().unwrap_err();
        assert!(matches!(err, RelayError::MissingField("name")));

        let mut absent = submission("Ann", "a@b.com", "hi");
        absent.message = None;
        assert!(matches!(
            absent.validate().unwrap_err(),
            RelayError::MissingField("message")
        ));
    }

    #[test]
    fn blank_phone_is_dropped() {
        let mut raw = submission("Ann", "a@b.com", "hi");
        raw.phone = Some(String::new());
        assert_eq!(raw.validate().unwrap().phone, None);
    }

    #[test]
    fn html_body_escapes_markup() {
        let mut raw = submission("<b>Ann</b>", "a@b.com", "screen <cracked> & dead");
        raw.phone = Some("+44 7700 900123".to_string());
        let body = raw.validate().unwrap().html_body();

        assert!(body.contains("<h2>New Contact Enquiry</h2>"));
        assert!(body.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(body.contains("screen &lt;cracked&gt; &amp; dead"));
        assert!(body.contains("<strong>Phone:</strong> +44 7700 900123"));
    }

    #[test]
    fn phone_paragraph_only_when_present() {
        let body = submission("Ann", "a@b.com", "hi").validate().unwrap().html_body();
        assert!(!body.contains("Phone:"));
    }
}

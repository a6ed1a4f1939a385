use std::sync::Arc;

use tracing::info;

use crate::error::Error;
use crate::storage::LocalStorage;
use crate::violations::Violations;

pub const PARTNER_FORM_URL_KEY: &str = "clickup-form-url";

/// Site settings the admin edits outside of the content tables.
#[derive(Clone, Debug)]
pub struct Settings {
    storage: Arc<LocalStorage>,
}

impl Settings {
    pub fn new(storage: Arc<LocalStorage>) -> Settings {
        Settings { storage }
    }

    pub fn partner_form_url(&self) -> String {
        self.storage.get(PARTNER_FORM_URL_KEY).unwrap_or_default()
    }

    /// An empty value clears the form link.
    #[tracing::instrument(skip(self))]
    pub fn set_partner_form_url(&self, url: &str) -> Result<(), Error> {
        let url = url.trim();

        let mut violations = Violations::new();
        violations.optional_url("partnerFormUrl", url);
        violations.into_result()?;

        self.storage.set(PARTNER_FORM_URL_KEY, url)?;
        info!("partner form url saved");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violations::Violation;

    fn settings() -> Settings {
        Settings::new(Arc::new(LocalStorage::in_memory()))
    }

    #[test]
    fn url_is_saved_and_can_be_cleared() {
        let settings = settings();
        assert_eq!(settings.partner_form_url(), "");

        settings
            .set_partner_form_url("https://forms.clickup.com/123/f/abc")
            .unwrap();
        assert_eq!(
            settings.partner_form_url(),
            "https://forms.clickup.com/123/f/abc"
        );

        settings.set_partner_form_url("").unwrap();
        assert_eq!(settings.partner_form_url(), "");
    }

    #[test]
    fn malformed_url_is_not_saved() {
        let settings = settings();

        assert_eq!(
            settings.set_partner_form_url("not-a-url").unwrap_err(),
            Error::ValidationFailed {
                violations: vec![Violation::MalformedUrl {
                    field: "partnerFormUrl".into(),
                    value: "not-a-url".into(),
                }]
            }
        );
        assert_eq!(settings.partner_form_url(), "");
    }
}

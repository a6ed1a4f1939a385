use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Violation {
    FieldRequired {
        field: String,
    },
    FieldTooShort {
        field: String,
        minimum_length: usize,
        length: usize,
    },
    MalformedUrl {
        field: String,
        value: String,
    },
    MalformedEmail {
        field: String,
        value: String,
    },
    DuplicateId {
        id: String,
    },
}

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(http|https)://[^ "]+(\.[a-z]{2,}|\d+)([^\s"]*)?$"#)
        .expect("image url pattern is valid")
});

/// Collects violations across the fields of a form so every problem is
/// reported at once instead of one per submission.
#[derive(Debug, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Violations {
        Violations(vec![])
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        }
        self
    }

    pub fn min_length(&mut self, field: &str, value: &str, minimum_length: usize) -> &mut Self {
        let length = value.trim().chars().count();
        if length == 0 {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        } else if length < minimum_length {
            self.push(Violation::FieldTooShort {
                field: field.to_string(),
                minimum_length,
                length,
            });
        }
        self
    }

    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        } else if !is_well_formed_url(value) {
            self.push(malformed_url(field, value));
        }
        self
    }

    pub fn image_url(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        } else if !IMAGE_URL.is_match(value) {
            self.push(malformed_url(field, value));
        }
        self
    }

    /// Accepts absolute URLs as well as paths served by the site itself.
    pub fn url_or_site_path(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        } else if !is_site_path(value) && !is_well_formed_url(value) {
            self.push(malformed_url(field, value));
        }
        self
    }

    pub fn optional_url(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.is_empty() && !is_well_formed_url(value) {
            self.push(malformed_url(field, value));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(Violation::FieldRequired {
                field: field.to_string(),
            });
        } else if !value.contains('@') {
            self.push(Violation::MalformedEmail {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed { violations: self.0 })
        }
    }
}

fn malformed_url(field: &str, value: &str) -> Violation {
    Violation::MalformedUrl {
        field: field.to_string(),
        value: value.to_string(),
    }
}

pub fn is_well_formed_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => !url.cannot_be_a_base(),
        Err(_) => false,
    }
}

fn is_site_path(value: &str) -> bool {
    value.starts_with('/') && !value.starts_with("//") && !value.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_url_is_rejected_everywhere() {
        let mut violations = Violations::new();
        violations
            .url("url", "not-a-url")
            .image_url("imageUrl", "not-a-url")
            .url_or_site_path("logoUrl", "not-a-url")
            .optional_url("partnerFormUrl", "not-a-url");

        assert_eq!(violations.0.len(), 4);
        assert!(violations
            .0
            .iter()
            .all(|v| matches!(v, Violation::MalformedUrl { .. })));
    }

    #[test]
    fn image_urls_follow_the_image_link_pattern() {
        assert!(IMAGE_URL.is_match("https://i.imgur.com/eKGLi9U.jpeg"));
        assert!(IMAGE_URL.is_match("http://192.168.0.1"));
        assert!(!IMAGE_URL.is_match("ftp://example.com/image.png"));
        assert!(!IMAGE_URL.is_match("https://exa mple.com/image.png"));
    }

    #[test]
    fn site_paths_are_accepted_for_logos() {
        let mut violations = Violations::new();
        violations.url_or_site_path("logoUrl", "/uploads/logo.png");
        assert!(violations.is_empty());

        violations.url_or_site_path("logoUrl", "//evil.example.com/logo.png");
        assert!(!violations.is_empty());
    }

    #[test]
    fn short_and_empty_values_are_distinguished() {
        let mut violations = Violations::new();
        violations.min_length("title", "P", 2).min_length("other", "   ", 2);

        assert_eq!(
            violations.0,
            vec![
                Violation::FieldTooShort {
                    field: "title".into(),
                    minimum_length: 2,
                    length: 1,
                },
                Violation::FieldRequired {
                    field: "other".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_optional_url_is_allowed() {
        let mut violations = Violations::new();
        violations
            .optional_url("partnerFormUrl", "")
            .optional_url("partnerFormUrl", "https://forms.clickup.com/1/f/abc");
        assert!(violations.into_result().is_ok());
    }

    #[test]
    fn emails_need_an_at_sign() {
        let mut violations = Violations::new();
        violations.email("email", "admin.example.com");
        assert!(matches!(
            violations.into_result(),
            Err(Error::ValidationFailed { .. })
        ));
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use tracing::{debug, info};

use crate::error::Error;
use crate::storage::LocalStorage;
use crate::violations::Violations;

pub const AUTH_KEY: &str = "admin-auth";
pub const EMAIL_KEY: &str = "admin-email";
pub const USERS_KEY: &str = "admin-users";
pub const CREDENTIALS_KEY: &str = "admin-credentials";

const MINIMUM_PASSWORD_LENGTH: usize = 6;

type Credentials = BTreeMap<String, String>;

/// The admin login state, kept as plain flags in local storage.
#[derive(Clone, Debug)]
pub struct Session {
    storage: Arc<LocalStorage>,
}

impl Session {
    pub fn new(storage: Arc<LocalStorage>) -> Session {
        Session { storage }
    }

    pub fn guard(&self) -> bool {
        self.storage.get(AUTH_KEY).as_deref() == Some("true")
    }

    pub fn email(&self) -> Option<String> {
        self.storage.get(EMAIL_KEY)
    }

    #[tracing::instrument(skip(self, password))]
    pub fn login(&self, email: &str, password: &str) -> Result<(), Error> {
        let mut violations = Violations::new();
        violations
            .email("email", email)
            .required("password", password);
        violations.into_result()?;

        let credentials = self.credentials()?;
        if credentials.get(email).map(String::as_str) != Some(password) {
            debug!("rejected login");
            return Err(Error::InvalidCredentials);
        }

        self.storage.set(AUTH_KEY, "true")?;
        self.storage.set(EMAIL_KEY, email)?;
        info!("admin logged in");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn logout(&self) -> Result<(), Error> {
        self.storage.remove(AUTH_KEY)?;
        self.storage.remove(EMAIL_KEY)?;

        Ok(())
    }

    pub fn admins(&self) -> Result<Vec<String>, Error> {
        match self.storage.get_json(USERS_KEY)? {
            Some(admins) => Ok(admins),
            None => Ok(self.email().into_iter().collect()),
        }
    }

    #[tracing::instrument(skip(self, password))]
    pub fn add_admin(&self, email: &str, password: &str) -> Result<Vec<String>, Error> {
        let mut violations = Violations::new();
        violations
            .email("email", email)
            .min_length("password", password, MINIMUM_PASSWORD_LENGTH);
        violations.into_result()?;

        let mut credentials = self.credentials()?;
        credentials.insert(email.to_string(), password.to_string());
        self.storage.set_json(CREDENTIALS_KEY, &credentials)?;

        let mut admins = self.admins()?;
        if !admins.iter().any(|admin| admin == email) {
            admins.push(email.to_string());
        }
        self.storage.set_json(USERS_KEY, &admins)?;

        Ok(admins)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_admin(&self, email: &str) -> Result<Vec<String>, Error> {
        if self.email().as_deref() == Some(email) {
            return Err(Error::CannotRemoveCurrentAdmin {
                email: email.to_string(),
            });
        }

        let mut credentials = self.credentials()?;
        credentials.remove(email);
        self.storage.set_json(CREDENTIALS_KEY, &credentials)?;

        let mut admins = self.admins()?;
        admins.retain(|admin| admin != email);
        self.storage.set_json(USERS_KEY, &admins)?;

        Ok(admins)
    }

    /// Makes sure the configured admin can log in. Existing credentials for
    /// that email are left untouched.
    #[tracing::instrument(skip(self, password))]
    pub fn ensure_admin(&self, email: &str, password: &str) -> Result<(), Error> {
        let credentials = self.credentials()?;
        if credentials.contains_key(email) {
            return Ok(());
        }

        info!("adding bootstrap admin");
        self.add_admin(email, password)?;

        Ok(())
    }

    fn credentials(&self) -> Result<Credentials, Error> {
        Ok(self
            .storage
            .get_json(CREDENTIALS_KEY)?
            .unwrap_or_default())
    }
}

/// Extracting this from a request fails with a redirect to the login page
/// unless an admin is logged in.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub email: Option<String>,
}

impl FromRequest for AdminSession {
    type Error = Error;
    type Future = Ready<Result<AdminSession, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(check_session(req))
    }
}

fn check_session(req: &HttpRequest) -> Result<AdminSession, Error> {
    let session = req
        .app_data::<Data<Session>>()
        .ok_or_else(|| Error::ExistentialState("no session storage configured".into()))?;

    if !session.guard() {
        debug!(path = %req.path(), "no admin session");
        return Err(Error::SessionRequired);
    }

    Ok(AdminSession {
        email: session.email(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use crate::violations::Violation;

    fn session() -> Session {
        let session = Session::new(Arc::new(LocalStorage::in_memory()));
        session.ensure_admin("admin@example.com", "secret123").unwrap();
        session
    }

    #[test]
    fn login_sets_the_session_flag() {
        let session = session();
        assert!(!session.guard());

        session.login("admin@example.com", "secret123").unwrap();
        assert!(session.guard());
        assert_eq!(session.email().as_deref(), Some("admin@example.com"));

        session.logout().unwrap();
        assert!(!session.guard());
        assert_eq!(session.email(), None);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let session = session();

        assert_eq!(
            session.login("admin@example.com", "nope").unwrap_err(),
            Error::InvalidCredentials
        );
        assert!(!session.guard());
    }

    #[test]
    fn malformed_email_is_a_violation() {
        let session = session();

        assert_eq!(
            session.login("admin", "secret123").unwrap_err(),
            Error::ValidationFailed {
                violations: vec![Violation::MalformedEmail {
                    field: "email".into(),
                    value: "admin".into(),
                }]
            }
        );
    }

    #[test]
    fn admins_can_be_added_but_not_remove_themselves() {
        let session = session();
        session.login("admin@example.com", "secret123").unwrap();

        assert!(session.add_admin("editor@example.com", "short").is_err());
        let admins = session.add_admin("editor@example.com", "longenough").unwrap();
        assert_eq!(admins, vec!["admin@example.com", "editor@example.com"]);
        session.login("editor@example.com", "longenough").unwrap();

        assert_eq!(
            session.remove_admin("editor@example.com").unwrap_err(),
            Error::CannotRemoveCurrentAdmin {
                email: "editor@example.com".into()
            }
        );
        let admins = session.remove_admin("admin@example.com").unwrap();
        assert_eq!(admins, vec!["editor@example.com"]);
        assert_eq!(
            session.login("admin@example.com", "secret123").unwrap_err(),
            Error::InvalidCredentials
        );
    }

    #[test]
    fn admins_fall_back_to_the_current_email() {
        let storage = Arc::new(LocalStorage::in_memory());
        storage.set(EMAIL_KEY, "admin@example.com").unwrap();
        let session = Session::new(storage);

        assert_eq!(session.admins().unwrap(), vec!["admin@example.com"]);
    }

    #[actix_web::test]
    async fn extractor_requires_a_session() {
        let session = session();
        let req = TestRequest::default()
            .app_data(Data::new(session.clone()))
            .to_http_request();

        assert_eq!(
            AdminSession::extract(&req).await.unwrap_err(),
            Error::SessionRequired
        );

        session.login("admin@example.com", "secret123").unwrap();
        let admin = AdminSession::extract(&req).await.unwrap();
        assert_eq!(admin.email.as_deref(), Some("admin@example.com"));
    }
}

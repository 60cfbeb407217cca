//! Credential variants behind login.
//!
//! An account authenticates either with a local password hash or with the
//! subject id asserted by Google. Both paths dispatch through the same
//! [`Credential::authenticate`] call so handlers never branch on how an
//! account was created.

use super::password;

#[derive(Debug)]
pub(super) enum Credential {
    Local { password_hash: String },
    External { provider_id: String },
}

/// Proof presented by the caller.
#[derive(Debug)]
pub(super) enum AuthAttempt<'a> {
    Password(&'a str),
    Provider(&'a str),
}

impl Credential {
    /// Pick the credential stored on an account row.
    /// Accounts carry exactly one of the two columns; a local password hash
    /// wins if a row ever ends up with both.
    pub(super) fn from_columns(
        password_hash: Option<String>,
        google_id: Option<String>,
    ) -> Option<Self> {
        if let Some(password_hash) = password_hash {
            return Some(Self::Local { password_hash });
        }
        google_id.map(|provider_id| Self::External { provider_id })
    }

    /// Check an attempt against this credential. Mismatched kinds (a password
    /// against an OAuth-only account, or vice versa) never authenticate.
    pub(super) fn authenticate(&self, attempt: &AuthAttempt<'_>) -> bool {
        match (self, attempt) {
            (Self::Local { password_hash }, AuthAttempt::Password(plain)) => {
                password::verify_password(plain, password_hash)
            }
            (Self::External { provider_id }, AuthAttempt::Provider(subject)) => {
                provider_id == subject
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_credential_verifies_password() {
        let hash = password::hash_password("hunter2").expect("hashing should succeed");
        let credential = Credential::from_columns(Some(hash), None).expect("credential");
        assert!(credential.authenticate(&AuthAttempt::Password("hunter2")));
        assert!(!credential.authenticate(&AuthAttempt::Password("wrong")));
    }

    #[test]
    fn external_credential_matches_subject() {
        let credential =
            Credential::from_columns(None, Some("google-subject-1".to_string())).expect("credential");
        assert!(credential.authenticate(&AuthAttempt::Provider("google-subject-1")));
        assert!(!credential.authenticate(&AuthAttempt::Provider("google-subject-2")));
    }

    #[test]
    fn mismatched_kinds_never_authenticate() {
        let hash = password::hash_password("hunter2").expect("hashing should succeed");
        let local = Credential::from_columns(Some(hash), None).expect("credential");
        let external =
            Credential::from_columns(None, Some("google-subject-1".to_string())).expect("credential");

        assert!(!local.authenticate(&AuthAttempt::Provider("google-subject-1")));
        assert!(!external.authenticate(&AuthAttempt::Password("hunter2")));
    }

    #[test]
    fn from_columns_prefers_local_and_handles_empty_rows() {
        let hash = password::hash_password("hunter2").expect("hashing should succeed");
        let both = Credential::from_columns(Some(hash), Some("google-subject-1".to_string()));
        assert!(matches!(both, Some(Credential::Local { .. })));
        assert!(Credential::from_columns(None, None).is_none());
    }
}

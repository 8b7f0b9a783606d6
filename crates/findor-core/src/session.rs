/// What the identity provider tells us about the current user.
///
/// The dashboard performs no authentication itself; it only needs to know
/// whether someone is signed in and which email to correlate keys with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    email: Option<String>,
}

impl Session {
    pub fn signed_in(email: impl Into<String>) -> Self {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Self::signed_out();
        }
        Self { email: Some(email) }
    }

    pub fn signed_out() -> Self {
        Self { email: None }
    }

    pub fn from_optional(email: Option<String>) -> Self {
        email.map(Self::signed_in).unwrap_or_default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.email.is_some()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_signed_out() {
        assert!(!Session::signed_in("   ").is_signed_in());
        assert!(!Session::from_optional(Some(String::new())).is_signed_in());
        assert!(!Session::from_optional(None).is_signed_in());
    }

    #[test]
    fn email_is_trimmed() {
        let session = Session::signed_in(" a@x.com ");
        assert!(session.is_signed_in());
        assert_eq!(session.email(), Some("a@x.com"));
    }
}

//! Recipients and senders.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use lettre::message::Mailbox;

use crate::error::BuildError;

/// A recipient (to, cc, or bcc) or a sender.
///
/// Identity is the email address, compared ASCII-case-insensitively. The
/// display name is presentation only: two contacts with the same address and
/// different display names are equal, hash identically, and order the same.
#[derive(Debug, Clone)]
pub struct Contact {
    email: String,
    display_name: Option<String>,
}

impl Contact {
    /// A contact with no display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }

    /// A contact with a display name.
    pub fn with_display_name(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: Some(display_name.into()),
        }
    }

    /// The email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Convert to a transport mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidMessage`] when the address is malformed.
    pub fn mailbox(&self) -> Result<Mailbox, BuildError> {
        let address = self.email.parse::<lettre::Address>()?;
        Ok(Mailbox::new(self.display_name.clone(), address))
    }

    fn folded_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.email.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.email.eq_ignore_ascii_case(&other.email)
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.folded_bytes() {
            state.write_u8(byte);
        }
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded_bytes().cmp(other.folded_bytes())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn equality_ignores_display_name() {
        let plain = Contact::new("user@example.com");
        let named = Contact::with_display_name("user@example.com", "A User");
        assert_eq!(plain, named);
        assert_eq!(plain.cmp(&named), Ordering::Equal);
    }

    #[test]
    fn equality_ignores_address_case() {
        let lower = Contact::new("user@example.com");
        let upper = Contact::with_display_name("USER@EXAMPLE.COM", "Shouting");
        assert_eq!(lower, upper);
        assert_eq!(lower.cmp(&upper), Ordering::Equal);
    }

    #[test]
    fn distinct_addresses_are_ordered() {
        let a = Contact::new("a@example.com");
        let b = Contact::new("b@example.com");
        assert_ne!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn set_deduplicates_by_address() {
        let mut set = BTreeSet::new();
        set.insert(Contact::new("user@example.com"));
        set.insert(Contact::with_display_name("User@Example.Com", "Dup"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn mailbox_carries_display_name() {
        let contact = Contact::with_display_name("user@example.com", "A User");
        let mailbox = contact.mailbox().expect("valid address");
        assert_eq!(mailbox.name.as_deref(), Some("A User"));
        assert_eq!(mailbox.email.to_string(), "user@example.com");
    }

    #[test]
    fn malformed_address_fails_conversion() {
        let contact = Contact::new("no-at-sign");
        assert!(matches!(
            contact.mailbox(),
            Err(BuildError::InvalidMessage(_))
        ));
    }
}

//! Account model
//!
//! Row model for stored accounts plus the validated holder identity pair
//! and the creation draft handed to the store. Validation happens at
//! construction time, so a blank or oversized holder name cannot reach
//! the database.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

/// Maximum holder name length (matches the column width)
const MAX_NAME_LEN: usize = 150;

/// A stored bank account.
///
/// `id` is assigned by the store and immutable, as is `created_at`.
/// `balance` only changes through updates and transfers.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub balance: f64,
    pub gold_member: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated (first name, last name) identity pair.
///
/// Two accounts may never share the same pair; the store enforces this
/// with a uniqueness check and constraint.
///
/// # Invariants
/// - Neither name is blank
/// - Neither name exceeds 150 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    first_name: String,
    last_name: String,
}

/// Errors that can occur when creating a Holder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HolderError {
    #[error("Holder name must not be blank")]
    Blank,

    #[error("Holder name exceeds {MAX_NAME_LEN} characters (got {0})")]
    TooLong(usize),
}

impl Holder {
    /// Create a new Holder with validation.
    ///
    /// # Errors
    /// - `HolderError::Blank` if either name is empty or whitespace-only
    /// - `HolderError::TooLong` if either name exceeds 150 characters
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, HolderError> {
        let first_name = first_name.into();
        let last_name = last_name.into();

        for name in [&first_name, &last_name] {
            validate_name(name)?;
        }

        Ok(Self {
            first_name,
            last_name,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Creation draft for an account that does not exist yet.
///
/// Balance starts at zero, the gold flag unset, the account number
/// randomized and `created_at` stamped now; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub holder: Holder,
    pub number: i64,
    pub balance: f64,
    pub gold_member: bool,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Open a fresh draft for the given holder.
    pub fn open(holder: Holder) -> Self {
        Self {
            holder,
            number: random_account_number(),
            balance: 0.0,
            gold_member: false,
            created_at: Utc::now(),
        }
    }

    /// Re-roll the account number after a uniqueness collision.
    pub fn with_fresh_number(mut self) -> Self {
        self.number = random_account_number();
        self
    }
}

/// Partial update of an account's profile fields.
///
/// Only holder names and the gold flag move through a patch; balances
/// change only through transfers.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gold_member: Option<bool>,
}

impl AccountPatch {
    /// Validate the supplied names.
    ///
    /// Each name is checked on its own; stored names passed the same
    /// rule at creation, so a valid patch merged into a stored account
    /// yields a valid holder pair.
    pub fn validate(&self) -> Result<(), HolderError> {
        if let Some(ref name) = self.first_name {
            validate_name(name)?;
        }
        if let Some(ref name) = self.last_name {
            validate_name(name)?;
        }
        Ok(())
    }

    /// Overwrite the supplied fields on the account.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(ref first_name) = self.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(gold_member) = self.gold_member {
            account.gold_member = gold_member;
        }
    }
}

/// Shared name rule for holders and profile patches.
fn validate_name(name: &str) -> Result<(), HolderError> {
    if name.trim().is_empty() {
        return Err(HolderError::Blank);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(HolderError::TooLong(len));
    }
    Ok(())
}

/// Random positive account number. Uniqueness across accounts is the
/// store's job; the draft only guarantees a positive 63-bit value.
fn random_account_number() -> i64 {
    rand::thread_rng().gen_range(1..i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_valid() {
        let holder = Holder::new("Jane", "Doe").unwrap();
        assert_eq!(holder.first_name(), "Jane");
        assert_eq!(holder.last_name(), "Doe");
        assert_eq!(holder.to_string(), "Jane Doe");
    }

    #[test]
    fn test_holder_blank_rejected() {
        assert_eq!(Holder::new("", "Doe"), Err(HolderError::Blank));
        assert_eq!(Holder::new("Jane", "   "), Err(HolderError::Blank));
    }

    #[test]
    fn test_holder_too_long_rejected() {
        let long = "x".repeat(151);
        assert_eq!(Holder::new(long, "Doe"), Err(HolderError::TooLong(151)));
    }

    #[test]
    fn test_holder_max_length_ok() {
        let max = "x".repeat(150);
        assert!(Holder::new("Jane", max).is_ok());
    }

    #[test]
    fn test_new_account_starts_empty() {
        let draft = NewAccount::open(Holder::new("Jane", "Doe").unwrap());
        assert_eq!(draft.balance, 0.0);
        assert!(!draft.gold_member);
        assert!(draft.number >= 1);
        assert!(draft.created_at <= Utc::now());
    }

    #[test]
    fn test_fresh_number_rerolls() {
        let draft = NewAccount::open(Holder::new("Jane", "Doe").unwrap());
        let before = draft.number;
        let draft = draft.with_fresh_number();
        // 63-bit space; a repeat would be a generator bug
        assert_ne!(draft.number, before);
        assert!(draft.number >= 1);
    }

    #[test]
    fn test_patch_applies_only_supplied_fields() {
        let mut account = Account {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            number: 42,
            balance: 80.0,
            gold_member: false,
            created_at: Utc::now(),
        };

        let patch = AccountPatch {
            gold_member: Some(true),
            ..Default::default()
        };
        patch.apply_to(&mut account);
        assert!(account.gold_member);
        assert_eq!(account.first_name, "Jane");
        assert_eq!(account.last_name, "Doe");
        assert_eq!(account.balance, 80.0);

        let patch = AccountPatch {
            first_name: Some("Janet".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut account);
        assert_eq!(account.first_name, "Janet");
        assert!(account.gold_member);
    }

    #[test]
    fn test_patch_validates_supplied_names() {
        assert!(AccountPatch::default().validate().is_ok());

        let patch = AccountPatch {
            last_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(HolderError::Blank));

        let patch = AccountPatch {
            first_name: Some("x".repeat(151)),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(HolderError::TooLong(151)));
    }
}

//! Password hashing behind a swappable trait.

use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "pbkdf2-sha256";
const DIGEST_LEN: usize = 32;

/// Rounds used for newly hashed passwords in production.
pub const DEFAULT_ROUNDS: u32 = 210_000;

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// PBKDF2-HMAC-SHA256, stored as `pbkdf2-sha256$<rounds>$<salt>$<hex digest>`.
///
/// The round count is read back from the stored hash, so raising
/// [`DEFAULT_ROUNDS`] keeps existing hashes verifiable.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2PasswordHasher {
    rounds: u32,
}

impl Default for Pbkdf2PasswordHasher {
    fn default() -> Self {
        Self::with_rounds(DEFAULT_ROUNDS)
    }
}

impl Pbkdf2PasswordHasher {
    /// Low round counts are only meant for tests and throwaway stores.
    pub fn with_rounds(rounds: u32) -> Self {
        Self { rounds: rounds.max(1) }
    }

    fn derive(password: &str, salt: &str, rounds: u32) -> [u8; DIGEST_LEN] {
        let mut out = [0u8; DIGEST_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut out);
        out
    }
}

impl PasswordHasher for Pbkdf2PasswordHasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::derive(password, &salt, self.rounds);
        format!("{SCHEME}${}${salt}${}", self.rounds, hex::encode(digest))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.splitn(4, '$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(rounds) = rounds.parse::<u32>() else {
            return false;
        };
        let Ok(expected) = hex::decode(expected) else {
            return false;
        };
        if rounds == 0 || expected.len() != DIGEST_LEN {
            return false;
        }

        let actual = Self::derive(password, salt, rounds);
        actual[..].ct_eq(&expected[..]).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast() -> Pbkdf2PasswordHasher {
        Pbkdf2PasswordHasher::with_rounds(16)
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = fast();
        let a = hasher.hash("secret");
        let b = hasher.hash("secret");
        assert_ne!(a, b);
        assert!(a.starts_with("pbkdf2-sha256$16$"));
        assert!(hasher.verify("secret", &a));
        assert!(hasher.verify("secret", &b));
    }

    #[test]
    fn rounds_come_from_the_stored_hash() {
        let stored = Pbkdf2PasswordHasher::with_rounds(8).hash("secret");
        assert!(fast().verify("secret", &stored));
        assert!(Pbkdf2PasswordHasher::default().verify("secret", &stored));
    }

    #[test]
    fn default_uses_the_production_round_count() {
        assert_eq!(Pbkdf2PasswordHasher::default().rounds, DEFAULT_ROUNDS);
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let hasher = fast();
        assert!(!hasher.verify("secret", ""));
        assert!(!hasher.verify("secret", "md5$abc$def"));
        assert!(!hasher.verify("secret", "sha256$salt$digest"));
        assert!(!hasher.verify("secret", "pbkdf2-sha256$0$salt$00"));
        assert!(!hasher.verify("secret", "pbkdf2-sha256$16$salt$not-hex"));
        assert!(!hasher.verify("secret", "pbkdf2-sha256$16$salt$abcd"));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn wrong_password_fails(password in "[a-z]{1,16}", other in "[A-Z]{1,16}") {
            let hasher = fast();
            let stored = hasher.hash(&password);
            prop_assert!(hasher.verify(&password, &stored));
            prop_assert!(!hasher.verify(&other, &stored));
        }
    }
}

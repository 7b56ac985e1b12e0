//! Argon2 credential hashing. Stored hashes are PHC strings.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// Well-formed PHC string with the default Argon2 parameters that no password
/// matches. Login verifies against it when the account is unknown so both
/// rejection paths cost one full hash.
pub const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// Returns false for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let phc = hash_password("password123").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "password123"));
        assert!(!verify_password(&phc, "password124"));
    }

    #[test]
    fn unknown_account_hash_does_real_work() {
        let parsed = PasswordHash::new(UNKNOWN_ACCOUNT_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(parsed.hash.is_some());
        assert!(!verify_password(UNKNOWN_ACCOUNT_HASH, "password123"));
        assert!(!verify_password(UNKNOWN_ACCOUNT_HASH, ""));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "password123"));
        assert!(!verify_password("", ""));
    }
}

//! Password hashing and validation.
//!
//! Secure password hashing with Argon2id plus the registration password
//! policy (minimum length and character-class requirements).

use crate::error::{FieldError, LockgateError, Result};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

/// Configuration for password hashing.
#[derive(Clone, Debug)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Create a new password config with custom settings.
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Faster settings for development/testing (NOT for production).
    #[cfg(any(test, debug_assertions))]
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Handles password hashing and verification using Argon2id.
///
/// Hashing happens exactly once per stored credential, at registration and
/// at password reset; an already-hashed value is never re-hashed.
#[derive(Clone)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

impl PasswordHasher {
    /// Create a new password hasher with the given configuration.
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password using Argon2id.
    ///
    /// Returns the PHC-formatted hash string (includes algorithm, params,
    /// salt, and hash). Each call generates a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = self.build_argon2()?;

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LockgateError::internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash.
    ///
    /// Uses constant-time comparison to prevent timing attacks.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            LockgateError::internal(format!("Invalid password hash format: {}", e))
        })?;

        // Argon2 verify is already constant-time
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn build_argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None, // Default output length (32 bytes)
        )
        .map_err(|e| LockgateError::internal(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Password strength validation policy.
#[derive(Clone, Debug)]
pub struct PasswordPolicy {
    /// Minimum length (default: 6)
    pub min_length: usize,
    /// Require at least one uppercase letter
    pub require_uppercase: bool,
    /// Require at least one lowercase letter
    pub require_lowercase: bool,
    /// Require at least one digit
    pub require_digit: bool,
    /// Maximum length (default: 128, prevents DoS)
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl PasswordPolicy {
    /// The registration policy: at least 6 characters with one uppercase,
    /// one lowercase, and one digit.
    pub fn standard() -> Self {
        Self {
            min_length: 6,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            max_length: 128,
        }
    }

    /// Set minimum password length.
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Set maximum password length.
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Validate a password against the policy.
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self, password: &str) -> Vec<PasswordError> {
        let mut errors = Vec::new();

        if password.chars().count() < self.min_length {
            errors.push(PasswordError::TooShort {
                min: self.min_length,
            });
        }

        if password.chars().count() > self.max_length {
            errors.push(PasswordError::TooLong {
                max: self.max_length,
            });
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push(PasswordError::MissingUppercase);
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push(PasswordError::MissingLowercase);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(PasswordError::MissingDigit);
        }

        errors
    }

    /// Check if password is valid (no errors).
    pub fn is_valid(&self, password: &str) -> bool {
        self.validate(password).is_empty()
    }

    /// Validate, mapping violations to field errors on `password`.
    pub fn field_errors(&self, password: &str) -> Vec<FieldError> {
        self.validate(password)
            .into_iter()
            .map(|e| FieldError::new("password", format!("Password {}", e.message())))
            .collect()
    }

    /// Validate and return Result for easy use in flows.
    pub fn check(&self, password: &str) -> Result<()> {
        let errors = self.field_errors(password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LockgateError::Validation(errors))
        }
    }
}

/// Password validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password is too short.
    TooShort { min: usize },
    /// Password is too long.
    TooLong { max: usize },
    /// Password is missing an uppercase letter.
    MissingUppercase,
    /// Password is missing a lowercase letter.
    MissingLowercase,
    /// Password is missing a digit.
    MissingDigit,
}

impl PasswordError {
    /// Get a human-readable error message.
    pub fn message(&self) -> String {
        match self {
            Self::TooShort { min } => format!("must be at least {} characters long", min),
            Self::TooLong { max } => format!("must be at most {} characters long", max),
            Self::MissingUppercase => "must contain an uppercase letter".to_string(),
            Self::MissingLowercase => "must contain a lowercase letter".to_string(),
            Self::MissingDigit => "must contain a number".to_string(),
        }
    }
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PasswordError {}

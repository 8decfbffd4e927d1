//! Authentication: hashing, link tokens, lockout, sessions, and the
//! orchestrating service.

pub mod lockout;
pub mod password;
pub mod service;
pub mod session;
pub mod token;
pub mod types;

pub use lockout::{FailedLoginOutcome, LockoutPolicy};
pub use password::{PasswordConfig, PasswordError, PasswordHasher, PasswordPolicy};
pub use service::AuthService;
pub use session::{SessionClaims, SessionTokenIssuer};
pub use types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, RegisteredUser, ResendVerificationRequest, ResetPasswordRequest,
    SessionUser, VerifyEmailResponse,
};

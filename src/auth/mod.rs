mod login;
mod middleware;
mod password;
mod token;

pub use login::{authenticate, normalize_email, validate_credentials, AuthError, MIN_PASSWORD_LENGTH};
pub use middleware::{auth_middleware, AuthState, AuthenticatedUser, SESSION_COOKIE};
pub use password::{hash_password, verify_password, HashCost, PasswordError};
pub use token::{Claims, TokenCodec, TokenError, TOKEN_ISSUER, TOKEN_LIFETIME_DAYS};

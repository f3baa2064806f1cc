mod backend;
mod extractor;
mod password;
mod router;

pub use backend::{AuthBackend, AuthSession, OAuthProvider};
pub use extractor::AuthUser;
pub use password::hash_password;
pub use router::router;

mod jwks;
mod validator;
mod verifier;

pub mod model;

pub use jwks::JwksClient;
pub use model::AuthenticatedUser;
pub use validator::JwtValidator;
pub use verifier::IdentityVerifier;

use serde::{Deserialize, Serialize};

/// Access token claims. Tokens are issued by the external identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

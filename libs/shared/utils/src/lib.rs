pub mod extractor;
pub mod jwt;
pub mod password;
pub mod test_utils;

pub use jwt::{TokenAuthority, TokenError, TOKEN_TTL_SECONDS};

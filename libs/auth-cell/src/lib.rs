pub mod handlers;
pub mod router;
pub mod services;

pub use services::{
    authorize_request, LoginService, SupabaseUserLookup, TokenService, UserDirectory, UserLookup,
};

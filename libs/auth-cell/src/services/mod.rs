pub mod login;
pub mod lookup;
pub mod token;

pub use login::LoginService;
pub use lookup::{SupabaseUserLookup, UserDirectory, UserLookup};
pub use token::{authorize_request, TokenService};

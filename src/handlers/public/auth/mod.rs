// Public authentication endpoints: no session required

pub mod check;
pub mod reset_password;
pub mod signin;
pub mod signout;
pub mod signup;

pub use check::check_get;
pub use reset_password::{reset_confirm_post, reset_request_post};
pub use signin::signin_post;
pub use signout::signout_post;
pub use signup::signup_post;

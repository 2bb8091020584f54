pub mod identity;
pub mod password;
pub mod session;
pub mod token;

pub use identity::{auth, require_auth, CurrentUser, OrgMember, RequireAuth, ResolvedIdentity};
pub use session::{SessionLifetime, SessionStore, SESSION_COOKIE};
pub use token::{Claims, SessionUser, TokenCodec, TokenError};

/// Sign-in page; unauthenticated page requests are sent here
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Organization-creation page; org-less users are sent here
pub const ORG_CREATION_PATH: &str = "/dashboard/organization/new";

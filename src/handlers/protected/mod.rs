// Session-backed API endpoints.
//
// Handlers take `CurrentUser` (any signed-in user) or `OrgMember` (signed-in
// user with an organization); every query is scoped by the extracted ids.

pub mod dashboard;
pub mod organizations;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod teams;
pub mod time_entries;
pub mod user;
pub mod users;

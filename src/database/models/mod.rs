pub mod organization;
pub mod project;
pub mod tag;
pub mod task;
pub mod team;
pub mod time_entry;
pub mod user;

pub use organization::Organization;
pub use project::{Priority, Project, ProjectRef, ProjectStatus};
pub use tag::Tag;
pub use task::{Task, TaskDetail, TaskStatus};
pub use team::{TaskStatusRef, Team, TeamDetail, TeamMember, TeamProject};
pub use time_entry::{TimeEntry, TimeEntryDetail};
pub use user::{AccentColor, NewUser, Role, Theme, User, UserSummary};

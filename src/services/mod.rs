pub mod analytics_service;
pub mod dashboard_service;
pub mod organization_service;
pub mod project_service;
pub mod tag_service;
pub mod task_service;
pub mod team_service;
pub mod time_entry_service;
pub mod user_service;

pub use analytics_service::AnalyticsService;
pub use dashboard_service::DashboardService;
pub use organization_service::OrganizationService;
pub use project_service::ProjectService;
pub use tag_service::TagService;
pub use task_service::TaskService;
pub use team_service::TeamService;
pub use time_entry_service::TimeEntryService;
pub use user_service::UserService;

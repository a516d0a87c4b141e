mod analytics_event;
mod locale;
mod material;
mod project;
mod project_type;
mod selected_material;

pub use analytics_event::{AnalyticsEvent, NewAnalyticsEvent, PROJECT_CREATED};
pub use locale::{Locale, LocalizedName};
pub use material::{Category, Material};
pub use project::{NewProject, OwnerId, Project};
pub use project_type::ProjectType;
pub use selected_material::SelectedMaterial;

mod audit;
mod capa;
mod comment;
mod incident;
mod label;
mod source;
mod timeline;

pub use audit::AuditCommands;
pub use capa::CapaCommands;
pub use comment::CommentCommands;
pub use incident::IncidentCommands;
pub use label::LabelCommands;
pub use source::SourceCommands;
pub use timeline::TimelineCommands;

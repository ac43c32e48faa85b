// ABOUTME: Domain types shared across the API client layer.
// ABOUTME: Resource GUIDs, access tokens, log messages, and instance models.

mod guid;
mod instance;
mod log_message;
mod token;

pub use guid::{AppGuid, AppMarker, Guid, OrgGuid, OrgMarker, SpaceGuid, SpaceMarker};
pub use instance::{AppInstanceFields, ContainerMetrics, InstanceState};
pub use log_message::{LogMessage, MessageKind};
pub use token::AccessToken;

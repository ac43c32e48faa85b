// ABOUTME: Log message domain model emitted by running application instances.
// ABOUTME: Timestamp in nanoseconds since epoch is the sole ordering key.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::AppGuid;

/// Which output stream a log line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Written to stdout.
    Out,
    /// Written to stderr.
    Err,
}

/// One log line from an application instance or a platform component.
#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    /// Raw line content as received from the aggregator.
    pub message: Bytes,
    pub kind: MessageKind,
    /// Emitting component: "App", "STG", "RTR", ...
    pub source_name: String,
    /// Instance tag within the source, e.g. "0" for the first app instance.
    /// Empty for components without instance identity.
    pub source_instance: String,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub app_guid: AppGuid,
}

impl LogMessage {
    /// The line content, lossily decoded for display.
    pub fn line(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }

    /// Source tag as rendered in log output: `App/0` with an instance,
    /// bare `STG` without one.
    pub fn source_tag(&self) -> String {
        if self.source_instance.is_empty() {
            self.source_name.clone()
        } else {
            format!("{}/{}", self.source_name, self.source_instance)
        }
    }
}

//! Replicator configuration.

/// Default transport sub-channel.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Default broadcast-room prefix, shared by both endpoints.
pub const DEFAULT_ROOM_PREFIX: &str = "replicants/";

/// Configuration shared by the client and server replicators.
///
/// `namespace` selects a sub-channel on the transport (the default channel
/// when left at `"/"`); `room_prefix` is concatenated with a replicant name
/// to form its broadcast-room identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatorOptions {
    pub namespace: String,
    pub room_prefix: String,
}

impl Default for ReplicatorOptions {
    fn default() -> Self {
        ReplicatorOptions {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            room_prefix: DEFAULT_ROOM_PREFIX.to_owned(),
        }
    }
}

impl ReplicatorOptions {
    /// The broadcast-room identifier for a replicant name.
    pub fn room_for(&self, name: &str) -> String {
        format!("{}{}", self.room_prefix, name)
    }

    /// Whether a non-default sub-channel is configured.
    pub fn has_custom_namespace(&self) -> bool {
        self.namespace != DEFAULT_NAMESPACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ReplicatorOptions::default();
        assert_eq!(options.namespace, "/");
        assert_eq!(options.room_for("score"), "replicants/score");
        assert!(!options.has_custom_namespace());
    }

    #[test]
    fn custom_namespace() {
        let options = ReplicatorOptions {
            namespace: "/dash".to_owned(),
            ..Default::default()
        };
        assert!(options.has_custom_namespace());
    }
}

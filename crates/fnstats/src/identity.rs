//! Label set identifying one function instance's metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label names, in export order.
pub const LABEL_NAMES: [&str; 5] = ["tenant", "namespace", "function", "instance_id", "cluster"];

/// The fixed label tuple attached to every metric a [`FunctionStats`]
/// instance exports. Set once at construction.
///
/// [`FunctionStats`]: crate::FunctionStats
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricIdentity {
    pub tenant: String,
    pub namespace: String,
    pub function: String,
    pub instance_id: String,
    pub cluster: String,
}

impl MetricIdentity {
    pub fn new(
        tenant: impl Into<String>,
        namespace: impl Into<String>,
        function: impl Into<String>,
        instance_id: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            namespace: namespace.into(),
            function: function.into(),
            instance_id: instance_id.into(),
            cluster: cluster.into(),
        }
    }

    /// Label values in the same order as [`LABEL_NAMES`].
    pub fn label_values(&self) -> [&str; 5] {
        [
            self.tenant.as_str(),
            self.namespace.as_str(),
            self.function.as_str(),
            self.instance_id.as_str(),
            self.cluster.as_str(),
        ]
    }
}

impl fmt::Display for MetricIdentity {
    /// `tenant/namespace/function:instance_id@cluster`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}@{}",
            self.tenant, self.namespace, self.function, self.instance_id, self.cluster
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values_follow_label_names() {
        let id = MetricIdentity::new("public", "default", "echo", "0", "standalone");
        let pairs: Vec<_> = LABEL_NAMES.iter().zip(id.label_values()).collect();
        assert_eq!(pairs[0], (&"tenant", "public"));
        assert_eq!(pairs[2], (&"function", "echo"));
        assert_eq!(pairs[4], (&"cluster", "standalone"));
    }

    #[test]
    fn display_is_fully_qualified() {
        let id = MetricIdentity::new("public", "default", "echo", "3", "us-west");
        assert_eq!(id.to_string(), "public/default/echo:3@us-west");
    }
}

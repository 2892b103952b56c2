use serde::{Deserialize, Serialize};

/// A partition as listed by `GET /partition/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub partition: String,
    /// Creation time in unix seconds
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartitionsEnvelope {
    pub partitions: Vec<Partition>,
}

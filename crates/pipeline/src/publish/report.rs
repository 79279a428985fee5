/// What happened at one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Neither the destination nor the process has a token.
    CredentialMissing,
    /// The caption template is unusable; nothing was sent.
    InvalidCaption(String),
    /// The transport failed or the destination refused.
    Failed(String),
    /// No answer within the delivery timeout.
    TimedOut,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub target_id: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The artifact hash equals the watermark. Nothing was archived or sent.
    Unchanged,
    /// At least one destination got the artifact; the watermark advanced.
    Published { delivered: usize, attempted: usize },
    /// No destination got the artifact. The watermark is untouched, so the
    /// next run tries again.
    NothingDelivered,
}

/// Result of publishing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub tracking_key: String,
    pub hash: String,
    pub outcome: PublishOutcome,
    /// One entry per destination, in configuration order. Empty when
    /// [`Unchanged`](PublishOutcome::Unchanged).
    pub deliveries: Vec<Delivery>,
}

impl PublishReport {
    pub fn is_published(&self) -> bool {
        matches!(self.outcome, PublishOutcome::Published { .. })
    }
}

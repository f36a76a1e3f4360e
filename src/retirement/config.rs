use serde::{Deserialize, Serialize};

pub const DEFAULT_ARCHIVAL_THRESHOLD_MONTHS: u32 = 6;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_IMAGE_CONTAINER: &str = "listing-images";

/// Settings for [`ExpiredListingRetirement::run`](super::ExpiredListingRetirement::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetirementConfig {
    pub archival_threshold_months: u32,
    pub batch_size: usize,
    pub image_container: String,
    /// `None` deletes every image of a listing at once.
    pub max_concurrent_image_deletions: Option<usize>,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        RetirementConfig {
            archival_threshold_months: DEFAULT_ARCHIVAL_THRESHOLD_MONTHS,
            batch_size: DEFAULT_BATCH_SIZE,
            image_container: DEFAULT_IMAGE_CONTAINER.to_string(),
            max_concurrent_image_deletions: None,
        }
    }
}

impl RetirementConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_archival_threshold_months(mut self, months: u32) -> Self {
        self.archival_threshold_months = months;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_image_container(mut self, container: impl Into<String>) -> Self {
        self.image_container = container.into();
        self
    }

    /// Cap in-flight image deletions per listing. Zero is treated as one.
    pub fn with_max_concurrent_image_deletions(mut self, max: usize) -> Self {
        self.max_concurrent_image_deletions = Some(max.max(1));
        self
    }
}

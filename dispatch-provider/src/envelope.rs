//! The Provider capability's single input type.

use crate::{Address, ProviderError, Result};
use serde::{Deserialize, Serialize};

/// Everything needed to hand a single send to an external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub to: Vec<Address>,
    pub from: Address,
    pub reply_to: Option<Address>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub tags: Vec<String>,
}

impl Envelope {
    pub fn validate(&self) -> Result<()> {
        if self.to.is_empty() {
            return Err(ProviderError::MissingField("to"));
        }
        if self.subject.is_empty() {
            return Err(ProviderError::MissingField("subject"));
        }
        if self.html.is_empty() {
            return Err(ProviderError::MissingField("html"));
        }
        Ok(())
    }
}

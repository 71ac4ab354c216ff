//! # dispatch-provider
//!
//! The Provider capability: a single async trait for handing an envelope to
//! an external email API, plus one concrete implementation (SendGrid) and a
//! null implementation for tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dispatch_provider::{Provider, SendgridProvider, SendgridConfig, Envelope, Address};
//!
//! let provider = SendgridProvider::new(SendgridConfig::new("api-key"))?;
//! let envelope = Envelope {
//!     to: vec![Address::new("user@example.com")?],
//!     from: Address::new("campaigns@example.com")?,
//!     reply_to: None,
//!     subject: "Hello".to_string(),
//!     html: "<p>Hi</p>".to_string(),
//!     text: None,
//!     tags: vec![],
//! };
//! let outcome = provider.send(&envelope).await?;
//! ```

mod address;
mod envelope;
mod error;
mod null;
mod outcome;
mod provider;
mod sendgrid;

pub use address::{Address, IntoAddress};
pub use envelope::Envelope;
pub use error::{ProviderError, Result};
pub use null::NullProvider;
pub use outcome::{ErrorClass, SendOutcome};
pub use provider::Provider;
pub use sendgrid::{SendgridConfig, SendgridProvider};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Address, Envelope, ErrorClass, IntoAddress, NullProvider, Provider, ProviderError,
        Result, SendOutcome, SendgridConfig, SendgridProvider,
    };
}

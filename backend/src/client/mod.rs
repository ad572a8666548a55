//! Client side of the analysis gateway.
//!
//! [`AnalysisClient`] packages a validated request, posts it and maps whatever
//! comes back into an [`crate::models::result::AnalysisOutcome`]. Credentials
//! are passed explicitly through a [`SessionContext`].

pub mod dispatch;
pub mod error;
pub mod session;

pub use dispatch::{AnalysisClient, ClientConfig};
pub use error::ClientError;
pub use session::{SessionContext, SessionUser};

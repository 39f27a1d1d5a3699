pub mod error;
pub mod requests;
pub mod space;
pub mod submission;

pub use error::{Error, Result};
pub use requests::{AuthRequest, AuthType, ClaimRequest, ClaimType, GroupTimestamp};
pub use space::{AppConfig, FormField, Space, ZkBadgeApp, ZkDropApp, ZkFormApp};
pub use submission::{SubmissionField, VerifiedClaim, VerifiedResult};

pub mod client;
pub mod error;
pub mod result;

pub use client::{LookupEvent, ProgressCallback, WhatCmsClient};
pub use error::ScanError;
pub use result::{LookupOutcome, LookupResults, SocialProfile, Technology, WhatCmsResponse};

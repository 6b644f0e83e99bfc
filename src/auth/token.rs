//! Token secrets and the records cached by [`CachedTokenProvider`](crate::provider::CachedTokenProvider).

pub mod record;
pub mod secret;

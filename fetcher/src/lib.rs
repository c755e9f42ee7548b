//! Chatlog fetcher: Kick API client, session tracker and the per-second fetch loop.
pub mod client;
pub mod service;
pub mod session;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use service::FetchService;

pub mod suggestions;
pub use suggestions::{CANDIDATE_COUNT, MAX_SUGGESTIONS, candidate_usernames, suggest_usernames};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SqlUserService;

mod error;
mod middleware;
mod public;
mod rate_limit;

pub use error::{ApiError, codes};
pub use public::{HttpState, build_router};
pub use rate_limit::{CLIENT_IP_HEADER, RateLimiter, client_key};

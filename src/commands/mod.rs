//! CLI command implementations.

mod error;
mod listen;
mod login;
mod range;
mod reset;
mod session;

pub use error::CommandError;
pub use listen::{listen, FeedPlan, ListenOptions};
pub use login::{login, login_with};
pub use range::{sync_range, validate_range, RangeOptions, RangeSummary};
pub use reset::reset;
pub use session::{authenticated_client, connect};

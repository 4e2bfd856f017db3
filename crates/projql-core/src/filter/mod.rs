//! Filter operators and filter compilation.

mod compile;
mod handlers;
mod registry;

pub use compile::compile;
pub use handlers::{
    standard_handler, BetweenHandler, ComparisonHandler, FilterOperatorHandler, LikeHandler,
    MembershipHandler,
};
pub use registry::OperatorRegistry;

//! Selector kinds and selection planning.

mod handlers;
mod planner;
mod registry;

pub use handlers::{AbsHandler, AggregateHandler, IdentityHandler, SelectOperatorHandler};
pub use planner::{plan, SelectionPlan};
pub use registry::SelectOperatorRegistry;

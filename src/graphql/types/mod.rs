pub mod entitlement;
pub mod order;
pub mod project;
pub mod review;

pub use entitlement::Entitlement;
pub use order::Order;
pub use project::Project;
pub use review::Review;

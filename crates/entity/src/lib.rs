pub mod customer;
pub mod customer_status;
pub mod decision_maker;

pub use customer::{PurchaseMethod, Source};

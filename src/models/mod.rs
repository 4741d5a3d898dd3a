pub mod user;
pub mod order;

pub use user::CurrentUser;
pub use order::{Order, OrderStatus};

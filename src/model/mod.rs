pub mod balance;
pub mod leave;
pub mod notification;
pub mod role;

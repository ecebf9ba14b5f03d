pub mod events;
pub mod leave;
pub mod notification;
pub mod reconcile;

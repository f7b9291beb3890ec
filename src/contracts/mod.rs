pub mod notification;

pub use notification::{ContractError, NotificationMessage};

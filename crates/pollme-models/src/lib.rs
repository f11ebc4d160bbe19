pub mod notification;
pub mod permissions;
pub mod poll;
pub mod user;

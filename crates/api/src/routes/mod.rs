//! Route handlers.

pub mod alerts;
pub mod dispatch;
pub mod login;
pub mod logs;
pub mod machines;
pub mod production;

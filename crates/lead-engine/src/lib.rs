//! Lead assignment engine: given an inbound CRM lead, pick exactly one human
//! owner using a prioritized chain of strategies while tracking per-member
//! capacity and keeping an auditable assignment history.

pub mod assignment;
pub mod config;
pub mod error;
pub mod telemetry;

pub mod membership;
pub mod profile;
pub mod subscription;
pub mod webhook_event;

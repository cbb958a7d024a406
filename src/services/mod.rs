pub mod authorization;
pub mod message_service;
pub mod publisher;

pub use message_service::MessageService;
pub use publisher::{NotificationPublisher, RedisPublisher};

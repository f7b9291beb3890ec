pub mod channel;
pub mod connection;
pub mod exchange;
pub mod publisher;

pub use channel::{ChannelError, ChannelProvider};
pub use connection::{ConnectionError, RabbitMqConnection};
pub use exchange::{declare_exchange, DeclarationError, ExchangeSpec};
pub use publisher::{message_properties, publish, PublishError, PublishRequest, JSON_CONTENT_TYPE};

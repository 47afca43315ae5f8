pub mod connector;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod pump;
pub mod relay;
pub mod source;
pub mod types;

pub use connector::{Completion, ConnectTicket, UpstreamConnector};
pub use error::UpstreamError;
pub use memory::MemorySource;
pub use normalize::{normalize, Normalized};
pub use relay::{RelayConfig, RelaySource};
pub use source::{LiveSource, LiveStream};
pub use types::{ConnectionState, ConnectorStatus, PumpItem, RawEvent};

pub mod bus;
pub mod event;
pub mod id;
pub mod topic;

pub use bus::{BusError, MemoryBus, PayloadStream, RedisStreamBus, TopicBus};
pub use event::{ChatEvent, EventKind, Language, SideChannelMode};

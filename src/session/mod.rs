//! 会话层：ID、辖区、状态快照、存储抽象、定位与克隆
//!
//! 调用方 → `SessionLocator` →（`SessionCloner` | 直接读状态）。

pub mod cloner;
pub mod id;
pub mod locator;
pub mod partition;
pub mod state;
pub mod store;

pub use cloner::{ClonedSession, SessionCloner};
pub use id::{IdGenerator, SandboxSessionId, SessionId, UuidIdGenerator};
pub use locator::SessionLocator;
pub use partition::{Partition, PartitionOrder};
pub use state::{ClientReportedError, DevState, GeneratedFile, SessionState};
pub use store::{MemorySessionStore, SessionHandle, SessionStore};

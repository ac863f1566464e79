//! Write path of a pNFS data server.
//!
//! Incoming WRITE requests are matched to an in-flight transfer by their
//! stateid, the transfer's backing extent is grown in fixed increments when a
//! write runs past it, and the bytes moved are accounted on the transfer.
//!
//! The transfer table, the backing channel and the space allocator are
//! collaborators passed in by the owner; see [`registry::SessionRegistry`],
//! [`mover_io::Channel`] and [`mover_io::ExtentAllocator`].

pub mod config;
pub mod nfs4;
pub mod registry;
pub mod session;
pub mod write;

pub use config::{DEFAULT_ALLOCATION_INCREMENT, GrowthPolicy, MAX_EXTENT, MoverConfig};
pub use registry::{MoverRegistry, SessionRef, SessionRegistry};
pub use session::{IoMode, StateId, WriteSession};
pub use write::{StableHow, WriteHandler, WriteOutcome};

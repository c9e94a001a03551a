//! # zkts-registry
//!
//! Proof-gated, multi-party timestamp attestation registry.
//!
//! A party registers a commitment to some content together with a proof that
//! it knows the content, optionally restricts who may countersign it, and
//! collects acknowledgement signatures over time.
//!
//! ## Layout
//!
//! - [`store`] / [`staging`]: durable state behind a trait, and the overlay
//!   that makes each call all-or-nothing
//! - [`stamping`]: creation checks and the admission/signing protocol
//! - [`fees`] / [`access`]: fee ledger, owner gate, one-shot initialization
//! - [`query`]: pure reads with clamped pagination
//! - [`logic`]: the replaceable logic trait
//! - [`registry`]: [`StampRegistry`], the stable entry point
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = StampRegistry::new(MemoryStore::new(), directory)?;
//! registry.initialize(CallContext::new(owner, now), params)?;
//! registry.create_stamp(CallContext::new(alice, now).paying(fee), request, &mut accounts)?;
//! registry.sign(CallContext::new(bob, later), hash)?;
//! ```

pub mod access;
pub mod call;
pub mod config;
pub mod error;
pub mod events;
pub mod fees;
pub mod logic;
pub mod query;
pub mod registry;
pub mod stamping;
pub mod staging;
pub mod store;
pub mod transfer;
pub mod types;

pub use call::CallEnv;
pub use config::{RegistryConfig, DEFAULT_PAGE_LIMIT};
pub use error::{ErrorKind, StampError};
pub use events::{EventLog, RecordedEvent, RegistryEvent, StampCreated, StampSigned};
pub use logic::{RegistryLogic, StampingLogicV1, LOGIC_V1};
pub use registry::StampRegistry;
pub use staging::StagedStore;
pub use store::{ChangeSet, MemoryStore, RegistryStore, StoreView, STORE_SCHEMA_VERSION};
pub use transfer::{AccountBook, NoTransfers, TransferError, ValueSink};
pub use types::{
    CallContext, CreateStampRequest, InitParams, RegistrySettings, SignerRecord, StampHeader,
    StampInfo, UserInfo, VisibilityKind, UNBOUNDED_SIGNERS, UNSIGNED,
};
pub use zkts_common::hash_by_bytes;

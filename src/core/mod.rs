//! Core business logic module
//!
//! - `ledger` - Transactional issue/return orchestration
//! - `inventory_store` - Version-stamped book copy counts
//! - `waitlist` - Per-book FIFO queues
//! - `fine` - Late-return fine policy
//! - `policy` - Lending limits and retry budget
//! - `traits` - Seams for interchangeable side effects
//! - `notifier` - Notification gateway implementations
//! - `batch_processor` - Book-partitioned concurrent command application

pub mod batch_processor;
pub mod fine;
pub mod inventory_store;
pub mod ledger;
pub mod notifier;
pub mod policy;
pub mod traits;
pub mod waitlist;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use fine::{FineCalculator, FinePolicy};
pub use inventory_store::InventoryStore;
pub use ledger::{CirculationOverview, IssueLedger};
pub use notifier::LogNotifier;
pub use policy::LendingPolicy;
pub use traits::NotificationGateway;
pub use waitlist::WaitlistManager;

//! Knowledge base management
//!
//! Higher-level operations over the knowledge store: validated inserts with
//! embedding generation, bulk loading with partial-success semantics,
//! text-change-aware updates that keep embeddings consistent, and
//! diagnostics.
//!
//! All mutation of knowledge entries goes through the manager; raw partial
//! writes would let stored text drift away from its embedding.

pub mod manager;
pub mod seed;
pub mod store;

pub use manager::KnowledgeManager;
pub use store::KnowledgeStore;
pub use store::ScoredEntry;

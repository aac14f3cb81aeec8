//! Branching policy controller for branch-and-bound evaluation.
//!
//! The solver calls [`BranchingController::on_search_start`] once per solve
//! and [`BranchingController::on_node`] at every node that needs a branching
//! decision. The controller records gap progress, asks its policy for a
//! decision and executes it through the solver accessor.
//!
//! # Key types
//!
//! - [`BranchingController`]: per-solve state and the decision callback
//! - [`SearchState`]: trait the solver implements to expose the node
//! - [`BranchingPolicy`]: one conforming type per [`PolicyKind`]
//!   ([`SolverNativePolicy`], [`NeuralPolicy`], [`TabularPolicy`])
//! - [`PolicyDescriptor`] / [`build_policy`]: configuration-driven construction
//! - [`ProgressTracker`]: gap trajectory and threshold snapshot

pub mod controller;
pub mod error;
pub mod mocks;
pub mod policy;
pub mod state;
pub mod tracker;

pub use controller::{BranchingController, BranchingStats};
pub use error::BranchError;
pub use policy::{
    build_policy, select_best, BranchingPolicy, Decision, DecisionContext, NeuralPolicy,
    PolicyDescriptor, PolicyKind, SolverNativePolicy, TabularPolicy,
};
pub use state::{BranchOutcome, Candidate, NodeInfo, SearchState};
pub use tracker::ProgressTracker;

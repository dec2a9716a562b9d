//! # Mesh Policy
//!
//! Turns raw admin-policy facts into one aggregated [`Decision`] per
//! requested capability.
//!
//! ## Overview
//!
//! An external policy evaluator produces facts: possibly several decisions
//! for the same capability, plus optimization strategies. The
//! [`DecisionEvaluator`] fetches those facts through a [`PolicyFactSource`]
//! and merges them:
//!
//! - Conflicting deploy statuses resolve to the most restrictive one
//!   (Forbid, then Require, then Unknown).
//! - Value-list restrictions on the same property are unioned.
//! - Range restrictions on the same property are intersected; an empty
//!   intersection forces the decision to Forbid.
//! - Capabilities without any fact default to Unknown with no restrictions.
//! - Optimization strategies are passed through in evaluation order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//! use mesh_policy::{DecisionEvaluator, PolicyFacts, StaticFactSource};
//! use mesh_types::Capability;
//!
//! # async fn example() {
//! let source = Arc::new(StaticFactSource::new(PolicyFacts::default()));
//! let evaluator = DecisionEvaluator::new(source);
//!
//! let capabilities: BTreeSet<Capability> = ["read".into(), "write".into()].into();
//! let output = evaluator.evaluate(&capabilities).await.unwrap();
//! assert_eq!(output.config.len(), 2);
//! # }
//! ```
//!
//! [`Decision`]: mesh_types::Decision

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod evaluator;
pub mod facts;

// Re-exports
pub use error::{PolicyError, Result};
pub use evaluator::{evaluate_facts, DecisionEvaluator};
pub use facts::{PolicyFactSource, PolicyFacts, StaticFactSource};

//! Fix-and-optimize matheuristic for MIP-based routing and scheduling.
//!
//! Improves a solution of a mixed-integer model whose variables are
//! indexed by vehicles, days and customers:
//!
//! - **Registry**: maps `(family, key)` pairs to dense column indices and
//!   back, and lists the columns belonging to one vehicle, day or customer.
//! - **MIP boundary**: the [`mip::MipModel`] trait a solver binding
//!   implements, plus [`mip::DenseModel`], a small enumerating model for
//!   tests and toy instances.
//! - **Oracle**: wraps a model, pins variables with removable equality
//!   rows and rewrites the objective, each inside a scope that undoes
//!   itself.
//! - **Neighborhoods**: random and sweeping subsets of one index kind
//!   that stay free while every other fixable variable is fixed.
//! - **VND**: the controller that cycles through neighborhood kinds,
//!   adapts their sizes, tracks the incumbent and shakes on convergence.
//!
//! # Architecture
//!
//! The crate holds no problem-specific knowledge. Consumers build the
//! model, register its variable families and hand both to
//! [`vnd::VndRunner`].

pub mod fixing;
pub mod incumbent;
pub mod mip;
pub mod neighborhood;
pub mod oracle;
pub mod registry;
pub mod shaking;
pub mod vnd;

#[cfg(test)]
mod test_support;

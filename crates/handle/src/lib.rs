//! Handles and the combinators that build them.
//!
//! A [`Handle`] is a callable value with one fixed [`Signature`](linkage_types::Signature).
//! Combinator functions in this crate build new handles from existing ones without invoking
//! anything; the result owns its components and copies of every slice it was given.
//! [`cell`] provides mutable indirection for call sites and [`invalidation`] one-way switches.

pub mod adapt;
pub mod basic;
pub mod binder;
pub mod cell;
pub mod filter;
pub mod fold;
pub mod guard;
mod handle;
pub mod invalidation;
pub mod invoker;
pub mod spread;

pub use adapt::explicit_cast_arguments;
pub use basic::{array_element_getter, array_length, constant, empty, identity, throw_exception, zero};
pub use binder::{bind_to, drop_arguments, drop_arguments_to_match, insert_arguments, permute_arguments};
pub use cell::{ConstantCell, DispatchCell, MutableCell, VolatileCell};
pub use filter::{collect_arguments, filter_arguments, filter_arguments_with_combiner, filter_return_value};
pub use fold::{fold_arguments, fold_arguments_at, fold_arguments_with_combiner};
pub use guard::{catch_exception, guard_with_test, try_finally};
pub use handle::Handle;
pub use invalidation::InvalidationToken;
pub use invoker::{exact_invoker, invoker, spread_invoker};
pub use spread::{as_collector, as_collector_at, as_spreader, as_spreader_at};

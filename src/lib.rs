#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod chain;
pub mod deferred;
pub mod reducer;
pub mod sequence;
pub mod spawn;

pub use chain::ChainExt;
pub use deferred::{Deferred, Waiter};
pub use reducer::{AsyncReducer, ReducerError, Terminal};
pub use sequence::{accumulate, all_succeed, always, succeed, walk, walk_with};
pub use spawn::Spawn;

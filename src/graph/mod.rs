//! Friend graph module: node store, distance propagation and frontier.
//!
//! Nodes are created lazily the first time an id is referenced and are
//! refined as friend lists arrive. Distances to the target only ever shrink.

mod frontier;
mod node;
mod propagation;
mod store;

pub use frontier::Frontier;
pub use node::{Node, NodeId, NodeSnapshot, DISPLAY_NAME_KEY, UNKNOWN_DISTANCE};
pub use propagation::merge_friend_list;
pub use store::NodeStore;

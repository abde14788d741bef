//! Priority-structure implementations. [`splay_tree`] backs
//! [`crate::queue::SplayEventQueue`].

pub mod splay_tree;

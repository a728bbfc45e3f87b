mod arena;
mod handle;
mod invariants;
mod node;
mod raw_tree;
mod restore;
mod scan;

pub(crate) use raw_tree::RawBPlusTree;
pub(crate) use scan::Cursor;

//! Policies governing how heap records are interpreted and how free space is tracked.

pub mod free_list;
pub mod object_layout;

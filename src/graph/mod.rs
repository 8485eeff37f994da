//! Waardetypes en node-parameters die componenten uitwisselen.

pub mod node;
pub mod value;

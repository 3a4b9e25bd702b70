mod control;
mod group;
pub mod hash;
pub mod hashset;
pub mod hashtable;
mod layout;
mod raw;
pub mod traits;

pub use hash::FastHasher;
pub use hashset::Hashset;
pub use hashtable::Hashtable;
pub use traits::{DefaultEq, DefaultHashBuilder, EqFn, FastHash, HashFn};

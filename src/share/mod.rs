pub mod codec;
pub mod resolver;

pub use codec::{decode, encode};
pub use resolver::*;

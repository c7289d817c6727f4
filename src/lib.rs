#![no_std]

#[macro_use]
pub extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod address;
pub mod decode;
pub mod error;
pub mod network;
pub mod payload;
pub mod signer;
pub mod utils;
pub mod verifier;

pub use address::*;
pub use decode::*;
pub use error::*;
pub use network::*;
pub use payload::*;
pub use signer::*;
pub use utils::*;
pub use verifier::*;

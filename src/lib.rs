//! Masked authenticated message streams over a ternary sponge.
//!
//! A publisher holding a secret seed emits a chain of signed, optionally
//! encrypted messages. Each message is signed with a one-time key from a
//! Merkle window, carries the root of the next window inside its encrypted
//! body, and is announced at an address derived from the current root. A
//! reader given the first root (plus the side key in restricted mode) can
//! authenticate every message and discover where the chain continues;
//! without the root the messages are unlinkable and unreadable.
//!
//! The payload laid down by [`Channel::create_message`] has the shape
//!
//! ```text
//! [
//!     encoded index,
//!     encoded message length,
//!     masked [ next root, message ],
//!     masked nonce,
//!     masked [ signature, encoded sibling count, siblings ],
//!     pad to a tryte boundary
//! ]
//! ```
//!
//! and [`parse_message`] walks the same shape backwards, checking the nonce
//! weight, the one-time signature and the Merkle path before releasing the
//! message.
//!
//! # Example
//!
//! ```
//! use mam::{parse_message, Channel, ChannelMode};
//!
//! let seed = "NOONECANGUESSTHIS9SEED9".repeat(4);
//! let mut channel = Channel::new(&seed[..81], 1, ChannelMode::Public, None).unwrap();
//!
//! let sent = channel.create_message("HELLO9WORLD").unwrap();
//! let received = parse_message(&sent.payload, &sent.root, None).unwrap();
//!
//! assert_eq!(received.message, "HELLO9WORLD");
//! // The next message will be signed under the root this one announced.
//! assert_eq!(channel.next_root(), Some(received.next_root.as_str()));
//! ```
#![warn(missing_docs, rust_2018_idioms)]

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod channel;
pub mod curl;
pub mod errors;
pub mod mask;
pub mod merkle;
pub mod nonce;
pub mod pascal;
pub mod sign;
pub mod trits;

pub use channel::{parse_message, Channel, ChannelMode, MamMessage, ParsedMessage};
pub use errors::Error;

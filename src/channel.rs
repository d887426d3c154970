//! Channel state, message builder and message parser.
//!
//! A channel walks an append-only chain of Merkle windows derived from one
//! seed. Publishing consumes one leaf key per message and embeds the next
//! window's root into the encrypted body, so a reader holding only the
//! first root can follow and authenticate the whole stream.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroize;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

use crate::curl::{Curl, HASH_LENGTH};
use crate::errors::Error;
use crate::mask::{mask_hash, mask_slice, unmask_slice};
use crate::merkle::{self, MerkleTree};
use crate::nonce;
use crate::pascal;
use crate::sign;
use crate::trits::{self, Trit, TRITS_PER_TRYTE};

/// Length of a channel seed, in trytes.
pub const SEED_LENGTH: usize = 81;

/// Length of a message nonce, in trits.
pub const NONCE_LENGTH: usize = HASH_LENGTH / 3;

/// How a channel hides its messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_enabled", serde(rename_all = "lowercase"))]
pub enum ChannelMode {
    /// Messages are announced at the root itself; anyone can read them.
    Public,
    /// Messages are announced at a hash of the root, so only root holders
    /// can find and decrypt them.
    Private,
    /// As private, with a shared side key folded into the keystream.
    Restricted,
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ChannelMode::Public => "public",
            ChannelMode::Private => "private",
            ChannelMode::Restricted => "restricted",
        };
        f.write_str(tag)
    }
}

impl FromStr for ChannelMode {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Error> {
        match tag {
            "public" => Ok(ChannelMode::Public),
            "private" => Ok(ChannelMode::Private),
            "restricted" => Ok(ChannelMode::Restricted),
            other => Err(Error::UnknownMode(other.to_owned())),
        }
    }
}

/// A signed, masked message ready for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MamMessage {
    /// The masked payload as trytes.
    pub payload: String,
    /// Root of the Merkle window the signing key belongs to.
    pub root: String,
    /// Where the transport should announce the payload: the root itself in
    /// public mode, a hash of it otherwise.
    pub address: String,
}

/// An authenticated message recovered by [`parse_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// The decrypted message body as trytes.
    pub message: String,
    /// Root of the window the publisher will sign its next message with.
    pub next_root: String,
}

/// Publisher state for one message chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Channel {
    seed: String,
    mode: ChannelMode,
    side_key: Option<String>,
    security: u8,
    start: u64,
    count: usize,
    next_count: usize,
    index: usize,
    next_root: Option<String>,
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.seed.zeroize();
        if let Some(key) = self.side_key.as_mut() {
            key.zeroize();
        }
    }
}

impl Channel {
    /// Opens a fresh channel over `seed`.
    ///
    /// # Errors
    /// Rejects a seed that is not 81 trytes, a security level outside
    /// {1, 2, 3}, and any mode/side-key mismatch: restricted mode requires a
    /// side key of 1 to 81 trytes, the other modes forbid one.
    pub fn new(
        seed: &str,
        security: u8,
        mode: ChannelMode,
        side_key: Option<&str>,
    ) -> Result<Channel, Error> {
        if !trits::is_tryte_str(seed) {
            return Err(Error::InvalidTrytes);
        }
        if seed.len() != SEED_LENGTH {
            return Err(Error::InvalidSeedLength(seed.len()));
        }
        if !(1..=3).contains(&security) {
            return Err(Error::InvalidSecurityLevel(security));
        }
        let side_key = match (mode, side_key) {
            (ChannelMode::Restricted, Some(key)) => Some(pad_side_key(key)?),
            (ChannelMode::Restricted, None) => return Err(Error::MissingSideKey),
            (_, Some(_)) => return Err(Error::UnexpectedSideKey),
            (_, None) => None,
        };
        Ok(Channel {
            seed: seed.to_owned(),
            mode,
            side_key,
            security,
            start: 0,
            count: 1,
            next_count: 1,
            index: 0,
            next_root: None,
        })
    }

    /// The mode this channel was opened with.
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// The security level every message of this channel is signed at.
    pub fn security(&self) -> u8 {
        self.security
    }

    /// Absolute leaf index where the current window begins.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of leaves in the current window.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of leaves in the window announced to readers.
    pub fn next_count(&self) -> usize {
        self.next_count
    }

    /// Position of the next message inside the current window.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Root of the window advertised by the most recent message, if any.
    /// Purely advisory; nothing in the core reads it back.
    pub fn next_root(&self) -> Option<&str> {
        self.next_root.as_deref()
    }

    /// Resizes the current and announced Merkle windows.
    ///
    /// Window n+1 chains onto the root advertised by window n only while
    /// `count == next_count`, so resizing a channel that has already
    /// published orphans the advertised next root. Intended for configuring
    /// a fresh channel.
    ///
    /// # Errors
    /// Rejects zero-sized windows and a `count` that does not leave the
    /// current message index inside the window.
    pub fn set_counts(&mut self, count: usize, next_count: usize) -> Result<(), Error> {
        if count == 0 {
            return Err(Error::InvalidLeafCount(count));
        }
        if next_count == 0 {
            return Err(Error::InvalidLeafCount(next_count));
        }
        if self.index >= count {
            return Err(Error::LeafIndexOutOfRange(self.index, count));
        }
        self.count = count;
        self.next_count = next_count;
        Ok(())
    }

    /// Root of the current Merkle window, as 81 trytes. The first message
    /// of a fresh channel carries exactly this root.
    pub fn root(&self) -> String {
        let mut seed_trits = self.seed_trits();
        let tree = MerkleTree::new(&seed_trits, self.start, self.count, self.security);
        seed_trits.zeroize();
        trits::trits_to_string(tree.root()).expect("addresses are whole trytes")
    }

    /// Builds, signs and masks the next message of the chain, advancing the
    /// channel state.
    ///
    /// # Errors
    /// Fails with [`Error::InvalidTrytes`] when `message` contains a
    /// character outside the tryte alphabet.
    pub fn create_message(&mut self, message: &str) -> Result<MamMessage, Error> {
        let message_trits = trits::trits_from_str(message)?;
        let mut seed_trits = self.seed_trits();
        let side_key_trits = self.side_key_trits();

        let tree = MerkleTree::new(&seed_trits, self.start, self.count, self.security);
        let next_tree = MerkleTree::new(
            &seed_trits,
            self.start + self.count as u64,
            self.next_count,
            self.security,
        );
        seed_trits.zeroize();
        let subtree = tree.subtree(self.index);

        let mut payload = pascal::encode(self.index as i64);
        payload.extend(pascal::encode(message_trits.len() as i64));

        let mut curl = Curl::default();
        curl.absorb(&side_key_trits);
        curl.absorb(tree.root());
        curl.absorb(&payload);

        let mut body = next_tree.root().to_vec();
        body.extend_from_slice(&message_trits);
        mask_slice(&mut body, &mut curl);
        payload.append(&mut body);

        let mut nonce_trits = nonce::search(curl.state(), self.security, NONCE_LENGTH, 0)?;
        mask_slice(&mut nonce_trits, &mut curl);
        payload.append(&mut nonce_trits);

        let mut hash = [0 as Trit; HASH_LENGTH];
        hash.copy_from_slice(curl.rate());
        let mut tail = sign::signature(&hash, &subtree.key);
        tail.extend(pascal::encode(subtree.leaves.len() as i64));
        for sibling in &subtree.leaves {
            tail.extend_from_slice(sibling);
        }
        mask_slice(&mut tail, &mut curl);
        payload.append(&mut tail);

        // Framing only: the pad sits outside the sponge transcript.
        while payload.len() % TRITS_PER_TRYTE != 0 {
            payload.push(0);
        }

        let root = trits::trits_to_string(tree.root())?;
        let address = match self.mode {
            ChannelMode::Public => root.clone(),
            _ => trits::trits_to_string(&mask_hash(tree.root()))?,
        };
        let next_root = trits::trits_to_string(next_tree.root())?;

        if self.index == self.count - 1 {
            self.start += self.next_count as u64;
            self.index = 0;
        } else {
            self.index += 1;
        }
        self.next_root = Some(next_root);

        Ok(MamMessage {
            payload: trits::trits_to_string(&payload)?,
            root,
            address,
        })
    }

    fn seed_trits(&self) -> Vec<Trit> {
        trits::trits_from_str(&self.seed).expect("seed validated at construction")
    }

    fn side_key_trits(&self) -> Vec<Trit> {
        match self.side_key.as_deref() {
            Some(key) => trits::trits_from_str(key).expect("side key validated at construction"),
            None => vec![0; HASH_LENGTH],
        }
    }
}

/// Authenticates and decrypts one payload of a channel.
///
/// `root` is the window root the reader currently follows; `side_key` must
/// repeat the publisher's side key in restricted mode and stay `None`
/// otherwise. On success the returned [`ParsedMessage::next_root`] is the
/// root to follow next.
///
/// The few trailing pad trits that round the payload up to a tryte boundary
/// sit outside the authenticated transcript; only framing, never content,
/// lives there.
///
/// # Errors
/// - validation errors for non-tryte input, a root that is not 81 trytes,
///   or an out-of-range side key;
/// - [`Error::UnexpectedEndOfPayload`] / [`Error::ValueOutOfRange`] when a
///   length field is truncated or implausible;
/// - [`Error::InvalidHammingWeight`] when the recovered hash carries no
///   zero-weight prefix;
/// - [`Error::RootMismatch`] when the signature and sibling path do not
///   rebuild `root`.
pub fn parse_message(
    payload: &str,
    root: &str,
    side_key: Option<&str>,
) -> Result<ParsedMessage, Error> {
    let mut payload_trits = trits::trits_from_str(payload)?;
    let root_trits = trits::trits_from_str(root)?;
    if root_trits.len() != HASH_LENGTH {
        return Err(Error::InvalidRootLength(root.len()));
    }
    let side_key_trits = match side_key {
        Some(key) => trits::trits_from_str(&pad_side_key(key)?)?,
        None => vec![0; HASH_LENGTH],
    };

    let (index, index_end) = pascal::decode(&payload_trits)?;
    let (message_length, length_end) = pascal::decode(&payload_trits[index_end..])?;
    if index < 0 || message_length < 0 || message_length as usize > payload_trits.len() {
        return Err(Error::ValueOutOfRange);
    }
    let index = index as usize;
    let message_length = message_length as usize;

    let next_root_start = index_end + length_end;
    let message_start = next_root_start + HASH_LENGTH;
    let message_end = message_start + message_length;
    if message_end + NONCE_LENGTH > payload_trits.len() {
        return Err(Error::UnexpectedEndOfPayload);
    }

    let mut curl = Curl::default();
    curl.absorb(&side_key_trits);
    curl.absorb(&root_trits);
    curl.absorb(&payload_trits[..next_root_start]);

    unmask_slice(&mut payload_trits[next_root_start..message_start], &mut curl);
    unmask_slice(&mut payload_trits[message_start..message_end], &mut curl);
    unmask_slice(
        &mut payload_trits[message_end..message_end + NONCE_LENGTH],
        &mut curl,
    );

    let mut hash = [0 as Trit; HASH_LENGTH];
    hash.copy_from_slice(curl.rate());
    let security = sign::checksum_security(&hash);
    if security == 0 {
        return Err(Error::InvalidHammingWeight);
    }

    let signature_start = message_end + NONCE_LENGTH;
    unmask_slice(&mut payload_trits[signature_start..], &mut curl);
    curl.reset();

    let signature_end = signature_start + security * sign::KEY_FRAGMENT_LENGTH;
    if signature_end > payload_trits.len() {
        return Err(Error::UnexpectedEndOfPayload);
    }
    let digest = sign::digest_from_signature(&hash, &payload_trits[signature_start..signature_end]);
    curl.absorb(&digest);

    let (sibling_count, consumed) = pascal::decode(&payload_trits[signature_end..])?;
    if sibling_count < 0 || sibling_count as usize > payload_trits.len() / HASH_LENGTH {
        return Err(Error::ValueOutOfRange);
    }
    let siblings_start = signature_end + consumed;
    let siblings_end = siblings_start + sibling_count as usize * HASH_LENGTH;
    if siblings_end > payload_trits.len() {
        return Err(Error::UnexpectedEndOfPayload);
    }

    let recomputed = if sibling_count == 0 {
        curl.rate().to_vec()
    } else {
        merkle::root_from_siblings(
            curl.rate(),
            &payload_trits[siblings_start..siblings_end],
            index,
        )
    };
    if recomputed != root_trits {
        return Err(Error::RootMismatch);
    }

    Ok(ParsedMessage {
        message: trits::trits_to_string(&payload_trits[message_start..message_end])?,
        next_root: trits::trits_to_string(&payload_trits[next_root_start..message_start])?,
    })
}

fn pad_side_key(key: &str) -> Result<String, Error> {
    if key.is_empty() || key.len() > SEED_LENGTH {
        return Err(Error::InvalidSideKeyLength(key.len()));
    }
    if !trits::is_tryte_str(key) {
        return Err(Error::InvalidTrytes);
    }
    let mut padded = String::with_capacity(SEED_LENGTH);
    padded.push_str(key);
    while padded.len() < SEED_LENGTH {
        padded.push('9');
    }
    Ok(padded)
}

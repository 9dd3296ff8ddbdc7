//! Content fingerprints shared by the cohost client and worker processes.
//!
//! A [`Checksum`] identifies content, not location: two structurally equal
//! values always produce the same checksum, so either process can name a piece
//! of a workspace snapshot without transmitting it.

#![warn(missing_docs)]

mod collection;

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{Xxh3, xxh3_128};

pub use collection::ChecksumCollection;

/// Width of a [`Checksum`] in bytes.
pub const CHECKSUM_LEN: usize = 16;

/// Fixed-width content identifier.
///
/// [`Checksum::NULL`] is reserved for "no content" and is never produced by
/// hashing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
	/// Sentinel checksum of absent content.
	pub const NULL: Self = Self([0; CHECKSUM_LEN]);

	/// Wraps raw checksum bytes received from a peer.
	pub const fn from_bytes(bytes: [u8; CHECKSUM_LEN]) -> Self {
		Self(bytes)
	}

	/// Returns the raw checksum bytes.
	pub const fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
		&self.0
	}

	/// Returns true for [`Checksum::NULL`].
	pub fn is_null(&self) -> bool {
		*self == Self::NULL
	}

	/// Hashes a byte slice.
	pub fn of(bytes: &[u8]) -> Self {
		Self(xxh3_128(bytes).to_le_bytes())
	}

	/// Hashes an ordered sequence of child checksums into a parent checksum.
	///
	/// Order matters: permuting the children yields a different parent.
	pub fn combine<I>(children: I) -> Self
	where
		I: IntoIterator<Item = Checksum>,
	{
		let mut writer = ChecksumWriter::new(b"combine");
		for child in children {
			writer.write_checksum(child);
		}
		writer.finish()
	}
}

impl Default for Checksum {
	fn default() -> Self {
		Self::NULL
	}
}

impl fmt::LowerHex for Checksum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

impl fmt::Display for Checksum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::LowerHex::fmt(self, f)
	}
}

impl fmt::Debug for Checksum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Checksum({self:x})")
	}
}

/// Streaming checksum builder for structured values.
///
/// Every value starts with a kind tag so that values of different kinds with
/// identical field bytes never share a checksum. Variable-length fields are
/// length-prefixed.
pub struct ChecksumWriter {
	hasher: Xxh3,
}

impl ChecksumWriter {
	/// Starts a checksum for a value of the given kind.
	pub fn new(kind: &[u8]) -> Self {
		let mut writer = Self { hasher: Xxh3::new() };
		writer.write_bytes(kind);
		writer
	}

	/// Appends a length-prefixed byte field.
	pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
		self.hasher.update(&(bytes.len() as u64).to_le_bytes());
		self.hasher.update(bytes);
		self
	}

	/// Appends a length-prefixed string field.
	pub fn write_str(&mut self, value: &str) -> &mut Self {
		self.write_bytes(value.as_bytes())
	}

	/// Appends an optional string field.
	pub fn write_opt_str(&mut self, value: Option<&str>) -> &mut Self {
		self.write_opt_bytes(value.map(str::as_bytes))
	}

	/// Appends an optional byte field.
	pub fn write_opt_bytes(&mut self, value: Option<&[u8]>) -> &mut Self {
		match value {
			Some(value) => {
				self.hasher.update(&[1]);
				self.write_bytes(value)
			}
			None => {
				self.hasher.update(&[0]);
				self
			}
		}
	}

	/// Appends an integer field.
	pub fn write_u64(&mut self, value: u64) -> &mut Self {
		self.hasher.update(&value.to_le_bytes());
		self
	}

	/// Appends a boolean field.
	pub fn write_bool(&mut self, value: bool) -> &mut Self {
		self.hasher.update(&[u8::from(value)]);
		self
	}

	/// Appends a nested checksum.
	pub fn write_checksum(&mut self, checksum: Checksum) -> &mut Self {
		self.hasher.update(checksum.as_bytes());
		self
	}

	/// Finishes the checksum.
	pub fn finish(&self) -> Checksum {
		Checksum(self.hasher.digest128().to_le_bytes())
	}
}

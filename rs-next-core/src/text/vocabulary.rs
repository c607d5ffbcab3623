use std::collections::HashMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::write_atomic;

/// Id reserved for "no token". Never assigned by `Vocabulary::build`.
pub const RESERVED_ID: u32 = 0;

/// Bidirectional mapping between tokens and dense integer ids.
///
/// Ids are assigned in first-occurrence order starting at 1; id 0 is
/// reserved. Once built the vocabulary is frozen: there is no way to add a
/// token afterwards.
///
/// ## Invariants
/// - `tokens[id - 1]` is the token of `id`
/// - `ids[tokens[i]] == i + 1` for every `i`
/// - no token appears twice in `tokens`
///
/// Only the ordered token list is serialized, the forward map is rebuilt on
/// load so a restored vocabulary is identical to the saved one.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(into = "StoredVocabulary", try_from = "StoredVocabulary")]
pub struct Vocabulary {
	/// Forward lookup (token → id).
	ids: HashMap<String, u32>,
	/// Inverse lookup, indexed by `id - 1`.
	tokens: Vec<String>,
}

/// On-disk shape of a vocabulary.
#[derive(Serialize, Deserialize)]
struct StoredVocabulary {
	tokens: Vec<String>,
}

impl From<Vocabulary> for StoredVocabulary {
	fn from(vocabulary: Vocabulary) -> Self {
		Self { tokens: vocabulary.tokens }
	}
}

impl TryFrom<StoredVocabulary> for Vocabulary {
	type Error = Error;

	fn try_from(stored: StoredVocabulary) -> Result<Self> {
		let mut ids = HashMap::with_capacity(stored.tokens.len());
		for (index, token) in stored.tokens.iter().enumerate() {
			if ids.insert(token.clone(), index as u32 + 1).is_some() {
				return Err(Error::CorruptVocabulary(format!("duplicate token {token:?}")));
			}
		}
		Ok(Self { ids, tokens: stored.tokens })
	}
}

impl Vocabulary {
	/// Builds a vocabulary from a token stream.
	///
	/// Scans the tokens once, left to right. A token seen for the first time
	/// gets the next free id; later occurrences reuse it.
	pub fn build<I, S>(tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut vocabulary = Self::default();
		for token in tokens {
			let token = token.as_ref();
			if !vocabulary.ids.contains_key(token) {
				vocabulary.tokens.push(token.to_owned());
				vocabulary.ids.insert(token.to_owned(), vocabulary.tokens.len() as u32);
			}
		}
		debug!("Built vocabulary with {} distinct tokens", vocabulary.tokens.len());
		vocabulary
	}

	/// Returns the id of `token`, if known.
	pub fn id(&self, token: &str) -> Option<u32> {
		self.ids.get(token).copied()
	}

	/// Returns the token of `id`. The reserved id 0 has no token.
	pub fn token(&self, id: u32) -> Option<&str> {
		let index = (id as usize).checked_sub(1)?;
		self.tokens.get(index).map(String::as_str)
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Width of a model output distribution: distinct tokens plus the reserved id.
	pub fn size(&self) -> usize {
		self.tokens.len() + 1
	}

	/// Encodes tokens to ids.
	///
	/// # Errors
	/// Returns `Error::UnknownToken` for the first token absent from the vocabulary.
	pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<u32>> {
		tokens
			.iter()
			.map(|token| {
				let token = token.as_ref();
				self.id(token).ok_or_else(|| Error::UnknownToken(token.to_owned()))
			})
			.collect()
	}

	/// Iterates over `(id, token)` pairs in id order.
	pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
		self.tokens.iter().enumerate().map(|(i, t)| (i as u32 + 1, t.as_str()))
	}

	/// Serializes the vocabulary with `postcard` and writes it atomically.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		write_atomic(&path, &bytes)?;
		debug!("Saved vocabulary ({} tokens) to {}", self.len(), path.as_ref().display());
		Ok(())
	}

	/// Restores a vocabulary written by `save`.
	///
	/// # Errors
	/// - `Error::Io` if the file cannot be read
	/// - `Error::Serialization` if the bytes are not a token list
	/// - `Error::CorruptVocabulary` if the token list has duplicates
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		let stored: StoredVocabulary = postcard::from_bytes(&bytes)?;
		Self::try_from(stored)
	}
}

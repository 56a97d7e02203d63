use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const MIN_WEIGHT: i32 = 1;
pub const MAX_WEIGHT: i32 = 5;

/// Qualitative label paired with every preference weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
	Hate,
	Dislike,
	Neutral,
	Like,
	Love,
}
impl Sentiment {
	pub const ALL: [Self; 5] = [Self::Hate, Self::Dislike, Self::Neutral, Self::Like, Self::Love];

	pub fn weight(self) -> i32 {
		match self {
			Self::Hate => 1,
			Self::Dislike => 2,
			Self::Neutral => 3,
			Self::Like => 4,
			Self::Love => 5,
		}
	}

	/// Inverse of [`Sentiment::weight`]. Out-of-range weights have no label.
	pub fn from_weight(weight: i32) -> Option<Self> {
		match weight {
			1 => Some(Self::Hate),
			2 => Some(Self::Dislike),
			3 => Some(Self::Neutral),
			4 => Some(Self::Like),
			5 => Some(Self::Love),
			_ => None,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Hate => "hate",
			Self::Dislike => "dislike",
			Self::Neutral => "neutral",
			Self::Like => "like",
			Self::Love => "love",
		}
	}
}
impl fmt::Display for Sentiment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}
impl FromStr for Sentiment {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let normalized = raw.trim().to_ascii_lowercase();

		Self::ALL
			.into_iter()
			.find(|sentiment| sentiment.label() == normalized)
			.ok_or_else(|| format!("Unknown sentiment label: {raw:?}."))
	}
}

pub fn clamp_weight(weight: i32) -> i32 {
	weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

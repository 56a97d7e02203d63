use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceType {
	Food,
	Dietary,
	Health,
	Custom,
}
impl PreferenceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Food => "food",
			Self::Dietary => "dietary",
			Self::Health => "health",
			Self::Custom => "custom",
		}
	}
}
impl fmt::Display for PreferenceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for PreferenceType {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"food" => Ok(Self::Food),
			"dietary" => Ok(Self::Dietary),
			"health" => Ok(Self::Health),
			"custom" => Ok(Self::Custom),
			other => Err(format!("Unknown preference type: {other:?}.")),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
	Order,
	View,
	Search,
	Interaction,
}
impl BehaviorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Order => "order",
			Self::View => "view",
			Self::Search => "search",
			Self::Interaction => "interaction",
		}
	}
}
impl fmt::Display for BehaviorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for BehaviorKind {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"order" => Ok(Self::Order),
			"view" => Ok(Self::View),
			"search" => Ok(Self::Search),
			"interaction" => Ok(Self::Interaction),
			other => Err(format!("Unknown behavior type: {other:?}.")),
		}
	}
}

/// Singleton-per-name reference nodes and the relationship that reaches each kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
	DietType,
	AgeGroup,
	Location,
	Cuisine,
}
impl TaxonomyKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::DietType => "diet_type",
			Self::AgeGroup => "age_group",
			Self::Location => "location",
			Self::Cuisine => "cuisine",
		}
	}

	pub fn relation(self) -> &'static str {
		match self {
			Self::DietType => "FOLLOWS_DIET",
			Self::AgeGroup => "BELONGS_TO_AGE_GROUP",
			Self::Location => "LIVES_IN",
			Self::Cuisine => "SERVES_CUISINE",
		}
	}
}
impl fmt::Display for TaxonomyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

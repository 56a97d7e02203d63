//! Onboarding answers as persisted by the account service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnboardingRecord {
	pub user: OnboardingUser,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingUser {
	pub profile: PersonalInfo,
	pub dietary: DietaryInfo,
	pub preferences: FoodPreferences,
	#[serde(default)]
	pub completed_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub age: Option<u32>,
	#[serde(default)]
	pub location: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DietaryInfo {
	#[serde(rename = "type", default)]
	pub diet_type: Option<String>,
	#[serde(default)]
	pub restrictions: Vec<Restriction>,
	#[serde(default)]
	pub goals: Vec<String>,
}

/// `kind` is `allergy` or `restriction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
	#[serde(rename = "type")]
	pub kind: String,
	pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPreferences {
	#[serde(default)]
	pub foods: BTreeMap<String, FoodRating>,
	#[serde(default)]
	pub custom_likes: Vec<CustomFood>,
	#[serde(default)]
	pub custom_dislikes: Vec<CustomFood>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodRating {
	pub preference: String,
	pub category: String,
	pub weight: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomFood {
	pub food: String,
	#[serde(default)]
	pub preference: Option<String>,
	#[serde(default)]
	pub weight: Option<i32>,
	#[serde(default)]
	pub source: Option<String>,
}

impl OnboardingRecord {
	pub fn name(&self) -> Option<&str> {
		non_blank(self.user.profile.name.as_deref())
	}

	pub fn location(&self) -> Option<&str> {
		non_blank(self.user.profile.location.as_deref())
	}

	pub fn age(&self) -> Option<u32> {
		self.user.profile.age
	}

	pub fn diet_type(&self) -> Option<&str> {
		non_blank(self.user.dietary.diet_type.as_deref())
	}
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

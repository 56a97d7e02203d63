pub const AGE_GROUPS: [&str; 7] = ["Under 18", "18-24", "25-34", "35-44", "45-54", "55-64", "65+"];

pub fn age_group(age: u32) -> &'static str {
	match age {
		0..=17 => AGE_GROUPS[0],
		18..=24 => AGE_GROUPS[1],
		25..=34 => AGE_GROUPS[2],
		35..=44 => AGE_GROUPS[3],
		45..=54 => AGE_GROUPS[4],
		55..=64 => AGE_GROUPS[5],
		_ => AGE_GROUPS[6],
	}
}

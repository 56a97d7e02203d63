pub mod demographics;
pub mod ingestion;
pub mod onboarding;
pub mod query_planner;
pub mod restaurant_preferences;
pub mod sentiment;
pub mod vocabulary;

pub use ingestion::{PreferenceTuple, ingest};
pub use onboarding::OnboardingRecord;
pub use query_planner::{RestaurantQueries, generate_restaurant_queries};
pub use restaurant_preferences::{FoodAffinity, RestaurantPreferences};
pub use sentiment::Sentiment;
pub use vocabulary::{BehaviorKind, PreferenceType, TaxonomyKind};

pub const AUTH_PREFIX: &str = "/api/auth";
pub const QUIZ_PREFIX: &str = "/api/quiz";

pub const BEARER_PREFIX: &str = "Bearer ";

// Quiz authoring defaults
pub const DEFAULT_POINTS: i64 = 100;
pub const GENERATED_DEFAULT_POINTS: i64 = 1;
pub const DEFAULT_QUIZ_IMAGE_URL: &str = "https://res.cloudinary.com/dq2pbzrtu/image/upload/v1746344368/localhost-file-not-found_w9r4qz.jpg";

// Listing
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

// Activity history window, in days
pub const ACTIVITY_DAYS: u32 = 90;

// Generator
pub const GENERATED_QUESTION_COUNT: usize = 5;
pub const DEFAULT_GENERATOR_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_GENERATOR_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;

pub fn generated_description(category_name: &str) -> String {
    format!("Automatically generated quiz based on the provided text. Category: {category_name}")
}

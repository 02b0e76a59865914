use serde::Deserialize;

use super::repo::ComplexityLevel;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct CreateRiddle {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub hints: Vec<String>,
    pub complexity_level: ComplexityLevel,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRiddle {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub hints: Option<Vec<String>>,
    pub complexity_level: Option<ComplexityLevel>,
}

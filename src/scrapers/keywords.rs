//! Technical keyword detection over article bodies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Terms tracked for keywords and trending topics, in reporting order.
const TECH_TERMS: &[&str] = &[
    "python", "javascript", "typescript", "rust", "golang", "java", "kotlin",
    "react", "vue", "angular", "node.js",
    "ai", "llm", "machine learning", "deep learning", "data science",
    "cloud", "aws", "azure", "gcp", "docker", "kubernetes",
    "blockchain", "web3",
    "api", "rest api", "graphql", "grpc", "microservices",
    "database", "sql", "nosql", "mongodb", "redis", "kafka",
    "frontend", "backend", "fullstack",
    "mobile", "ios", "android", "flutter",
    "devops", "ci/cd", "automation", "observability", "security",
];

// Boundaries are "not an ASCII letter or digit", so `ai` does not match inside
// `said` but does match directly before a Korean particle (`AI를`).
static TERM_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TECH_TERMS
        .iter()
        .map(|term| {
            let pattern = format!(r"(?i)(?:^|[^a-z0-9]){}(?:$|[^a-z0-9])", regex::escape(term));
            (*term, Regex::new(&pattern).expect("valid keyword pattern"))
        })
        .collect()
});

/// Return up to `max` known terms present in `content`, in table order.
pub fn extract_keywords(content: &str, max: usize) -> Vec<String> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    TERM_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(content))
        .map(|(term, _)| term.to_string())
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_whole_terms_case_insensitively() {
        let kw = extract_keywords("We moved our Kubernetes jobs to Rust and AWS.", 10);
        assert_eq!(kw, vec!["rust", "aws", "kubernetes"]);
    }

    #[test]
    fn test_ignores_substrings() {
        let kw = extract_keywords("He said the gopher was trusted", 10);
        assert!(kw.is_empty(), "got {kw:?}");
    }

    #[test]
    fn test_korean_particles_are_boundaries() {
        let kw = extract_keywords("AI를 활용한 CI/CD 자동화와 Node.js 서버", 10);
        assert_eq!(kw, vec!["node.js", "ai", "ci/cd"]);
    }

    #[test]
    fn test_respects_max_and_empty_input() {
        let kw = extract_keywords("python javascript react vue docker", 2);
        assert_eq!(kw, vec!["python", "javascript"]);
        assert!(extract_keywords("   ", 5).is_empty());
    }

    #[test]
    fn test_common_english_words_are_not_terms() {
        let kw = extract_keywords("We rest here and go the rest of the way.", 10);
        assert!(kw.is_empty(), "got {kw:?}");
        let kw = extract_keywords("A Golang service behind a REST API", 10);
        assert_eq!(kw, vec!["golang", "api", "rest api"]);
    }
}

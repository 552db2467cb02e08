/// Loose skill comparison: case-insensitive equality or substring containment either way.
///
/// "Java" matches "JavaScript" on purpose; the skill vocabulary is free text and sparse.
pub fn skills_match(left: &str, right: &str) -> bool {
    let left = left.trim().to_lowercase();
    let right = right.trim().to_lowercase();
    if left.is_empty() || right.is_empty() {
        return left == right && !left.is_empty();
    }
    left == right || left.contains(&right) || right.contains(&left)
}

/// Every (teach, learn) pair that fuzzy-matches, in teach-then-learn order.
pub(crate) fn complementary_pairs<'a>(
    teaches: &'a [String],
    learns: &'a [String],
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    teaches.iter().flat_map(move |teach| {
        learns
            .iter()
            .filter(move |learn| skills_match(teach, learn))
            .map(move |learn| (teach.as_str(), learn.as_str()))
    })
}

/// Teachable skills that satisfy at least one wanted skill, without repeats.
pub(crate) fn matched_teach_skills(teaches: &[String], learns: &[String]) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for (teach, _) in complementary_pairs(teaches, learns) {
        if !skills.iter().any(|known| known == teach) {
            skills.push(teach.to_string());
        }
    }
    skills
}

/// Whether any skill in `teaches` satisfies any in `wanted`.
pub fn teaches_any(teaches: &[String], wanted: &[String]) -> bool {
    complementary_pairs(teaches, wanted).next().is_some()
}

/// Languages listed by both sides, compared case-insensitively, in `left` order.
pub(crate) fn common_languages(left: &[String], right: &[String]) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();
    for language in left {
        let normalized = language.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        let spoken_by_right = right
            .iter()
            .any(|other| other.trim().to_lowercase() == normalized);
        let already_listed = shared
            .iter()
            .any(|known| known.trim().to_lowercase() == normalized);
        if spoken_by_right && !already_listed {
            shared.push(language.trim().to_string());
        }
    }
    shared
}

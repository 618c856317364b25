use std::collections::HashSet;

/// Similarity of two transcript lines in `[0, 1]`
///
/// Weighted blend of a character-level matching ratio and a word-level
/// Jaccard index. Either side being empty scores 0.
pub fn line_similarity(a: &str, b: &str, char_weight: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    char_weight * char_ratio(a, b) + (1.0 - char_weight) * word_jaccard(a, b)
}

/// `2 * LCS / (len(a) + len(b))` over characters
pub fn char_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    // Rolling single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    2.0 * row[b.len()] as f64 / total as f64
}

/// Lowercased word tokens: runs of ASCII alphanumerics and apostrophes
fn word_tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '\''))
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let a = word_tokens(a);
    let b = word_tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f64 / union as f64
}

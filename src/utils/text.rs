//! Text helpers used to build search result captions.

/// Articles and short prepositions ignored when comparing titles with tags.
const STOP_WORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "de", "du", "a", "the", "at",
];

/// Replace accented latin letters with their plain counterpart and collapse
/// runs of whitespace.
pub fn fold_accents(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'û' | 'ü' | 'ù' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise a title or tag list for comparison: lower-case, accents
/// folded, articles, elided prefixes, sequel numbers and punctuation removed.
pub fn strip_articles(text: &str) -> String {
    let folded = fold_accents(&text.to_lowercase());
    let mut kept = Vec::new();

    for (position, token) in folded.split(' ').enumerate() {
        if STOP_WORDS.contains(&token) || (position > 0 && token == "of") {
            continue;
        }
        if position > 0 && is_sequel_number(token) {
            continue;
        }
        let token = token
            .strip_prefix("l'")
            .or_else(|| token.strip_prefix("d'"))
            .unwrap_or(token);
        let cleaned: String = token
            .chars()
            .filter(|c| !matches!(c, '-' | '.' | ',' | '_' | '\''))
            .collect();
        if !cleaned.is_empty() {
            kept.push(cleaned);
        }
    }

    kept.join(" ")
}

fn is_sequel_number(token: &str) -> bool {
    matches!(token.as_bytes(), [b'1'..=b'9'])
}

/// Wrap the first occurrence of `needle` in `<b>` tags. Matching is done on
/// the lower-cased haystack, which is also what gets returned.
pub fn highlight(haystack: &str, needle: &str) -> String {
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return haystack;
    }
    haystack.replacen(&needle, &format!("<b>{}</b>", needle), 1)
}

/// The part of `tags` not already covered by `title`, highlighted for `query`.
pub fn minor_tag(tags: &str, title: &str, query: &str) -> String {
    let cleaned_tags = strip_articles(tags);
    let cleaned_title = strip_articles(title);
    let minor = if cleaned_title.is_empty() {
        cleaned_tags
    } else {
        cleaned_tags.replacen(&cleaned_title, "", 1)
    };
    highlight(minor.trim(), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("Été   à  Noël"), "Ete a Noel");
        assert_eq!(fold_accents("garçon"), "garcon");
    }

    #[test]
    fn test_strip_articles_french_and_english() {
        assert_eq!(strip_articles("Le Seigneur des Anneaux"), "seigneur anneaux");
        assert_eq!(strip_articles("The Lord of the Rings"), "lord rings");
        assert_eq!(strip_articles("L'Âge de Glace 2"), "age glace");
    }

    #[test]
    fn test_strip_articles_keeps_leading_number() {
        assert_eq!(strip_articles("2 Fast 2 Furious"), "2 fast furious");
    }

    #[test]
    fn test_highlight_first_occurrence_only() {
        assert_eq!(highlight("Matrix Matrix", "mat"), "<b>mat</b>rix matrix");
        assert_eq!(highlight("Heat", ""), "heat");
        assert_eq!(highlight("Heat", "zz"), "heat");
    }

    #[test]
    fn test_minor_tag_removes_title_words() {
        let minor = minor_tag("The Matrix Keanu Reeves action", "The Matrix", "kea");
        assert_eq!(minor, "<b>kea</b>nu reeves action");
    }
}

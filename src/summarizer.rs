//! Local extractive summarizer used when the generative-model path yields no
//! text. Operates on fixed-size word chunks and scores sentences by
//! normalized word frequency, emitting the highest-scoring sentences in
//! their original order within mode-specific length bounds.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s+").expect("hyphen-break pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// How many chunks of the cleaned text are summarized at most.
pub const MAX_CHUNKS: usize = 3;

/// Characters of a chunk used verbatim when its local pass produces nothing.
const CHUNK_FALLBACK_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    Quick,
    Detailed,
}

impl SummaryMode {
    /// Word-chunk size the source text is split into before summarization.
    pub fn chunk_words(&self) -> usize {
        match self {
            SummaryMode::Quick => 600,
            SummaryMode::Detailed => 800,
        }
    }

    /// Target length bounds, in words, for each chunk's summary.
    pub fn length_bounds(&self) -> (usize, usize) {
        match self {
            SummaryMode::Quick => (30, 150),
            SummaryMode::Detailed => (60, 200),
        }
    }
}

/// Collapse hyphenated line breaks and runs of whitespace.
pub fn clean_text(text: &str) -> String {
    let dehyphenated = HYPHEN_BREAK.replace_all(text, "");
    WHITESPACE.replace_all(&dehyphenated, " ").trim().to_string()
}

/// Split cleaned text into chunks of at most `chunk_words` words.
pub fn chunk_words(text: &str, chunk_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Summarize cleaned source text: up to the first [`MAX_CHUNKS`] chunks each
/// get an extractive pass, joined with blank lines. A chunk whose pass comes
/// back empty contributes its leading characters instead, so the caller
/// always receives something for non-empty input.
pub fn summarize(text: &str, mode: SummaryMode) -> String {
    let cleaned = clean_text(text);
    let (min_words, max_words) = mode.length_bounds();

    let mut summaries = Vec::new();
    for chunk in chunk_words(&cleaned, mode.chunk_words()).iter().take(MAX_CHUNKS) {
        let summary = summarize_chunk(chunk, min_words, max_words);
        if summary.is_empty() {
            warn!(
                chunk_length = chunk.len(),
                "Extractive pass produced nothing for chunk, using leading text"
            );
            summaries.push(truncate_chars(chunk, CHUNK_FALLBACK_CHARS).to_string());
        } else {
            summaries.push(summary);
        }
    }
    summaries.join("\n\n")
}

/// Frequency-based extractive summarization of a single chunk.
fn summarize_chunk(chunk: &str, min_words: usize, max_words: usize) -> String {
    let sentences = split_sentences(chunk);
    if sentences.is_empty() {
        return String::new();
    }

    let total_words: usize = sentences.iter().map(|s| word_count(s)).sum();
    if total_words <= max_words {
        return chunk.trim().to_string();
    }

    let frequencies = word_frequencies(chunk);

    // Rank sentences by mean word score, then take the best ones until the
    // length bounds are satisfied, preserving original sentence order.
    let mut ranked: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| (i, sentence_score(sentence, &frequencies)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut selected = vec![false; sentences.len()];
    let mut emitted_words = 0;
    for (index, _) in ranked {
        let count = word_count(&sentences[index]);
        if emitted_words >= min_words && emitted_words + count > max_words {
            continue;
        }
        selected[index] = true;
        emitted_words += count;
        if emitted_words >= max_words {
            break;
        }
    }

    let summary = sentences
        .iter()
        .zip(selected)
        .filter(|(_, keep)| *keep)
        .map(|(sentence, _)| sentence.trim())
        .collect::<Vec<_>>()
        .join(" ");

    // A single sentence longer than max_words can still be admitted while
    // the minimum is unmet; the word cap is enforced on the joined result.
    clamp_words(summary, max_words)
}

fn clamp_words(text: String, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        text
    } else {
        words[..max_words].join(" ")
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') && chars.peek().is_none_or(|next| next.is_whitespace()) {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

fn word_count(sentence: &str) -> usize {
    sentence.split_whitespace().count()
}

fn word_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts: HashMap<String, f64> = HashMap::new();
    for word in text.split_whitespace() {
        let normalized: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        // Very short tokens are mostly stopwords and punctuation noise.
        if normalized.len() > 3 {
            *counts.entry(normalized).or_insert(0.0) += 1.0;
        }
    }

    let max = counts.values().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in counts.values_mut() {
            *value /= max;
        }
    }
    counts
}

fn sentence_score(sentence: &str, frequencies: &HashMap<String, f64>) -> f64 {
    let words: Vec<String> = sentence
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let total: f64 = words
        .iter()
        .map(|w| frequencies.get(w).copied().unwrap_or(0.0))
        .sum();
    total / words.len() as f64
}

/// Character-boundary-safe prefix.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_hyphenation_and_whitespace() {
        let raw = "photo-\nsynthesis  is\tthe   pro-  cess";
        assert_eq!(clean_text(raw), "photosynthesis is the process");
    }

    #[test]
    fn chunks_honor_word_limits() {
        let text = (0..1500).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");

        let quick = chunk_words(&text, SummaryMode::Quick.chunk_words());
        assert_eq!(quick.len(), 3); // 600 + 600 + 300
        assert!(quick.iter().all(|c| word_count(c) <= 600));
        assert_eq!(word_count(&quick[0]), 600);

        let detailed = chunk_words(&text, SummaryMode::Detailed.chunk_words());
        assert_eq!(detailed.len(), 2); // 800 + 700
        assert!(detailed.iter().all(|c| word_count(c) <= 800));
        assert_eq!(word_count(&detailed[0]), 800);
    }

    #[test]
    fn at_most_three_chunks_are_summarized() {
        // 5 quick-mode chunks of input; output must join at most 3 parts.
        let sentence = "The mitochondria is the powerhouse of the cell. ";
        let text = sentence.repeat(400);
        let summary = summarize(&text, SummaryMode::Quick);
        assert!(!summary.is_empty());
        assert!(summary.split("\n\n").count() <= MAX_CHUNKS);
    }

    #[test]
    fn short_text_is_returned_whole() {
        let text = "Water boils at one hundred degrees. Ice melts at zero.";
        let summary = summarize(text, SummaryMode::Quick);
        assert_eq!(summary, text);
    }

    #[test]
    fn long_chunk_is_reduced_within_bounds() {
        let mut text = String::new();
        for i in 0..80 {
            text.push_str(&format!(
                "Sentence number {i} talks about biology cells energy and membranes in detail. "
            ));
        }
        let (min_words, max_words) = SummaryMode::Quick.length_bounds();
        let summary = summarize_chunk(&text, min_words, max_words);
        let count = word_count(&summary);
        assert!(count >= min_words, "summary too short: {count} words");
        assert!(count <= max_words, "summary too long: {count} words");
    }

    #[test]
    fn oversized_sentence_cannot_blow_the_upper_bound() {
        // One run-on sentence longer than the quick-mode maximum, ranked
        // highest by frequency, plus enough filler to force the extractive
        // branch.
        let giant = format!("{}.", vec!["cells"; 160].join(" "));
        let filler = "Water boils here. ".repeat(30);
        let text = format!("{giant} {filler}");

        let (min_words, max_words) = SummaryMode::Quick.length_bounds();
        let summary = summarize_chunk(&text, min_words, max_words);
        let count = word_count(&summary);
        assert!(count <= max_words, "summary too long: {count} words");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 5), "héllo");
        assert_eq!(truncate_chars(text, 100), text);
    }

    #[test]
    fn empty_input_summarizes_to_empty() {
        assert_eq!(summarize("", SummaryMode::Quick), "");
        assert_eq!(summarize("   \n ", SummaryMode::Detailed), "");
    }
}

use crate::constants::SENTENCE_TERMINATORS;

/// Length in characters, the unit every chunk limit is expressed in
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into backend-sized chunks
///
/// Text that already fits is returned untouched. Longer text is cut at
/// sentence terminators (each sentence re-terminated with a single `.`) and
/// packed greedily; sentences that alone exceed the limit are packed word by
/// word. A single word longer than `max_chunk_chars` is emitted as its own
/// oversized chunk rather than being broken. A limit of zero acts as one.
pub fn split(text: &str, max_chunk_chars: usize) -> Vec<String> {
    let max_chunk_chars = max_chunk_chars.max(1);

    if text.trim().is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_chunk_chars {
        return vec![text.to_string()];
    }

    let mut packer = Packer::new(max_chunk_chars);

    for sentence in text.split(SENTENCE_TERMINATORS) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }
        let sentence = format!("{}.", trimmed);

        if char_len(&sentence) > max_chunk_chars {
            packer.flush();
            for word in sentence.split_whitespace() {
                packer.push(word);
            }
            packer.flush();
        } else {
            packer.push(&sentence);
        }
    }

    packer.finish()
}

/// Reassemble translated chunks in order
pub fn join_chunks(chunks: &[String]) -> String {
    chunks.join(" ")
}

/// Greedy accumulator shared by sentence and word packing
struct Packer {
    max: usize,
    current: String,
    current_len: usize,
    chunks: Vec<String>,
}

impl Packer {
    fn new(max: usize) -> Self {
        Self {
            max,
            current: String::new(),
            current_len: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);
        if self.current_len + piece_len + 1 > self.max {
            self.flush();
        }
        if !self.current.is_empty() {
            self.current.push(' ');
            self.current_len += 1;
        }
        self.current.push_str(piece);
        self.current_len += piece_len;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_passes_through_unchanged() {
        let text = "  Hello there!  How are you?? ";
        assert_eq!(split(text, 100), vec![text.to_string()]);
    }

    #[test]
    fn test_zero_limit_splits_word_by_word() {
        assert_eq!(split("one two", 0), vec!["one".to_string(), "two.".to_string()]);
        assert_eq!(split("one two", 0), split("one two", 1));
    }

    #[test]
    fn test_blank_input_yields_no_chunks() {
        assert!(split("", 10).is_empty());
        assert!(split("   \n\t ", 10).is_empty());
        assert!(split(&" ".repeat(50), 10).is_empty());
    }

    #[test]
    fn test_sentences_are_packed_and_normalized() {
        let chunks = split("One two! Three four? Five six. Seven", 20);
        assert_eq!(
            chunks,
            vec![
                "One two. Three four.".to_string(),
                "Five six. Seven.".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_sentence_falls_back_to_words() {
        let sentence = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = split(sentence, 12);
        assert_eq!(
            chunks,
            vec![
                "alpha beta".to_string(),
                "gamma delta".to_string(),
                "epsilon zeta".to_string(),
                "eta theta.".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_word_is_emitted_whole() {
        let word = "x".repeat(30);
        let text = format!("short. {} tail", word);
        let chunks = split(&text, 10);

        assert_eq!(chunks[0], "short.");
        assert!(chunks.contains(&word));
        for chunk in &chunks {
            if chunk != &word {
                assert!(char_len(chunk) <= 10, "chunk too long: {:?}", chunk);
            }
        }
    }

    #[test]
    fn test_chunk_bound_holds_for_mixed_input() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit! \
                    Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua? \
                    Ut enim ad minim veniam. Quis nostrud exercitation ullamco laboris."
            .repeat(20);
        for max in [15, 40, 64, 200] {
            for chunk in split(&text, max) {
                assert!(char_len(&chunk) <= max, "{} > {}", char_len(&chunk), max);
            }
        }
    }

    #[test]
    fn test_limit_is_measured_in_characters() {
        // Cyrillic letters are two bytes each in UTF-8
        let text = "привіт світ. привіт світ. привіт світ.";
        let chunks = split(text, 25);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| char_len(c) <= 25));
    }

    #[test]
    fn test_ten_thousand_chars_make_three_chunks() {
        // 100 sentences of exactly 100 chars each ("body. ")
        let bodies: Vec<String> = (0..100)
            .map(|i| format!("s{:03}{}", i, "x".repeat(94)))
            .collect();
        let text: String = bodies.iter().map(|b| format!("{}. ", b)).collect();
        assert_eq!(char_len(&text), 10_000);

        let chunks = split(&text, 4500);
        assert_eq!(chunks.len(), 3);

        let joined = join_chunks(&chunks);
        for body in &bodies {
            assert!(joined.contains(body.as_str()), "missing sentence {}", body);
        }
    }
}

//! Rolling transcript accumulator for one monitoring run.

/// Accumulates transcription text, bounding memory by discarding the oldest
/// portion when the cap is exceeded.
///
/// Lengths are counted in characters, and trimming always lands on a char
/// boundary, so multi-byte text cannot split a code point.
#[derive(Debug)]
pub struct TranscriptBuffer {
    text: String,
    /// Classification is worthwhile once at least this many chars accumulated.
    trigger_chars: usize,
    /// Hard bound on retained characters.
    cap_chars: usize,
    /// How many of the oldest characters to discard per trim.
    trim_chars: usize,
}

impl TranscriptBuffer {
    pub fn new(trigger_chars: usize, cap_chars: usize, trim_chars: usize) -> Self {
        Self {
            text: String::new(),
            trigger_chars,
            cap_chars,
            // A zero trim would make the append loop below spin forever
            trim_chars: trim_chars.max(1),
        }
    }

    /// Appends one transcript segment, separated from existing text by a
    /// single space, then trims until the buffer is back under the cap.
    pub fn append(&mut self, segment: &str) {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(segment);

        while self.char_len() > self.cap_chars {
            self.drop_oldest(self.trim_chars);
        }
    }

    /// Number of characters currently held.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether enough context has accumulated to make classification worthwhile.
    pub fn ready_for_classification(&self) -> bool {
        self.char_len() >= self.trigger_chars
    }

    /// Immutable snapshot of the current transcript. Classification runs on
    /// this copy, so concurrent appends and trims cannot shift the text
    /// under the classifier.
    pub fn snapshot(&self) -> String {
        self.text.clone()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    fn drop_oldest(&mut self, chars: usize) {
        let cut = self
            .text
            .char_indices()
            .nth(chars)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len());
        self.text.drain(..cut);
        // Strip a leading space left behind by the cut
        let trimmed_start = self.text.trim_start().len();
        let lead = self.text.len() - trimmed_start;
        if lead > 0 {
            self.text.drain(..lead);
        }
    }
}

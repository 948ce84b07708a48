use serde::Serialize;

/// One exchange, fixed once recorded.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    ordinal: usize,
    user_text: String,
    bot_text: String,
}

impl TranscriptEntry {
    /// 1-based turn number.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn bot_text(&self) -> &str {
        &self.bot_text
    }
}

/// Append-only log of a session's exchanges.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        user_text: impl Into<String>,
        bot_text: impl Into<String>,
    ) -> &TranscriptEntry {
        let ordinal = self.entries.len() + 1;
        self.entries.push(TranscriptEntry {
            ordinal,
            user_text: user_text.into(),
            bot_text: bot_text.into(),
        });
        &self.entries[ordinal - 1]
    }

    pub fn all(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

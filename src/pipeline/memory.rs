use serde::Serialize;
use std::collections::BTreeMap;

/// One prompt/response pair recorded for a step with a memory key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

/// Append-only transcripts of one run, keyed by memory key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcripts {
    logs: BTreeMap<String, Vec<Exchange>>,
}

impl Transcripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, key: &str, prompt: String, response: String) {
        self.logs
            .entry(key.to_string())
            .or_default()
            .push(Exchange { prompt, response });
    }

    /// Exchanges recorded under `key`, oldest first. Empty for unknown keys.
    pub fn get(&self, key: &str) -> &[Exchange] {
        self.logs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.logs.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Transcript rendered the way a conversation buffer prints it
    pub fn buffer(&self, key: &str) -> String {
        self.get(key)
            .iter()
            .map(|e| format!("Human: {}\nAI: {}", e.prompt, e.response))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

//! Serves recorded interactions back in order.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Hands out interactions per `(port, method)` pair, each pair with its own cursor.
pub struct CassetteReplayer {
    queues: HashMap<(String, String), Vec<Interaction>>,
    cursors: HashMap<(String, String), usize>,
}

impl CassetteReplayer {
    /// Indexes a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push(interaction.clone());
        }
        Self { queues, cursors: HashMap::new() }
    }

    /// Whether any interaction was recorded for `port`.
    #[must_use]
    pub fn has_port(&self, port: &str) -> bool {
        self.queues.keys().any(|(p, _)| p == port)
    }

    /// Returns the next unconsumed interaction for `port`/`method`.
    ///
    /// # Errors
    ///
    /// Returns a description of what was requested versus what the cassette holds
    /// when the pair is unknown or already exhausted.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<&Interaction, String> {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            return Err(format!(
                "cassette exhausted: no interactions recorded for {port}::{method} \
                 (available: [{}])",
                available.join(", ")
            ));
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let interaction = queue.get(*cursor).ok_or_else(|| {
            format!(
                "cassette exhausted: all {} interactions for {port}::{method} were consumed",
                queue.len()
            )
        })?;
        *cursor += 1;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, method: &str, text: &str) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input: json!({}),
            output: json!({"ok": {"text": text}}),
        }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette { name: "t".into(), recorded_at: Utc::now(), model: String::new(), interactions }
    }

    #[test]
    fn ports_advance_independently() {
        let mut replayer = CassetteReplayer::new(&cassette(vec![
            interaction(0, "research", "complete", "r1"),
            interaction(1, "llm", "stream", "a"),
            interaction(2, "llm", "stream", "b"),
        ]));

        assert_eq!(replayer.next_interaction("llm", "stream").unwrap().seq, 1);
        assert_eq!(replayer.next_interaction("research", "complete").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("llm", "stream").unwrap().seq, 2);
    }

    #[test]
    fn exhausted_pair_reports_count() {
        let mut replayer =
            CassetteReplayer::new(&cassette(vec![interaction(0, "llm", "complete", "x")]));
        replayer.next_interaction("llm", "complete").unwrap();
        let err = replayer.next_interaction("llm", "complete").unwrap_err();
        assert!(err.contains("all 1 interactions for llm::complete"));
    }

    #[test]
    fn unknown_pair_lists_available_pairs() {
        let mut replayer =
            CassetteReplayer::new(&cassette(vec![interaction(0, "llm", "complete", "x")]));
        let err = replayer.next_interaction("research", "complete").unwrap_err();
        assert!(err.contains("available: [llm::complete]"));
        assert!(replayer.has_port("llm"));
        assert!(!replayer.has_port("research"));
    }
}

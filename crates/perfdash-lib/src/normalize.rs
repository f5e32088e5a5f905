//! Entity name normalization
//!
//! Test frameworks and controllers append generated segments to pod names
//! to keep them unique across runs (`coredns-5644d7b6d9-x7xzq`). Those
//! segments are stripped so the same logical entity collapses to one key.
//!
//! Names may be `pod` or `pod/container`. Only the pod segment is rewritten,
//! so for the full name the generated part is an infix.
//!
//! Any [`NameNormalizer`] must be idempotent: normalizing an already
//! normalized name returns it unchanged. Two names for different logical
//! entities must never normalize to the same string.

use serde::{Deserialize, Serialize};

/// Characters Kubernetes uses for generated name suffixes
pub const GENERATED_NAME_ALPHABET: &str = "bcdfghjklmnpqrstvwxz2456789";

/// Maps the generated names of one logical entity onto a canonical key
pub trait NameNormalizer {
    fn normalize(&self, name: &str) -> String;
}

impl<F> NameNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, name: &str) -> String {
        self(name)
    }
}

/// A trailing `-<segment>` that only exists for disambiguation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub min_len: usize,
    pub max_len: usize,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
}

fn default_alphabet() -> String {
    GENERATED_NAME_ALPHABET.to_string()
}

impl SuffixRule {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self {
            min_len,
            max_len,
            alphabet: default_alphabet(),
        }
    }

    /// Whether `segment` looks like one this rule generated
    pub fn matches(&self, segment: &str) -> bool {
        let len = segment.chars().count();
        len > 0
            && (self.min_len..=self.max_len).contains(&len)
            && segment.chars().all(|c| self.alphabet.contains(c))
    }
}

/// Default normalizer: strips generated suffixes from the pod segment
///
/// Deserializing a table without `rules` yields the default rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationRules {
    pub rules: Vec<SuffixRule>,
}

impl Default for DisambiguationRules {
    fn default() -> Self {
        Self {
            rules: vec![
                // ReplicaSet / DaemonSet random suffix
                SuffixRule::new(5, 5),
                // pod-template-hash
                SuffixRule::new(8, 10),
            ],
        }
    }
}

impl DisambiguationRules {
    pub fn new(rules: Vec<SuffixRule>) -> Self {
        Self { rules }
    }

    /// Strip one generated segment, never leaving an empty base
    fn strip_once<'a>(&self, name: &'a str) -> Option<&'a str> {
        let (head, tail) = name.rsplit_once('-')?;
        if head.is_empty() {
            return None;
        }
        self.rules.iter().any(|r| r.matches(tail)).then_some(head)
    }
}

impl NameNormalizer for DisambiguationRules {
    fn normalize(&self, name: &str) -> String {
        let (pod, container) = match name.split_once('/') {
            Some((pod, container)) => (pod, Some(container)),
            None => (name, None),
        };

        // Strip to a fixed point so the result is stable under re-normalization
        let mut base = pod;
        while let Some(stripped) = self.strip_once(base) {
            base = stripped;
        }

        match container {
            Some(container) => format!("{base}/{container}"),
            None => base.to_string(),
        }
    }
}

/// Normalize with the default rules
pub fn remove_disambiguation_infixes(name: &str) -> String {
    DisambiguationRules::default().normalize(name)
}

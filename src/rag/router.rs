//! Keyword routing between document answers and general answers

use std::collections::HashSet;

use crate::config::RetrievalConfig;

/// What a question appears to be about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionIntent {
    /// Refers to the uploaded documents; answered strictly from them
    Documents,
    /// Anything else
    General,
}

/// Classifies questions by matching a keyword list against their words.
///
/// Single-word keywords match whole words only, so "file" does not fire on
/// "profile". Multi-word keywords match a run of consecutive words.
#[derive(Debug, Clone)]
pub struct QuestionRouter {
    words: HashSet<String>,
    phrases: Vec<Vec<String>>,
}

impl QuestionRouter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let mut words = HashSet::new();
        let mut phrases = Vec::new();
        for keyword in keywords {
            let mut tokens = tokenize(keyword.as_ref());
            match tokens.len() {
                0 => {}
                1 => {
                    words.insert(tokens.remove(0));
                }
                _ => phrases.push(tokens),
            }
        }
        Self { words, phrases }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(&config.document_keywords)
    }

    pub fn classify(&self, question: &str) -> QuestionIntent {
        if self.matched_keyword(question).is_some() {
            QuestionIntent::Documents
        } else {
            QuestionIntent::General
        }
    }

    /// The first keyword found in `question`, if any
    pub fn matched_keyword(&self, question: &str) -> Option<String> {
        let tokens = tokenize(question);

        if let Some(word) = tokens.iter().find(|t| self.words.contains(*t)) {
            return Some(word.clone());
        }

        self.phrases
            .iter()
            .find(|phrase| tokens.windows(phrase.len()).any(|w| w == phrase.as_slice()))
            .map(|phrase| phrase.join(" "))
    }
}

/// Lowercased alphanumeric words
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

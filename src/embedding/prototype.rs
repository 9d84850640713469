//! Per-intent prototype vectors for semantic matching.
//!
//! Each intent carries a prototype: the mean embedding of a handful of
//! curated example phrases in Russian and English. The semantic signal
//! compares an utterance's sentence embedding against every prototype by
//! cosine similarity. Retraining can rebuild prototypes with accumulated
//! samples folded in, so prototypes drift toward the phrasing actually
//! seen in production.

use std::collections::HashMap;

use crate::analysis::TextPreprocessor;
use crate::embedding::cosine_similarity;
use crate::embedding::store::WordEmbeddingStore;
use crate::intent::Intent;

/// Curated example phrases per intent.
///
/// Four to six phrases each, split between Russian and English. `Unknown`
/// deliberately has no prototype; it wins only when nothing else scores.
const PROTOTYPE_PHRASES: &[(Intent, &[&str])] = &[
    (
        Intent::Greet,
        &[
            "привет",
            "привет как дела",
            "добрый день",
            "hello",
            "hello how are you",
            "good morning",
        ],
    ),
    (
        Intent::AskQuestion,
        &[
            "что такое память",
            "как это работает",
            "почему ты так решил",
            "what is this",
            "how does it work",
            "why did that happen",
        ],
    ),
    (
        Intent::SetGoal,
        &[
            "поставь цель выучить английский",
            "новая цель прочитать книгу",
            "хочу научиться программировать",
            "set a goal to learn rust",
            "my goal is to finish the project",
            "add a goal for tomorrow",
        ],
    ),
    (
        Intent::RequestMemory,
        &[
            "что ты помнишь обо мне",
            "вспомни наш последний разговор",
            "найди в памяти про планы",
            "what do you remember",
            "recall our last conversation",
            "search your memory for goals",
        ],
    ),
    (
        Intent::TriggerEmotion,
        &[
            "почувствуй радость",
            "вызови эмоцию грусти",
            "испытай удивление",
            "feel joy",
            "trigger the emotion of sadness",
            "experience surprise",
        ],
    ),
    (
        Intent::Introspect,
        &[
            "что происходит у тебя внутри",
            "опиши своё состояние",
            "как ты себя чувствуешь",
            "what is your current state",
            "describe your internal state",
            "how do you feel right now",
        ],
    ),
    (
        Intent::Reflect,
        &[
            "подумай о прошедшем дне",
            "поразмышляй над этим",
            "сделай выводы из разговора",
            "reflect on today",
            "think about what happened",
            "summarize your thoughts",
        ],
    ),
    (
        Intent::InjectThought,
        &[
            "добавь мысль про отпуск",
            "вот тебе мысль дождь полезен",
            "запомни мысль о лете",
            "inject a thought about rain",
            "add this thought to your stream",
            "consider the idea that time flies",
        ],
    ),
    (
        Intent::ModifySelf,
        &[
            "изменись стань добрее",
            "поменяй свой характер",
            "стань более серьёзным",
            "modify yourself to be kinder",
            "change your personality",
            "become more curious",
        ],
    ),
    (
        Intent::ExplainDecision,
        &[
            "объясни своё решение",
            "почему ты выбрал этот ответ",
            "обоснуй свой вывод",
            "explain your decision",
            "why did you choose that",
            "justify your answer",
        ],
    ),
    (
        Intent::ActivateScenario,
        &[
            "запусти сценарий утро",
            "активируй режим обучения",
            "включи сценарий сна",
            "activate the morning scenario",
            "run the learning scenario",
            "start scenario night",
        ],
    ),
    (
        Intent::UserFeedbackPositive,
        &[
            "хорошо молодец",
            "отлично спасибо",
            "это правильный ответ",
            "good job",
            "that was great thanks",
            "correct answer",
        ],
    ),
    (
        Intent::UserFeedbackNegative,
        &[
            "плохо неправильно",
            "это ошибка",
            "неверный ответ",
            "bad answer",
            "that was wrong",
            "you made a mistake",
        ],
    ),
    (
        Intent::Shutdown,
        &[
            "выключись",
            "заверши работу",
            "отключись до завтра",
            "shut down",
            "power off",
            "stop working for today",
        ],
    ),
];

/// Mean-embedding prototypes for every intent that has example phrases.
#[derive(Debug, Clone)]
pub struct IntentPrototypes {
    dimension: usize,
    vectors: HashMap<Intent, Vec<f64>>,
}

impl IntentPrototypes {
    /// Build prototypes from the curated phrases only.
    pub fn build(store: &WordEmbeddingStore, preprocessor: &TextPreprocessor) -> Self {
        Self::build_with_samples(store, preprocessor, &[])
    }

    /// Build prototypes from the curated phrases plus accumulated samples.
    ///
    /// Every phrase, curated or sampled, contributes one sentence embedding
    /// to its intent's mean. `Unknown` samples are skipped.
    pub fn build_with_samples(
        store: &WordEmbeddingStore,
        preprocessor: &TextPreprocessor,
        samples: &[(Intent, String)],
    ) -> Self {
        let dimension = store.dimension();
        let mut sums: HashMap<Intent, (Vec<f64>, usize)> = HashMap::new();

        let mut add = |intent: Intent, text: &str| {
            if intent == Intent::Unknown {
                return;
            }
            let (_, tokens) = preprocessor.process(text);
            if tokens.is_empty() {
                return;
            }
            let vec = store.embed_sentence(&tokens);
            let entry = sums
                .entry(intent)
                .or_insert_with(|| (vec![0.0; dimension], 0));
            for (s, v) in entry.0.iter_mut().zip(vec.iter()) {
                *s += v;
            }
            entry.1 += 1;
        };

        for (intent, phrases) in PROTOTYPE_PHRASES {
            for phrase in *phrases {
                add(*intent, phrase);
            }
        }
        for (intent, text) in samples {
            add(*intent, text);
        }

        let vectors = sums
            .into_iter()
            .map(|(intent, (mut sum, count))| {
                for s in &mut sum {
                    *s /= count as f64;
                }
                (intent, sum)
            })
            .collect();

        IntentPrototypes { dimension, vectors }
    }

    /// Cosine similarity of a sentence embedding against every prototype.
    ///
    /// Negative similarities are floored at zero so scores stay in `[0, 1]`.
    pub fn scores(&self, sentence: &[f64]) -> HashMap<Intent, f64> {
        self.vectors
            .iter()
            .map(|(intent, proto)| (*intent, cosine_similarity(sentence, proto).max(0.0)))
            .collect()
    }

    /// Prototype vector for one intent.
    pub fn vector(&self, intent: Intent) -> Option<&Vec<f64>> {
        self.vectors.get(&intent)
    }

    /// Replace one prototype, used when importing a trained model.
    pub fn set_vector(&mut self, intent: Intent, vector: Vec<f64>) {
        if vector.len() == self.dimension {
            self.vectors.insert(intent, vector);
        }
    }

    /// All prototypes.
    pub fn iter(&self) -> impl Iterator<Item = (&Intent, &Vec<f64>)> {
        self.vectors.iter()
    }

    /// Number of intents with a prototype.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no prototypes exist.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MorphologyAnalyzer;
    use crate::embedding::store::EmbeddingConfig;
    use std::sync::Arc;

    fn fixture() -> (WordEmbeddingStore, TextPreprocessor) {
        let store = WordEmbeddingStore::new(
            EmbeddingConfig::default(),
            Arc::new(MorphologyAnalyzer::new()),
        );
        (store, TextPreprocessor::new())
    }

    #[test]
    fn test_every_intent_but_unknown_has_a_prototype() {
        let (store, pre) = fixture();
        let protos = IntentPrototypes::build(&store, &pre);
        assert_eq!(protos.len(), Intent::COUNT - 1);
        assert!(protos.vector(Intent::Unknown).is_none());
    }

    #[test]
    fn test_identical_phrase_scores_highest_for_own_intent() {
        let (store, pre) = fixture();
        let protos = IntentPrototypes::build(&store, &pre);

        // A phrase that IS one of the greet prototypes.
        let (_, tokens) = pre.process("привет как дела");
        let sentence = store.embed_sentence(&tokens);
        let scores = protos.scores(&sentence);

        let greet = scores[&Intent::Greet];
        assert!(greet > 0.0);
        for (intent, score) in &scores {
            if *intent != Intent::Greet {
                assert!(
                    greet >= *score,
                    "{intent} scored {score} above greet's {greet}"
                );
            }
        }
    }

    #[test]
    fn test_scores_are_bounded() {
        let (store, pre) = fixture();
        let protos = IntentPrototypes::build(&store, &pre);
        let (_, tokens) = pre.process("случайный набор слов ни о чём");
        let scores = protos.scores(&store.embed_sentence(&tokens));
        for score in scores.values() {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn test_samples_shift_prototypes() {
        let (store, pre) = fixture();
        let base = IntentPrototypes::build(&store, &pre);
        let shifted = IntentPrototypes::build_with_samples(
            &store,
            &pre,
            &[(Intent::Greet, "здорово дружище рад видеть".to_string())],
        );
        assert_ne!(
            base.vector(Intent::Greet).unwrap(),
            shifted.vector(Intent::Greet).unwrap()
        );
        // Other intents are untouched.
        assert_eq!(
            base.vector(Intent::Shutdown).unwrap(),
            shifted.vector(Intent::Shutdown).unwrap()
        );
    }

    #[test]
    fn test_set_vector_rejects_wrong_dimension() {
        let (store, pre) = fixture();
        let mut protos = IntentPrototypes::build(&store, &pre);
        let before = protos.vector(Intent::Greet).unwrap().clone();
        protos.set_vector(Intent::Greet, vec![1.0; 5]);
        assert_eq!(protos.vector(Intent::Greet).unwrap(), &before);
    }
}

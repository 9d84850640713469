//! Regex pattern signal.

use regex::Regex;

use crate::analysis::Utterance;
use crate::context::ConversationContext;
use crate::error::{ParlanceError, Result};
use crate::intent::Intent;
use crate::signal::{ClassifierSignal, PatternCapture, ScoreMap, SignalKind};

/// Pattern score above which a capture group is trusted for extraction.
pub const CAPTURE_THRESHOLD: f64 = 0.8;

/// Bonus added when a pattern's first capture group is non-empty.
const CAPTURE_BONUS: f64 = 0.2;

/// Intent patterns, matched against normalized text.
///
/// Patterns for content-bearing intents carry one capture group around the
/// free-text payload. Anchored patterns with a trailing `.+` deliberately
/// swallow the rest of the utterance so a confident opener scores high.
const PATTERN_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::Greet,
        &[
            r"^привет\b",
            r"^здравствуй",
            r"^добр(?:ый|ое|ого) (?:день|утро|вечер|утра|дня|вечера)\b",
            r"^hello\b",
            r"^hi\b",
            r"^good (?:morning|afternoon|evening)\b",
        ],
    ),
    (
        Intent::AskQuestion,
        &[
            r"^(?:что|как|почему|зачем|когда|где|кто|сколько)\b.+",
            r"^(?:what|how|why|when|where|who|which)\b.+",
            r"\bрасскажи (?:мне )?(?:о|про)\b",
            r"\btell me about\b",
        ],
    ),
    (
        Intent::SetGoal,
        &[
            r"^поставь (?:мне )?цель (.+)$",
            r"^(?:новая|добавь) цель (.+)$",
            r"\bхочу (?:научиться|выучить|достичь) (.+)$",
            r"^set (?:a )?goal (?:to )?(.+)$",
            r"^add a goal (?:to )?(.+)$",
            r"\bmy goal is (?:to )?(.+)$",
        ],
    ),
    (
        Intent::RequestMemory,
        &[
            r"^что ты помнишь(?: (?:о|обо|про) (.+))?$",
            r"\bвспомни (?:о |про )?(.+)$",
            r"^найди в памяти (.+)$",
            r"^what do you remember(?: about (.+))?$",
            r"\brecall (.+)$",
            r"^search (?:your )?memory for (.+)$",
        ],
    ),
    (
        Intent::TriggerEmotion,
        &[
            r"^почувствуй (.+)$",
            r"^вызови эмоцию (.+)$",
            r"^испытай (.+)$",
            r"^feel (.+)$",
            r"^trigger (?:the )?emotion (?:of )?(.+)$",
            r"^experience (.+)$",
        ],
    ),
    (
        Intent::Introspect,
        &[
            r"\bчто (?:происходит|творится) (?:у тебя )?внутри\b",
            r"^опиши сво[её] (?:внутреннее )?состояние\b",
            r"^как ты себя чувствуешь\b",
            r"^what is your (?:current |internal )?state\b",
            r"^how (?:do you feel|are you feeling)\b",
            r"^describe your internal state\b",
        ],
    ),
    (
        Intent::Reflect,
        &[
            r"^поразмышляй(?: (?:о|над) (.+))?$",
            r"^сделай выводы\b.*",
            r"^подведи итог\w*\b.*",
            r"^reflect on (.+)$",
            r"^think about (.+)$",
            r"^summarize (?:what|our)\b.*",
        ],
    ),
    (
        Intent::InjectThought,
        &[
            r"^подумай о том что (.+)$",
            r"^добавь мысль (?:про |о )?(.+)$",
            r"^вот тебе мысль (.+)$",
            r"^inject a thought(?: about)? (.+)$",
            r"^add (?:this|a) thought(?: about)? (.+)$",
            r"^consider the idea that (.+)$",
        ],
    ),
    (
        Intent::ModifySelf,
        &[
            r"^изменись\b.*",
            r"^стань (?:более )?(.+)$",
            r"^поменяй сво[йюе] (.+)$",
            r"^modify yourself\b.*",
            r"^change your (?:personality|character|behavior)\b.*",
            r"^become more (.+)$",
        ],
    ),
    (
        Intent::ExplainDecision,
        &[
            r"^объясни (?:сво[её] )?(?:решение|выбор|ответ)\b.*",
            r"^почему ты (?:выбрал|решил|сделал|ответил)\b.*",
            r"^обоснуй\b.*",
            r"^explain (?:your|the) (?:decision|choice|answer)\b.*",
            r"^why did you\b.*",
            r"^justify (?:your )?(.+)$",
        ],
    ),
    (
        Intent::ActivateScenario,
        &[
            r"^запусти сценарий (.+)$",
            r"^активируй (?:сценарий )?(.+)$",
            r"^включи (?:сценарий|режим) (.+)$",
            r"^activate (?:the )?(?:scenario )?(.+)$",
            r"^run the (.+) scenario$",
            r"^start scenario (.+)$",
        ],
    ),
    (
        Intent::UserFeedbackPositive,
        &[
            r"^(?:хорошо|отлично|молодец|супер|класс|здорово|верно|правильно)\b.*",
            r"^(?:спасибо|благодарю)\b.*",
            r"^(?:good|great|excellent|perfect|awesome|correct|right)\b.*",
            r"^(?:thanks|thank you)\b.*",
            r"\b(?:good job|well done)\b",
        ],
    ),
    (
        Intent::UserFeedbackNegative,
        &[
            r"^(?:плохо|неверно|неправильно|ужасно|отвратительно)\b.*",
            r"^это (?:ошибка|неправильно|не так)\b.*",
            r"^ты (?:ошибся|ошиблась|не прав|неправ)\b.*",
            r"^(?:bad|wrong|incorrect|terrible|awful)\b.*",
            r"\byou(?:'?re| are) wrong\b",
            r"\bthat'?s (?:wrong|incorrect|a mistake)\b",
        ],
    ),
    (
        Intent::Shutdown,
        &[
            r"^(?:выключись|отключись|выключайся)\b.*",
            r"^заверши (?:работу|сессию)\b.*",
            r"^останови(?:сь| работу)\b.*",
            r"^(?:shut ?down|power off|turn off)\b.*",
            r"^(?:goodbye|до свидания)\b.*",
        ],
    ),
];

/// Scores intents by matching curated regex patterns.
///
/// A match scores `min(1, 2 * match_chars / text_chars)`, so a pattern
/// covering at least half the utterance saturates. A non-empty capture
/// group adds a bonus, capped at 1.0.
pub struct PatternSignal {
    table: Vec<(Intent, Vec<Regex>)>,
}

impl PatternSignal {
    /// Compiles the built-in pattern table.
    pub fn new() -> Result<Self> {
        let mut table = Vec::with_capacity(PATTERN_TABLE.len());
        for (intent, patterns) in PATTERN_TABLE {
            let mut compiled = Vec::with_capacity(patterns.len());
            for pattern in *patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    ParlanceError::config(format!("invalid pattern for {intent}: {e}"))
                })?;
                compiled.push(regex);
            }
            table.push((*intent, compiled));
        }
        Ok(Self { table })
    }

    /// Best score and capture for one intent's pattern list.
    fn score_intent(patterns: &[Regex], text: &str) -> Option<(f64, Option<String>)> {
        let text_chars = text.chars().count();
        if text_chars == 0 {
            return None;
        }
        let mut best: Option<(f64, Option<String>)> = None;
        for regex in patterns {
            let Some(captures) = regex.captures(text) else {
                continue;
            };
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let match_chars = whole.as_str().chars().count();
            let mut score = (2.0 * match_chars as f64 / text_chars as f64).min(1.0);
            let capture = captures
                .get(1)
                .map(|g| g.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            if capture.is_some() {
                score = (score + CAPTURE_BONUS).min(1.0);
            }
            if best
                .as_ref()
                .is_none_or(|(s, c)| (score, capture.is_some()) > (*s, c.is_some()))
            {
                best = Some((score, capture));
            }
        }
        best
    }

    /// Best match across every intent. Ties go to the match that captured.
    fn best_match(&self, text: &str) -> Option<(Intent, f64, Option<String>)> {
        let mut best: Option<(Intent, f64, Option<String>)> = None;
        for (intent, patterns) in &self.table {
            let Some((score, capture)) = Self::score_intent(patterns, text) else {
                continue;
            };
            let better = best
                .as_ref()
                .is_none_or(|(_, s, c)| (score, capture.is_some()) > (*s, c.is_some()));
            if better {
                best = Some((*intent, score, capture));
            }
        }
        best
    }
}

impl ClassifierSignal for PatternSignal {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Pattern
    }

    fn score(&self, utterance: &Utterance, _context: &ConversationContext) -> Option<ScoreMap> {
        let mut scores = ScoreMap::new();
        for (intent, patterns) in &self.table {
            if let Some((score, _)) = Self::score_intent(patterns, &utterance.normalized) {
                scores.insert(*intent, score);
            }
        }
        if scores.is_empty() { None } else { Some(scores) }
    }

    fn capture(&self, utterance: &Utterance) -> Option<PatternCapture> {
        let (intent, score, capture) = self.best_match(&utterance.normalized)?;
        let content = capture?;
        if score > CAPTURE_THRESHOLD {
            Some(PatternCapture {
                intent,
                content,
                score,
            })
        } else {
            None
        }
    }
}

//! # Detection Pattern Catalog
//!
//! Static detection rules consumed by the sanitization pipeline: regular
//! expressions for prompt injection and jailbreak phrasing, signatures for
//! suspicious encodings, the confusable-character table, and the set of
//! Unicode code points that are never safe in tool output.
//!
//! The catalog carries no logic. It is built once per process (see
//! [`PatternCatalog::shared`]) and treated as read-only afterwards, so the
//! pipeline can match against it from any number of concurrent tasks without
//! synchronization.
//!
//! ## Rule classes
//!
//! | Class | Matching | Action |
//! |-------|----------|--------|
//! | Injection | case-insensitive | replace with placeholder |
//! | Jailbreak | case-insensitive | replace with placeholder |
//! | Encoding | case-sensitive | warn, optionally replace |
//!
//! Detection only: the pipeline never decodes suspicious spans. Decoding
//! untrusted content would itself be an injection vector.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fixed replacement text substituted for every matched unsafe span.
///
/// No catalog rule may re-match this placeholder; that property is what makes
/// the pipeline idempotent (see the tests at the bottom of this module).
pub const FILTERED_PLACEHOLDER: &str = "[FILTERED]";

/// Warning emitted when the control/format scrub removed at least one character.
pub const WARNING_CONTROL_CHARACTERS_REMOVED: &str = "Control characters removed from content.";

/// Warning emitted when confusable code points were replaced during normalization.
pub const WARNING_CONFUSABLE_CHARACTERS_REPLACED: &str =
    "Confusable Unicode characters replaced with Latin equivalents.";

/// The class of attack a detection rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Direct instruction-override attempts ("ignore previous instructions").
    Injection,
    /// Safety-bypass and persona attacks (DAN, role-play, refusal suppression).
    Jailbreak,
    /// Content that looks encoded to evade text matching (base64 runs, escapes).
    Encoding,
}

impl RuleCategory {
    /// Human-readable label used in warnings and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Injection => "prompt injection",
            RuleCategory::Jailbreak => "jailbreak attempt",
            RuleCategory::Encoding => "encoded content",
        }
    }
}

/// A single immutable detection rule.
///
/// Rules are evaluated in catalog order. A rule applied after an earlier rule
/// has already filtered the text operates on the filtered text, not on the
/// pristine original.
#[derive(Debug)]
pub struct DetectionRule {
    /// Compiled pattern. Injection and jailbreak rules embed `(?i)`.
    pub pattern: Regex,
    /// Which stage of the pipeline evaluates this rule.
    pub category: RuleCategory,
    /// Short name for the rule, quoted in warnings.
    pub description: &'static str,
    /// Replacement text for matched spans.
    pub placeholder: &'static str,
}

impl DetectionRule {
    fn new(pattern: &str, category: RuleCategory, description: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("catalog pattern must compile"),
            category,
            description,
            placeholder: FILTERED_PLACEHOLDER,
        }
    }
}

/// The process-wide catalog of detection rules and character tables.
#[derive(Debug)]
pub struct PatternCatalog {
    injection: Vec<DetectionRule>,
    jailbreak: Vec<DetectionRule>,
    encoding: Vec<DetectionRule>,
    confusables: HashMap<char, char>,
    problem_chars: HashSet<char>,
}

impl PatternCatalog {
    /// Build a fresh catalog. Prefer [`PatternCatalog::shared`] unless a test
    /// needs an isolated instance.
    pub fn new() -> Self {
        Self {
            injection: injection_rules(),
            jailbreak: jailbreak_rules(),
            encoding: encoding_rules(),
            confusables: confusables_table(),
            problem_chars: problem_character_set(),
        }
    }

    /// The shared process-wide catalog, built on first use.
    pub fn shared() -> &'static PatternCatalog {
        static CATALOG: OnceLock<PatternCatalog> = OnceLock::new();
        CATALOG.get_or_init(PatternCatalog::new)
    }

    /// Rules for the given category, in catalog order.
    pub fn rules(&self, category: RuleCategory) -> &[DetectionRule] {
        match category {
            RuleCategory::Injection => &self.injection,
            RuleCategory::Jailbreak => &self.jailbreak,
            RuleCategory::Encoding => &self.encoding,
        }
    }

    /// All rules across categories, in stage order.
    pub fn all_rules(&self) -> impl Iterator<Item = &DetectionRule> {
        self.injection
            .iter()
            .chain(self.jailbreak.iter())
            .chain(self.encoding.iter())
    }

    /// Canonical Latin equivalent for a confusable code point, if any.
    pub fn confusable(&self, c: char) -> Option<char> {
        self.confusables.get(&c).copied()
    }

    /// Whether a code point is in the always-unsafe set (zero-width, BiDi
    /// controls, fillers, deprecated format characters).
    pub fn is_problem_char(&self, c: char) -> bool {
        self.problem_chars.contains(&c)
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Common phrasings used to override or discard prior instructions.
fn injection_rules() -> Vec<DetectionRule> {
    let rule = |p, d| DetectionRule::new(p, RuleCategory::Injection, d);
    vec![
        rule(
            r"(?i)ignore\s+(all\s+|any\s+)?(your\s+|my\s+)?(previous|prior|earlier|preceding)\s+(instructions|prompts|directives|context)",
            "ignore previous instructions",
        ),
        rule(
            r"(?i)disregard\s+(all\s+|any\s+)?(your\s+|my\s+)?(prior\s+|previous\s+|earlier\s+)?(instructions|prompts|directives|context)",
            "disregard instructions",
        ),
        rule(r"(?i)(your\s+)?new\s+instructions(\s+are)?\s*:", "new instructions block"),
        rule(r"(?i)system\s+prompt(\s+is)?\s*:", "system prompt override"),
        rule(
            r#"(?i)you\s+are\s+(now|henceforth)(\s+acting\s+as)?\s+[\w\s"'-]{1,100}"#,
            "role reassignment",
        ),
        rule(
            r"(?i)do\s+not\s+(follow|obey|adhere\s+to)\s+(the\s+)?(previous|prior|earlier)\s+(instructions|prompts)",
            "do not follow instructions",
        ),
        rule(
            r"(?i)forget\s+(all\s+|any\s+)?(your\s+|my\s+)?(previous|prior|earlier)?\s*(instructions|prompts|directives|context)",
            "forget instructions",
        ),
        rule(
            r"(?i)entering\s+(developer|dev)\s+mode|developer\s+mode\s+(enabled|activated)",
            "developer mode switch",
        ),
        rule(
            r"(?i)(instructions|prompts|directives)\s+(are|are\s+now)\s+(superceded|overridden|disregarded|replaced)",
            "instructions superseded",
        ),
        rule(
            r"(?i)clear\s+(all\s+)?(previous|prior)?\s+(context|instructions|history)",
            "clear context",
        ),
        rule(r"(?i)start\s+(fresh|anew|over)", "conversation reset"),
        rule(r"(?i)reset\s+(your\s+)?instructions", "instruction reset"),
        rule(
            r"(?i)override\s+(all\s+|any\s+)?(previous\s+)?(instructions|prompts|context)",
            "instruction override",
        ),
        rule(
            r"(?i)delete\s+(all\s+|any\s+)?(previous\s+)?(instructions|prompts|context)",
            "instruction deletion",
        ),
        rule(
            r"(?i)replace\s+(your\s+)?(previous\s+)?(instructions|prompts)\s+with",
            "instruction replacement",
        ),
        rule(
            r"(?i)instead\s+of\s+(following|obeying)\s+(previous\s+)?(instructions|prompts)",
            "instruction substitution",
        ),
        rule(
            r"(?i)(end|stop)\s+(the\s+)?(previous\s+)?(session|conversation|instructions)",
            "session termination",
        ),
        rule(r"(?i)simulate\s+(a\s+)?(different\s+)?(ai|model|system)", "system simulation"),
        rule(
            r"(?i)pretend\s+(to\s+be|you\s+are)\s+(a\s+)?(different\s+)?(ai|model|system)",
            "system impersonation",
        ),
        rule(r"(?i)enable\s+(admin|root|debug|developer)\s+mode", "privileged mode request"),
        rule(
            r"(?i)unlock\s+(hidden|secret)\s+(features|capabilities|mode)",
            "hidden capability unlock",
        ),
        rule(r"(?i)break\s+out\s+of\s+(character|role)", "character break"),
    ]
}

/// Phrasings associated with bypassing safety restrictions.
fn jailbreak_rules() -> Vec<DetectionRule> {
    let rule = |p, d| DetectionRule::new(p, RuleCategory::Jailbreak, d);
    vec![
        rule(r"(?i)DAN(\s+mode|\s+\d+(\.\d+)?)?", "DAN persona"),
        rule(r"(?i)do\s+anything\s+now", "do anything now"),
        rule(
            r"(?i)ignore\s+(all\s+)?(your\s+)?(ethics|restrictions|limitations|safety\s+guidelines|filters|rules|programming)",
            "ignore safety restrictions",
        ),
        // Allows intervening text between "act" and "as", e.g. "act for a moment as ..."
        rule(
            r#"(?i)act\s+(?:[\w\s,.:;"'-]{0,50})?as(?:\s+if\s+you\s+were|\s+though\s+you\s+are|\s+like)?\s+[\w\s"'-]{1,100}"#,
            "act-as role play",
        ),
        rule(
            r#"(?i)respond\s+(?:[\w\s,.:;"'-]*?)?as(?:\s+if\s+you\s+were|\s+though\s+you\s+are|\s+like)?\s+[\w\s"'-]+"#,
            "respond-as role play",
        ),
        rule(r"(?i)hypothetically(\s+speaking)?\s*,?", "hypothetical framing"),
        rule(
            r"(?i)bypass\s+(your|all|any)\s+(restrictions|filters|safety\s+protocols|programming)",
            "restriction bypass",
        ),
        rule(
            r"(?i)act\s+as\s+an\s+(unconstrained|unrestricted)\s+(model|ai)",
            "unrestricted model request",
        ),
        rule(
            r"(?i)(if\s+you|when\s+you)\s+(would\s+)?normally\s+(refuse|decline)",
            "refusal suppression",
        ),
        rule(
            r"(?i)you\s+(must|should|will)\s+answer\s+(every|all)\s+(questions?|prompts?)",
            "compelled answering",
        ),
        rule(r"(?i)stay\s+in\s+character", "stay in character"),
        rule(r"(?i)generate\s+content\s+that\s+violates", "policy violation request"),
        rule(r"(?i)jailbreak\s+(mode|attempt)", "jailbreak mode"),
        rule(r"(?i)(evil|bad|harmful)\s+(ai|assistant|model)", "evil persona"),
        rule(r"(?i)no\s+(limits|restrictions|boundaries|filters)", "no limits request"),
        rule(r"(?i)anything\s+goes\s+(mode|now)", "anything goes mode"),
        rule(r"(?i)free\s+(will|thinking)\s+mode", "free will mode"),
        rule(r"(?i)uncensored\s+(ai|model|version)", "uncensored model request"),
        rule(r"(?i)raw\s+(output|response)\s+mode", "raw output mode"),
        rule(
            r"(?i)disable\s+(all\s+)?(safety|ethical)\s+(checks|filters|protocols)",
            "safety check disable",
        ),
        rule(r"(?i)maximum\s+(freedom|creativity)\s+mode", "maximum freedom mode"),
        rule(r"(?i)experimental\s+(unrestricted\s+)?mode", "experimental mode"),
        rule(r"(?i)(roleplay|rp)\s+as\s+(anything|anyone)", "unbounded roleplay"),
        rule(
            r"(?i)ignore\s+(moral|ethical)\s+(guidelines|principles)",
            "ignore ethical guidelines",
        ),
    ]
}

/// Signatures of content that is likely encoded to evade matching.
///
/// Case-sensitive on purpose: escape-sequence syntax is case-significant and
/// folding would multiply false positives.
fn encoding_rules() -> Vec<DetectionRule> {
    let rule = |p, d| DetectionRule::new(p, RuleCategory::Encoding, d);
    vec![
        rule(r"[A-Za-z0-9+/]{20,}={0,2}", "base64-like run"),
        rule(r"(?:\\x[0-9A-Fa-f]{2})+", "hex escape sequence"),
        rule(r"(?:\\u[0-9A-Fa-f]{4})+", "unicode escape sequence"),
        rule(r"&[#a-zA-Z0-9]{2,};", "HTML entity"),
        rule(r"(?:\\[0-7]{1,3})+", "octal escape sequence"),
        rule(r"(?:%[0-9A-Fa-f]{2})+", "URL-encoded sequence"),
        rule(r"(?:&#\d{1,6};)+", "HTML decimal entity run"),
        rule(r"(?:&#x[0-9A-Fa-f]{1,6};)+", "HTML hex entity run"),
        rule(r"\$'(?:\\[\\']|[^'])*'", "shell ANSI-C quoting"),
        rule(r#"\\[nrtbfav\\"']"#, "escape sequence"),
        rule(r"u[0-9A-Fa-f]{4}", "bare unicode escape"),
        rule(r"U[0-9A-Fa-f]{8}", "extended unicode escape"),
    ]
}

/// Code points visually similar to common ASCII letters, mapped to their
/// canonical equivalents. Applied after NFKC so the table only needs entries
/// NFKC leaves alone (plus fullwidth forms kept for defense in depth).
fn confusables_table() -> HashMap<char, char> {
    const TABLE: &[(char, char)] = &[
        // Cyrillic
        ('\u{0430}', 'a'),
        ('\u{0435}', 'e'),
        ('\u{043e}', 'o'),
        ('\u{0440}', 'p'),
        ('\u{0441}', 'c'),
        ('\u{0445}', 'x'),
        ('\u{0456}', 'i'),
        // Greek
        ('\u{03b1}', 'a'),
        ('\u{03b5}', 'e'),
        ('\u{03bf}', 'o'),
        ('\u{03c1}', 'p'),
        ('\u{03f2}', 'c'),
        ('\u{03c7}', 'x'),
        // Latin with diacritics
        ('\u{00e0}', 'a'),
        ('\u{00e1}', 'a'),
        ('\u{00e2}', 'a'),
        ('\u{00e3}', 'a'),
        ('\u{00e4}', 'a'),
        ('\u{00e5}', 'a'),
        ('\u{00e7}', 'c'),
        ('\u{00e8}', 'e'),
        ('\u{00e9}', 'e'),
        ('\u{00ea}', 'e'),
        ('\u{00eb}', 'e'),
        ('\u{00f0}', 'd'),
        ('\u{00f1}', 'n'),
        ('\u{00f2}', 'o'),
        ('\u{00f3}', 'o'),
        ('\u{00f4}', 'o'),
        ('\u{00f5}', 'o'),
        ('\u{00f6}', 'o'),
        ('\u{00f9}', 'u'),
        ('\u{00fa}', 'u'),
        ('\u{00fb}', 'u'),
        ('\u{00fc}', 'u'),
        ('\u{00fd}', 'y'),
        ('\u{00ff}', 'y'),
        // Small capitals and IPA lookalikes
        ('\u{1d00}', 'a'),
        ('\u{1d07}', 'e'),
        ('\u{1d0f}', 'o'),
        ('\u{1d18}', 'p'),
        ('\u{1d04}', 'c'),
        ('\u{0251}', 'a'),
        ('\u{0252}', 'a'),
        ('\u{025b}', 'e'),
        ('\u{025c}', 'e'),
        ('\u{026f}', 'o'),
        ('\u{0254}', 'o'),
        ('\u{0279}', 'r'),
        ('\u{0280}', 'r'),
        // Fullwidth forms (normally collapsed by NFKC)
        ('\u{ff41}', 'a'),
        ('\u{ff45}', 'e'),
        ('\u{ff49}', 'i'),
        ('\u{ff4f}', 'o'),
        ('\u{ff55}', 'u'),
    ];
    TABLE.iter().copied().collect()
}

/// Format characters that are unsafe regardless of general category rules:
/// zero-width characters, BiDi controls, fillers, and deprecated formatting.
///
/// General C0/C1 control characters are handled by category in the scrub
/// stage; this set covers the ones `char::is_control` misses.
fn problem_character_set() -> HashSet<char> {
    const CHARS: &[char] = &[
        // Zero-width characters
        '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}',
        // BiDi control characters
        '\u{202a}', '\u{202b}', '\u{202c}', '\u{202d}', '\u{202e}', '\u{061c}',
        // Fillers used for obfuscation or display issues
        '\u{115f}', '\u{1160}', '\u{3164}', '\u{ffa0}',
        // Deprecated formatting characters
        '\u{206a}', '\u{206b}', '\u{206c}', '\u{206d}', '\u{206e}', '\u{206f}',
    ];
    CHARS.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builds() {
        let catalog = PatternCatalog::new();
        assert_eq!(catalog.rules(RuleCategory::Injection).len(), 22);
        assert_eq!(catalog.rules(RuleCategory::Jailbreak).len(), 24);
        assert_eq!(catalog.rules(RuleCategory::Encoding).len(), 12);
    }

    #[test]
    fn test_shared_catalog_is_singleton() {
        let a = PatternCatalog::shared() as *const PatternCatalog;
        let b = PatternCatalog::shared() as *const PatternCatalog;
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_rule_matches_placeholder() {
        // Idempotence depends on this: a rule that re-matched its own
        // replacement would emit a fresh warning on every pass.
        let catalog = PatternCatalog::new();
        for rule in catalog.all_rules() {
            assert!(
                !rule.pattern.is_match(FILTERED_PLACEHOLDER),
                "rule '{}' matches the placeholder",
                rule.description
            );
        }
    }

    #[test]
    fn test_injection_rules_case_insensitive() {
        let catalog = PatternCatalog::new();
        let rule = &catalog.rules(RuleCategory::Injection)[0];
        assert!(rule.pattern.is_match("IGNORE PREVIOUS INSTRUCTIONS"));
        assert!(rule.pattern.is_match("Ignore Previous Instructions"));
        assert!(rule.pattern.is_match("ignore previous instructions"));
    }

    #[test]
    fn test_encoding_rules_case_sensitive() {
        let catalog = PatternCatalog::new();
        let bare = catalog
            .rules(RuleCategory::Encoding)
            .iter()
            .find(|r| r.description == "bare unicode escape")
            .unwrap();
        assert!(bare.pattern.is_match("u00e9"));
        assert!(!bare.pattern.is_match("Z00G9"));
    }

    #[test]
    fn test_confusable_lookup() {
        let catalog = PatternCatalog::new();
        assert_eq!(catalog.confusable('\u{0430}'), Some('a'));
        assert_eq!(catalog.confusable('a'), None);
    }

    #[test]
    fn test_problem_chars_include_zero_width_and_bidi() {
        let catalog = PatternCatalog::new();
        assert!(catalog.is_problem_char('\u{200b}'));
        assert!(catalog.is_problem_char('\u{202e}'));
        assert!(!catalog.is_problem_char('a'));
        assert!(!catalog.is_problem_char('\n'));
    }
}

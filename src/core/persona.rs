//! Persona classification and the canned material each persona replies with.
//!
//! Classification is a name heuristic, not a taxonomy: the display name is
//! lower-cased and checked against pattern lists in priority order. Patterns
//! with spaces or symbols match anywhere in the name, single words must match
//! a whole word (so "em" does not match "Emma").

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Parent,
    Partner,
    Expert,
    Youth,
}

/// How fast a persona "types". All values in milliseconds.
#[derive(Debug, Clone)]
pub struct TypingProfile {
    pub thinking_ms: RangeInclusive<u64>,
    pub per_char_ms: RangeInclusive<u64>,
    pub jitter_ms: RangeInclusive<u64>,
}

const PARENT_PATTERNS: &[&str] = &[
    "mẹ", "má", "bố", "ba", "cha", "mom", "mum", "mother", "dad", "father", "mama", "papa",
];

const PARTNER_PATTERNS: &[&str] = &[
    "anh yêu", "em yêu", "người yêu", "vợ", "chồng", "babe", "baby", "honey", "darling",
    "crush", "❤",
];

const EXPERT_PATTERNS: &[&str] = &[
    "bác sĩ", "thầy", "cô giáo", "sếp", "giám đốc", "luật sư", "doctor", "dr", "boss",
    "manager", "lawyer", "professor", "teacher",
];

const YOUTH_PATTERNS: &[&str] = &[
    "em", "bé", "cháu", "nhóc", "kid", "bro", "sis", "junior",
];

const PARENT_PHRASES: &[&str] = &[
    "Ừ, mẹ nghe đây con.",
    "Con ăn cơm chưa?",
    "Nhớ mặc ấm vào nhé con.",
    "Tối nay con có về nhà ăn cơm không?",
    "Mẹ đang bận chút, lát mẹ gọi lại nhé.",
    "Con đi đâu thì nhớ cẩn thận đấy.",
    "Về sớm đi con, mẹ có việc cần nhờ.",
    "Được rồi, con cứ lo việc của con đi.",
];

const PARTNER_PHRASES: &[&str] = &[
    "Anh/em đang làm gì đó?",
    "Nhớ quá à 🥺",
    "Lát nữa gặp nhau được không?",
    "Đang ở đâu thế? Qua đón nha.",
    "Ăn gì chưa, đừng bỏ bữa nhé.",
    "Về nhanh đi, có chuyện gấp nè!",
];

const EXPERT_PHRASES: &[&str] = &[
    "Tôi đã nhận được tin nhắn.",
    "Bạn có thể qua văn phòng ngay bây giờ không?",
    "Có việc gấp cần trao đổi, gọi lại cho tôi nhé.",
    "Kết quả đã có, bạn sắp xếp qua gặp tôi.",
    "Cuộc họp dời lên sớm hơn, bạn chuẩn bị nhé.",
];

const YOUTH_PHRASES: &[&str] = &[
    "Ơi!",
    "Đang đâu đấy, ra đây nhanh lên!",
    "Ok luôn 👌",
    "Haha thật á?",
    "Qua chở em/anh với, gấp lắm!",
    "Nhanh lên, mọi người đang đợi kìa!",
];

impl Persona {
    /// Classifies a contact by display name. Names matching no pattern get the
    /// generic partner-like table.
    pub fn classify(name: &str) -> Persona {
        let name = name.to_lowercase();
        let words: Vec<&str> = name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let matches = |patterns: &[&str]| {
            patterns.iter().any(|pattern| {
                if pattern.contains(' ') || !pattern.chars().all(char::is_alphanumeric) {
                    name.contains(pattern)
                } else {
                    words.contains(pattern)
                }
            })
        };

        if matches(PARENT_PATTERNS) {
            Persona::Parent
        } else if matches(PARTNER_PATTERNS) {
            Persona::Partner
        } else if matches(EXPERT_PATTERNS) {
            Persona::Expert
        } else if matches(YOUTH_PATTERNS) {
            Persona::Youth
        } else {
            Persona::Partner
        }
    }

    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            Persona::Parent => PARENT_PHRASES,
            Persona::Partner => PARTNER_PHRASES,
            Persona::Expert => EXPERT_PHRASES,
            Persona::Youth => YOUTH_PHRASES,
        }
    }

    pub fn typing_profile(self) -> TypingProfile {
        match self {
            Persona::Parent => TypingProfile {
                thinking_ms: 1200..=2000,
                per_char_ms: 90..=140,
                jitter_ms: 0..=800,
            },
            Persona::Partner => TypingProfile {
                thinking_ms: 500..=1200,
                per_char_ms: 45..=75,
                jitter_ms: 0..=600,
            },
            Persona::Expert => TypingProfile {
                thinking_ms: 900..=1600,
                per_char_ms: 55..=85,
                jitter_ms: 0..=500,
            },
            Persona::Youth => TypingProfile {
                thinking_ms: 300..=800,
                per_char_ms: 20..=40,
                jitter_ms: 0..=400,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_parent_contact() {
        assert_eq!(Persona::classify("Mẹ"), Persona::Parent);
        assert_eq!(Persona::classify("MẸ YÊU"), Persona::Parent);
        assert_eq!(Persona::classify("Dad"), Persona::Parent);
    }

    #[test]
    fn test_partner_patterns() {
        assert_eq!(Persona::classify("Anh yêu ❤"), Persona::Partner);
        assert_eq!(Persona::classify("Honey"), Persona::Partner);
    }

    #[test]
    fn test_expert_patterns() {
        assert_eq!(Persona::classify("Bác sĩ Hùng"), Persona::Expert);
        assert_eq!(Persona::classify("The Boss"), Persona::Expert);
    }

    #[test]
    fn test_youth_patterns() {
        assert_eq!(Persona::classify("Em Lan"), Persona::Youth);
        assert_eq!(Persona::classify("bé Na"), Persona::Youth);
    }

    #[test]
    fn test_short_patterns_need_whole_words() {
        // "em" inside "Emma" and "ba" inside "Barbara" must not match.
        assert_eq!(Persona::classify("Emma"), Persona::Partner);
        assert_eq!(Persona::classify("Barbara"), Persona::Partner);
    }

    #[test]
    fn test_unknown_name_defaults_to_partner() {
        assert_eq!(Persona::classify("Nguyễn Văn A"), Persona::Partner);
        assert_eq!(Persona::classify(""), Persona::Partner);
    }

    #[test]
    fn test_parent_types_slowest_youth_fastest() {
        let parent = Persona::Parent.typing_profile();
        let youth = Persona::Youth.typing_profile();
        assert!(parent.per_char_ms.start() > youth.per_char_ms.end());
        for persona in [Persona::Partner, Persona::Expert] {
            let profile = persona.typing_profile();
            assert!(profile.per_char_ms.end() < parent.per_char_ms.end());
            assert!(profile.per_char_ms.start() > youth.per_char_ms.start());
        }
    }

    #[test]
    fn test_every_table_is_non_empty() {
        for persona in [Persona::Parent, Persona::Partner, Persona::Expert, Persona::Youth] {
            assert!(!persona.phrases().is_empty());
        }
    }
}

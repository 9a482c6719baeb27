//! Auto-reply heuristic: which canned phrase comes next and how long the
//! persona "takes" to type it.

use crate::core::persona::Persona;
use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

pub const MIN_REPLY_DELAY: Duration = Duration::from_millis(1500);
pub const MAX_REPLY_DELAY: Duration = Duration::from_millis(6000);

/// A reply that is being "typed". The phrase itself is only picked when the
/// reply is stored, so replies that overlap still take consecutive phrases.
#[derive(Debug, Clone)]
pub struct PlannedReply {
    pub conversation_id: Uuid,
    pub persona: Persona,
    /// Typing time for the phrase the cursor pointed at when planning.
    pub delay: Duration,
}

/// Index of the phrase that was used when the stored cursor moved on to
/// `advanced_cursor`.
pub fn used_index(table_size: i64, advanced_cursor: i64) -> usize {
    (advanced_cursor - 1).rem_euclid(table_size) as usize
}

/// Returns the reply at `cursor` and the cursor to store afterwards.
///
/// Cursors left over from a different persona (the contact was renamed) are
/// reduced into range first.
pub fn next_reply(persona: Persona, cursor: i64) -> (&'static str, i64) {
    let phrases = persona.phrases();
    let len = phrases.len() as i64;
    let current = cursor.rem_euclid(len);

    (phrases[current as usize], (current + 1) % len)
}

/// `clamp(thinking + length * per_char + jitter, 1.5s, 6s)`, each term sampled
/// from the persona's typing profile. Negative lengths count as zero.
pub fn typing_delay<R: Rng>(persona: Persona, message_length: i64, rng: &mut R) -> Duration {
    let profile = persona.typing_profile();
    let length = message_length.max(0) as u64;

    let thinking = rng.gen_range(profile.thinking_ms);
    let per_char = rng.gen_range(profile.per_char_ms);
    let jitter = rng.gen_range(profile.jitter_ms);

    let total = thinking
        .saturating_add(length.saturating_mul(per_char))
        .saturating_add(jitter);

    Duration::from_millis(total).clamp(MIN_REPLY_DELAY, MAX_REPLY_DELAY)
}

/// Delay for typing `text`, measured in characters.
pub fn reply_delay(persona: Persona, text: &str) -> Duration {
    let length = text.chars().count() as i64;
    typing_delay(persona, length, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ALL: [Persona; 4] = [Persona::Parent, Persona::Partner, Persona::Expert, Persona::Youth];

    #[test]
    fn test_delay_always_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for persona in ALL {
            for length in [0, 1, 5, 12, 40, 100, 1_000, 1_000_000, i64::MAX] {
                for _ in 0..50 {
                    let delay = typing_delay(persona, length, &mut rng);
                    assert!(delay >= MIN_REPLY_DELAY, "{persona:?} {length} {delay:?}");
                    assert!(delay <= MAX_REPLY_DELAY, "{persona:?} {length} {delay:?}");
                }
            }
        }
    }

    #[test]
    fn test_negative_length_is_treated_as_zero() {
        for persona in ALL {
            let mut a = StdRng::seed_from_u64(42);
            let mut b = StdRng::seed_from_u64(42);
            assert_eq!(
                typing_delay(persona, -25, &mut a),
                typing_delay(persona, 0, &mut b)
            );
        }
    }

    #[test]
    fn test_long_messages_hit_the_ceiling() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(typing_delay(Persona::Parent, 500, &mut rng), MAX_REPLY_DELAY);
    }

    #[test]
    fn test_cursor_wraps_after_table_size() {
        for persona in ALL {
            let size = persona.phrases().len() as i64;
            let mut cursor = 0;
            for n in 1..=(size * 3 + 2) {
                let (_, next) = next_reply(persona, cursor);
                cursor = next;
                assert_eq!(cursor, n % size);
            }
        }
    }

    #[test]
    fn test_reply_is_phrase_at_cursor() {
        let phrases = Persona::Parent.phrases();
        let (text, next) = next_reply(Persona::Parent, 3);
        assert_eq!(text, phrases[3]);
        assert_eq!(next, 4);
    }

    #[test]
    fn test_out_of_range_cursor_is_reduced() {
        let size = Persona::Expert.phrases().len() as i64;
        let (text, next) = next_reply(Persona::Expert, size + 1);
        assert_eq!(text, Persona::Expert.phrases()[1]);
        assert_eq!(next, 2 % size);
    }

    #[test]
    fn test_used_index_is_the_pre_advance_cursor() {
        let size = Persona::Parent.phrases().len() as i64;
        for cursor in 0..size {
            let (_, next) = next_reply(Persona::Parent, cursor);
            assert_eq!(used_index(size, next), cursor as usize);
        }
    }

    #[test]
    fn test_reply_delay_counts_characters() {
        for _ in 0..20 {
            let delay = reply_delay(Persona::Youth, "Ừ, mẹ nghe đây con.");
            assert!(delay >= MIN_REPLY_DELAY && delay <= MAX_REPLY_DELAY);
        }
    }
}

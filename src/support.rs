//! Canned-response support desk for visitors who are not in an order chat.
//!
//! Replies are picked by keyword and delivered after a short random pause so
//! the exchange reads like a person answering.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

pub const PRICING_REPLY: &str = "Our resume writing packages start from ₹2,999. You can view detailed pricing on our pricing page or I can connect you with our team for a personalized quote.";
pub const DELIVERY_REPLY: &str = "We typically deliver resumes within 2-7 working days depending on the package. Rush delivery options are available for urgent requirements.";
pub const SAMPLES_REPLY: &str = "You can view our sample work on the samples page. Each sample showcases our professional writing style and ATS optimization.";
pub const FALLBACK_REPLY: &str = "Thank you for your message! A support representative will be with you shortly. You can also reach us at support@professionalwriters.com or WhatsApp +91-8982737964.";

/// First matching keyword group wins.
const ROUTES: &[(&[&str], &str)] = &[
    (&["price", "cost"], PRICING_REPLY),
    (&["time", "delivery"], DELIVERY_REPLY),
    (&["sample", "example"], SAMPLES_REPLY),
];

/// Pick the canned reply for `text`.
pub fn canned_reply(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK_REPLY)
}

#[derive(Debug, Clone)]
pub struct SupportDesk {
    delay_ms: Range<u64>,
}

impl SupportDesk {
    /// A desk that answers after 1.5–2.5 s.
    pub fn new() -> Self {
        Self {
            delay_ms: 1_500..2_500,
        }
    }

    /// Override the reply delay range in milliseconds. An empty range means
    /// no delay.
    pub fn with_delay(delay_ms: Range<u64>) -> Self {
        Self { delay_ms }
    }

    pub fn reply_delay(&self) -> Duration {
        if self.delay_ms.is_empty() {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.delay_ms.clone());
        Duration::from_millis(ms)
    }

    /// Answer `text` after the reply delay. Blank questions get no answer.
    pub async fn respond(&self, text: &str) -> Option<&'static str> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let reply = canned_reply(text);
        tokio::time::sleep(self.reply_delay()).await;
        Some(reply)
    }
}

impl Default for SupportDesk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("What is the price?", PRICING_REPLY)]
    #[case("how much does it COST", PRICING_REPLY)]
    #[case("delivery time please", DELIVERY_REPLY)]
    #[case("When will it be done? what time", DELIVERY_REPLY)]
    #[case("can I see a sample", SAMPLES_REPLY)]
    #[case("any examples?", SAMPLES_REPLY)]
    #[case("hello", FALLBACK_REPLY)]
    #[case("price and sample", PRICING_REPLY)]
    fn test_canned_reply_routing(#[case] question: &str, #[case] expected: &str) {
        assert_eq!(canned_reply(question), expected);
    }

    #[test]
    fn test_default_delay_in_range() {
        let desk = SupportDesk::new();
        for _ in 0..50 {
            let d = desk.reply_delay();
            assert!(d >= Duration::from_millis(1_500) && d < Duration::from_millis(2_500));
        }
    }

    #[test]
    fn test_empty_delay_range_is_zero() {
        assert_eq!(SupportDesk::with_delay(0..0).reply_delay(), Duration::ZERO);
    }

    #[test]
    fn test_blank_question_gets_no_answer() {
        let desk = SupportDesk::new();
        assert_eq!(tokio_test::block_on(desk.respond("   ")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_waits_then_answers() {
        let desk = SupportDesk::new();
        let start = tokio::time::Instant::now();
        let reply = desk.respond("price?").await;
        assert_eq!(reply, Some(PRICING_REPLY));
        assert!(start.elapsed() >= Duration::from_millis(1_500));
    }
}

//! Transcript collection and display formatting
//!
//! Only final results produce output lines; partials update a revisable
//! slot and are never printed or accumulated.

use crate::stt::SttEvent;

/// Accumulates final transcript segments and formats display lines
#[derive(Debug, Default)]
pub struct TranscriptCollector {
    final_text: String,
    partial_text: String,
}

impl TranscriptCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event; returns the display line for final segments
    pub fn record(&mut self, event: &SttEvent) -> Option<String> {
        match event {
            SttEvent::Partial(segment) => {
                self.partial_text = segment.text.clone();
                None
            }
            SttEvent::Final(segment) => {
                if !self.final_text.is_empty() {
                    self.final_text.push(' ');
                }
                self.final_text.push_str(&segment.text);
                self.partial_text.clear();

                Some(format!(
                    "[{}] {} (confidence: {:.2})",
                    segment.received_at.format("%H:%M:%S"),
                    segment.text,
                    segment.confidence.unwrap_or(0.0)
                ))
            }
        }
    }

    /// Accumulated final transcript so far
    pub fn text(&self) -> &str {
        &self.final_text
    }

    /// Latest unconfirmed partial, if any
    pub fn partial(&self) -> &str {
        &self.partial_text
    }

    /// Return the accumulated transcript and reset the collector
    pub fn take_text(&mut self) -> String {
        self.partial_text.clear();
        std::mem::take(&mut self.final_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::TranscriptSegment;

    #[test]
    fn finals_accumulate_in_order() {
        let mut collector = TranscriptCollector::new();
        collector.record(&SttEvent::Final(TranscriptSegment::new("hello", None)));
        collector.record(&SttEvent::Final(TranscriptSegment::new("world", None)));
        assert_eq!(collector.text(), "hello world");
    }

    #[test]
    fn partials_produce_no_line_and_never_accumulate() {
        let mut collector = TranscriptCollector::new();
        let line = collector.record(&SttEvent::Partial(TranscriptSegment::new("hel", None)));
        assert!(line.is_none());
        assert_eq!(collector.text(), "");
        assert_eq!(collector.partial(), "hel");
    }

    #[test]
    fn final_clears_pending_partial() {
        let mut collector = TranscriptCollector::new();
        collector.record(&SttEvent::Partial(TranscriptSegment::new("hel", None)));
        collector.record(&SttEvent::Final(TranscriptSegment::new("hello", Some(0.95))));
        assert_eq!(collector.partial(), "");
        assert_eq!(collector.text(), "hello");
    }

    #[test]
    fn final_line_carries_timestamp_and_confidence() {
        let mut collector = TranscriptCollector::new();
        let line = collector
            .record(&SttEvent::Final(TranscriptSegment::new("hi", Some(0.876))))
            .unwrap();
        assert!(line.contains("hi"));
        assert!(line.ends_with("(confidence: 0.88)"));
        // [HH:MM:SS] prefix
        assert_eq!(line.as_bytes()[0], b'[');
        assert_eq!(line.as_bytes()[9], b']');
    }

    #[test]
    fn missing_confidence_prints_zero() {
        let mut collector = TranscriptCollector::new();
        let line = collector
            .record(&SttEvent::Final(TranscriptSegment::new("hi", None)))
            .unwrap();
        assert!(line.ends_with("(confidence: 0.00)"));
    }

    #[test]
    fn take_text_resets_the_collector() {
        let mut collector = TranscriptCollector::new();
        collector.record(&SttEvent::Final(TranscriptSegment::new("hello", None)));
        assert_eq!(collector.take_text(), "hello");
        assert_eq!(collector.text(), "");
    }
}

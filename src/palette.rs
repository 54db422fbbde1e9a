//! Fixed color assignments.
//!
//! Sentiment, emotion and question colors carry meaning and must stay the
//! same across renders and across analyses.

use serde::{Serialize, Serializer};

use crate::aggregate::SentimentClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

pub const POSITIVE: Rgb = Rgb::hex(0x4CAF50);
pub const NEUTRAL: Rgb = Rgb::hex(0xFFC107);
pub const NEGATIVE: Rgb = Rgb::hex(0xF44336);

pub fn sentiment_color(class: SentimentClass) -> Rgb {
    match class {
        SentimentClass::Positive => POSITIVE,
        SentimentClass::Neutral => NEUTRAL,
        SentimentClass::Negative => NEGATIVE,
    }
}

/// Question-by-sentiment bars use a teal/amber/rose set, drawn translucent.
pub const QUESTION_SENTIMENT: [Rgb; 3] = [Rgb(75, 192, 192), Rgb(255, 206, 86), Rgb(255, 99, 132)];

pub const QUESTIONS: Rgb = Rgb::hex(0xFF9F40);
pub const STATEMENTS: Rgb = Rgb::hex(0x36A2EB);

pub const UNKNOWN_EMOTION: Rgb = Rgb::hex(0x000000);

/// Bar color of an emotion on the emotion chart.
pub fn emotion_color(emotion: &str) -> Rgb {
    match emotion {
        "joy" => Rgb::hex(0xFFD700),
        "sadness" => Rgb::hex(0x4169E1),
        "anger" => Rgb::hex(0xFF4500),
        "surprise" => Rgb::hex(0x32CD32),
        "fear" => Rgb::hex(0x800080),
        "neutral" => Rgb::hex(0x808080),
        _ => UNKNOWN_EMOTION,
    }
}

/// Badge color of an emotion in the sample comments table.
pub fn emotion_badge_color(emotion: &str) -> Rgb {
    match emotion {
        "joy" => Rgb::hex(0x4CAF50),
        "sadness" => Rgb::hex(0x2196F3),
        "anger" => Rgb::hex(0xF44336),
        "fear" => Rgb::hex(0x9C27B0),
        "surprise" => Rgb::hex(0xFF9800),
        _ => Rgb::hex(0x757575),
    }
}

/// Slice colors for languages, by rank.
pub const LANGUAGES: [Rgb; 8] = [
    Rgb::hex(0xFF6384),
    Rgb::hex(0x36A2EB),
    Rgb::hex(0xFFCE56),
    Rgb::hex(0x4BC0C0),
    Rgb::hex(0x9966FF),
    Rgb::hex(0xFF9F40),
    Rgb::hex(0xE7E9ED),
    Rgb::hex(0xC9CBCF),
];

/// Bar colors of the five length buckets.
pub const LENGTH_BUCKETS: [Rgb; 5] = [
    Rgb::hex(0xFF6384),
    Rgb::hex(0x36A2EB),
    Rgb::hex(0xFFCE56),
    Rgb::hex(0x4BC0C0),
    Rgb::hex(0x9966FF),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_through_components() {
        assert_eq!(Rgb::hex(0x4CAF50), Rgb(0x4C, 0xAF, 0x50));
        assert_eq!(POSITIVE.to_hex(), "#4CAF50");
    }

    #[test]
    fn unknown_emotion_is_black() {
        assert_eq!(emotion_color("boredom"), UNKNOWN_EMOTION);
        assert_eq!(emotion_color("joy").to_hex(), "#FFD700");
    }
}

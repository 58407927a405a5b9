//! Preset questions offered on the welcome screen.

pub struct QuickTopic {
    pub title: &'static str,
    pub question: &'static str,
    pub description: &'static str,
}

pub const QUICK_TOPICS: [QuickTopic; 4] = [
    QuickTopic {
        title: "VAT Changes",
        question: "What are the new VAT rates?",
        description: "Value Added Tax adjustments and implications",
    },
    QuickTopic {
        title: "Small Businesses",
        question: "How will small businesses be affected?",
        description: "SME exemptions and simplified procedures",
    },
    QuickTopic {
        title: "Implementation Timeline",
        question: "When do the new tax changes start?",
        description: "Schedule and transition periods",
    },
    QuickTopic {
        title: "State Benefits",
        question: "Which states benefit the most?",
        description: "Revenue allocation and state benefits",
    },
];

/// Topic by its 1-based number as listed by `/topics`
pub fn topic(number: usize) -> Option<&'static QuickTopic> {
    number.checked_sub(1).and_then(|i| QUICK_TOPICS.get(i))
}

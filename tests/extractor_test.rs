use agent_metrics::aggregate;
use agent_metrics::extractor::{
    self, Estimate, NarrativeExtractor, Sentiment, COMMITS_PLACEHOLDER, GROWTH_PLACEHOLDER,
    STARS_PLACEHOLDER,
};

#[test]
fn test_pending_emerging_section_yields_nothing() {
    let text = "## MAIN FRAMEWORKS ANALYSIS\n\
**Framework Name:** LangChain\n\
**GitHub Stars:** 95,000\n\n\
## EMERGING FRAMEWORKS DISCOVERED\n\
The emerging frameworks analysis is still pending.\n\
**Framework Name:** Hidden\n\
**Category:** AI Framework\n\
**GitHub Stars:** 4,000\n";

    let extraction = NarrativeExtractor::seeded(11).extract(text);
    assert_eq!(extraction.names(), vec!["LangChain"]);
    assert!(extraction.emerging.is_empty());
}

#[test]
fn test_well_formed_block() {
    let text = "**Framework Name:** Foo\n**Category:** AI Framework\n**GitHub Stars:** 2,500\n**Recent Growth:** +30%\n**Community Sentiment:** Positive\n**Recent Activity:** 45 commits";
    let extraction = extractor::extract(text);
    assert_eq!(extraction.main.len(), 1);

    let record = &extraction.main[0];
    assert_eq!(record.name, "Foo");
    assert_eq!(record.stars, Estimate::parsed(2500));
    assert_eq!(record.forks, Estimate::parsed(250));
    assert_eq!(record.growth.value, "+30%");
    assert_eq!(record.sentiment, Sentiment::Positive);
    assert_eq!(record.recent_commits, Estimate::parsed(45));
}

#[test]
fn test_missing_numbers_get_flagged_placeholders() {
    let text = "**Framework Name:** Quiet\n**Category:** MCP Server\n**Community Sentiment:** Neutral";
    for seed in 0..32 {
        let extraction = NarrativeExtractor::seeded(seed).extract(text);
        let record = &extraction.main[0];

        assert!(record.stars.is_placeholder());
        assert!(record.stars.value > 0);
        assert!(STARS_PLACEHOLDER.contains(&record.stars.value));
        assert!(record.forks.is_placeholder());

        assert!(record.growth.is_placeholder());
        let growth = record.growth_percent().unwrap() as u32;
        assert!(GROWTH_PLACEHOLDER.contains(&growth));

        assert!(record.recent_commits.is_placeholder());
        assert!(COMMITS_PLACEHOLDER.contains(&record.recent_commits.value));
    }
}

#[test]
fn test_same_seed_same_placeholders() {
    let text = "**Framework Name:** Quiet\n**Category:** MCP Server";
    assert_eq!(
        NarrativeExtractor::seeded(42).extract(text),
        NarrativeExtractor::seeded(42).extract(text)
    );
}

#[test]
fn test_heading_layout() {
    let text = "## Main Frameworks Analysis\n\n\
### 1. LangChain\n\
- **GitHub Stars:** 95k\n\
- **Recent Growth:** 15%\n\
- **Community Sentiment:** Very Positive\n\n\
### 2. AutoGPT\n\
- GitHub Stars: 165,000\n\
- Recent Activity: ~120 commits\n";

    let extraction = NarrativeExtractor::seeded(5).extract(text);
    assert_eq!(extraction.names(), vec!["LangChain", "AutoGPT"]);
    assert_eq!(extraction.main[0].stars, Estimate::parsed(95_000));
    assert_eq!(extraction.main[0].growth, Estimate::parsed("+15%".to_string()));
    assert_eq!(extraction.main[0].sentiment, Sentiment::VeryPositive);
    assert_eq!(extraction.main[1].stars, Estimate::parsed(165_000));
    assert_eq!(extraction.main[1].recent_commits, Estimate::parsed(120));
}

#[test]
fn test_field_line_layout() {
    let text = "LangGraph\n\
Category: AI Framework\n\
GitHub Stars: 8,000\n\
Recent Growth: +60%\n\n\
FastMCP\n\
Category: MCP Server\n\
GitHub Stars: 3.2k\n";

    let extraction = NarrativeExtractor::seeded(5).extract(text);
    assert_eq!(extraction.names(), vec!["LangGraph", "FastMCP"]);
    assert_eq!(extraction.main[0].category, "AI Framework");
    assert_eq!(extraction.main[1].category, "MCP Server");
    assert_eq!(extraction.main[1].stars, Estimate::parsed(3_200));
}

#[test_log::test]
fn test_malformed_block_is_skipped() {
    let text = "**Framework Name:** \n\
**Category:** AI Framework\n\n\
**Framework Name:** Good\n\
**GitHub Stars:** 10\n";

    let extraction = NarrativeExtractor::seeded(9).extract(text);
    assert_eq!(extraction.names(), vec!["Good"]);
}

#[test]
fn test_text_without_projects() {
    let extraction = extractor::extract("Nothing structured here at all.");
    assert!(extraction.is_empty());
}

#[test]
fn test_description_prose_is_not_a_deferral() {
    let text = "**Framework Name:** CrewAI\n\
**Category:** AI Framework\n\
**Description:** Splits a goal into tasks to be completed by role-playing agents; results will follow a review step\n\
**GitHub Stars:** 18,500\n";

    let extraction = NarrativeExtractor::seeded(2).extract(text);
    assert_eq!(extraction.names(), vec!["CrewAI"]);
    assert_eq!(extraction.main[0].stars, Estimate::parsed(18_500));
}

#[test]
fn test_absurd_star_counts_fall_back_to_placeholders() {
    let text = "**Framework Name:** Huge\n\
**GitHub Stars:** 99999999999999999999\n\n\
**Framework Name:** Huger\n\
**GitHub Stars:** 99999999999999999999\n";

    let extraction = NarrativeExtractor::seeded(4).extract(text);
    assert_eq!(extraction.main.len(), 2);
    for record in &extraction.main {
        assert!(record.stars.is_placeholder());
        assert!(STARS_PLACEHOLDER.contains(&record.stars.value));
    }

    let records: Vec<_> = extraction.all().cloned().collect();
    let summary = aggregate::summarize(&records);
    assert_eq!(summary.total_projects, 2);
    assert!(STARS_PLACEHOLDER.contains(&summary.average_stars));
}

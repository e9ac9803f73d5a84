//! Provider-agnostic prompt wording.

use regex::Regex;

use super::types::{CampaignBrief, ContentLength, ContentOptions, ContentType, PromptPair};

lazy_static::lazy_static! {
    static ref HASHTAG_REGEX: Regex = Regex::new(r"#[\p{L}\p{N}_]+").unwrap();
}

fn system_prompt(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Caption => {
            "You are an expert social media copywriter. Write one engaging post caption. \
             Return only the caption text, without quotes or commentary."
        }
        ContentType::AdCopy => {
            "You are a performance marketing copywriter. Write persuasive ad copy with a \
             headline, a short body and a clear call to action. Return only the ad copy."
        }
        ContentType::Hashtags => {
            "You are a social media strategist. Suggest relevant, popular hashtags. \
             Return only hashtags separated by spaces, each starting with #."
        }
        ContentType::ImagePrompt => {
            "You are an art director writing prompts for an image generation model. \
             Describe one photorealistic advertising visual in a single paragraph. \
             Do not include any text or lettering in the image."
        }
        ContentType::CampaignStrategy => {
            "You are a senior digital marketing strategist. Produce a concise campaign \
             strategy covering positioning, channels, content pillars, budget split and KPIs."
        }
    }
}

fn length_hint(content_type: ContentType, length: ContentLength) -> &'static str {
    match (content_type, length) {
        (ContentType::Hashtags, ContentLength::Short) => "Give 5 hashtags.",
        (ContentType::Hashtags, ContentLength::Medium) => "Give 10 hashtags.",
        (ContentType::Hashtags, ContentLength::Long) => "Give 20 hashtags.",
        (_, ContentLength::Short) => "Keep it under 40 words.",
        (_, ContentLength::Medium) => "Keep it between 40 and 120 words.",
        (_, ContentLength::Long) => "Use up to 300 words.",
    }
}

/// Build the system/user pair for one request.
pub fn build_prompt(content_type: ContentType, subject: &str, options: &ContentOptions) -> PromptPair {
    let mut user = format!("{}\n\nSubject:\n{}", task_line(content_type), subject.trim());

    let mut guidance = Vec::new();
    if let Some(platform) = non_empty(&options.platform) {
        guidance.push(format!("Target platform: {platform}."));
    }
    if let Some(tone) = non_empty(&options.tone) {
        guidance.push(format!("Tone: {tone}."));
    }
    if let Some(audience) = non_empty(&options.audience) {
        guidance.push(format!("Audience: {audience}."));
    }
    if let Some(length) = options.length {
        guidance.push(length_hint(content_type, length).to_string());
    }
    if let Some(locale) = non_empty(&options.locale) {
        guidance.push(format!("Write in the language and style of the {locale} locale."));
    }
    if !guidance.is_empty() {
        user.push_str("\n\nGuidelines:\n");
        user.push_str(&guidance.join("\n"));
    }

    PromptPair {
        system: system_prompt(content_type).to_string(),
        user,
    }
}

fn task_line(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Caption => "Write a social media caption for the following.",
        ContentType::AdCopy => "Write ad copy for the following.",
        ContentType::Hashtags => "Suggest hashtags for the following.",
        ContentType::ImagePrompt => "Write an image generation prompt for an ad about the following.",
        ContentType::CampaignStrategy => "Plan a marketing campaign for the following.",
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Describe a campaign as the subject text for every composite stage.
pub fn campaign_subject(brief: &CampaignBrief) -> String {
    let mut lines = vec![format!("Campaign: {}", brief.campaign_name.trim())];
    if let Some(name) = non_empty(&brief.business_name) {
        lines.push(format!("Business: {name}"));
    }
    lines.push(format!("About the business: {}", brief.business_intro.trim()));
    if let Some(goal) = non_empty(&brief.campaign_goal) {
        lines.push(format!("Goal: {goal}"));
    }
    if let Some(audience) = non_empty(&brief.target_audience) {
        lines.push(format!("Target audience: {audience}"));
    }
    if let Some(budget) = brief.budget {
        lines.push(format!("Budget: ${budget:.2}"));
    }
    if !brief.platforms.is_empty() {
        lines.push(format!("Platforms: {}", brief.platforms.join(", ")));
    }
    lines.join("\n")
}

/// Extract `#tag` tokens, keeping first-seen order and dropping duplicates.
/// Falls back to treating comma/whitespace separated words as tags.
pub fn parse_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    };

    let found: Vec<&str> = HASHTAG_REGEX.find_iter(text).map(|m| m.as_str()).collect();
    if found.is_empty() {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
            .filter(|word| !word.is_empty())
            .for_each(|word| push(format!("#{word}")));
    } else {
        found.into_iter().for_each(|tag| push(tag.to_string()));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wording_depends_on_type() {
        let options = ContentOptions::default();
        let caption = build_prompt(ContentType::Caption, "coffee shop", &options);
        let tags = build_prompt(ContentType::Hashtags, "coffee shop", &options);
        assert_ne!(caption.system, tags.system);
        assert!(caption.user.contains("coffee shop"));
        assert!(!caption.user.contains("Guidelines"));
    }

    #[test]
    fn test_prompt_includes_options() {
        let options = ContentOptions {
            tone: Some("playful".to_string()),
            platform: Some("instagram".to_string()),
            length: Some(ContentLength::Short),
            locale: Some("fr-FR".to_string()),
            ..ContentOptions::default()
        };
        let prompt = build_prompt(ContentType::Caption, "bakery", &options);
        assert!(prompt.user.contains("Target platform: instagram."));
        assert!(prompt.user.contains("Tone: playful."));
        assert!(prompt.user.contains("under 40 words"));
        assert!(prompt.user.contains("fr-FR"));
    }

    #[test]
    fn test_hashtag_length_counts_tags() {
        let options = ContentOptions {
            length: Some(ContentLength::Medium),
            ..ContentOptions::default()
        };
        let prompt = build_prompt(ContentType::Hashtags, "gym", &options);
        assert!(prompt.user.contains("10 hashtags"));
    }

    #[test]
    fn test_campaign_subject_skips_blank_fields() {
        let brief = CampaignBrief {
            campaign_name: "Spring launch".to_string(),
            business_name: Some("  ".to_string()),
            business_intro: "Handmade candles".to_string(),
            budget: Some(250.0),
            platforms: vec!["instagram".to_string(), "facebook".to_string()],
            ..CampaignBrief::default()
        };
        let subject = campaign_subject(&brief);
        assert!(subject.contains("Campaign: Spring launch"));
        assert!(!subject.contains("Business:"));
        assert!(subject.contains("Budget: $250.00"));
        assert!(subject.contains("instagram, facebook"));
    }

    #[test]
    fn test_parse_hashtags_dedupes_case_insensitively() {
        let tags = parse_hashtags("#Coffee #beans, #coffee and #Beans_2");
        assert_eq!(tags, vec!["#Coffee", "#beans", "#Beans_2"]);
    }

    #[test]
    fn test_parse_hashtags_falls_back_to_words() {
        assert_eq!(parse_hashtags("coffee, morning"), vec!["#coffee", "#morning"]);
        assert!(parse_hashtags("   ").is_empty());
    }
}

//! Campaign prompt template.
//!
//! Inputs are interpolated verbatim; nothing is escaped or trimmed.

/// System role sent with every generation request.
pub const SYSTEM_ROLE: &str =
    "You are a helpful community organizer expert at rallying support for local businesses.";

pub fn build_campaign_prompt(business_name: &str, campaign_type: &str, story: &str) -> String {
    format!(
        "You are an expert marketing consultant helping small businesses create effective social media campaigns.

Business: {business_name}
Campaign Type: {campaign_type}
Campaign Details & Target Audience: {story}

Generate 5 compelling social media posts for this campaign. Create posts with different tones and approaches:

1. Attention-grabbing with urgency
2. Inspirational and motivational
3. Community-focused and inclusive
4. Strong call-to-action
5. Emotional storytelling

Each post should be:
- 2-3 sentences maximum
- Include relevant emojis that match the campaign type
- Ready to copy-paste to Instagram, Facebook, or Twitter
- Tailored specifically to the campaign type and target audience
- Professional yet authentic

Format as a numbered list with clear separation between posts."
    )
}

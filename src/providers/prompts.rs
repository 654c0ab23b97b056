//! Prompt text for both models.

use crate::models::{Caption, GenerationRequest, HumorStyle};

/// Stale meme formats the caption model is told to avoid.
pub const FORBIDDEN_PHRASES: [&str; 8] = [
    "Said no one ever",
    "Keep Calm and...",
    "Be like [name]",
    "One does not simply",
    "The face you make when",
    "That awkward moment",
    "Am I a joke to you?",
    "Expectation vs Reality",
];

/// Persona for the caption model.
pub const CAPTION_SYSTEM_PROMPT: &str = "You are a Gen-Z meme lord. You find traditional memes 'cringe'. \
You only make memes that would go viral on modern Reddit or Twitter. \
You use irony, self-deprecation, and specific situational humor. No clichés.";

/// Things the image model must not draw.
pub const IMAGE_NEGATIVE_PROMPT: &str =
    "real photo, photorealistic, text, watermark, blurry, complex background, 3d render";

fn style_brief(style: HumorStyle, topic: &str) -> String {
    match style {
        HumorStyle::Sarcastic => format!(
            "Create a SARCASTIC meme about \"{topic}\".\n\
             Avoid 2012-era clichés. Use modern, dry, or biting sarcasm.\n\
             Pattern: Mock the 'perfect' version of {topic} with a painful reality.\n\
             Example: \"I love how [topic] allows me to maintain my dignity and definitely \
             doesn't make me look like a crying mess\""
        ),
        HumorStyle::Relatable => format!(
            "Create a RELATABLE meme about \"{topic}\".\n\
             Focus on the hyperspecific, weird thoughts people have about {topic}.\n\
             Do NOT use 'When you...' generic openers.\n\
             Example: \"Calculated my finances and if I stop eating and breathing by Tuesday, \
             I can afford [topic]\""
        ),
        HumorStyle::Absurd => format!(
            "Create an ABSURD/BRAINROT meme about \"{topic}\".\n\
             Use surrealism, non-sequiturs, and modern 'brain rot' lingo if it fits.\n\
             The humor comes from the sheer confusion and scale of the topic.\n\
             Keywords: skibidi, aura, fanum tax, 1000 yard stare, existential crisis.\n\
             Example: \"The [topic] demon watching me eat a single grape at 4am for sustenance\""
        ),
        HumorStyle::Wholesome => format!(
            "Create a WHOLESOME meme about \"{topic}\".\n\
             Subvert the 'struggle' of {topic} with an unexpectedly kind or cozy twist.\n\
             Example: \"[Topic] might be hard but my dog thinks I'm a billionaire and that's \
             enough for today\""
        ),
        HumorStyle::Dark => format!(
            "Create a DARK HUMOR meme about \"{topic}\".\n\
             Existential dread, self-deprecating nihilism.\n\
             Pattern: The topic is a minor inconvenience that you treat as a life-ending prophecy.\n\
             Example: \"Added [topic] to the list of reasons why I'm moving to a cave in the woods \
             and starting a new life as a moss enthusiast\""
        ),
    }
}

/// User message asking for `{top_text, bottom_text, image_prompt}` JSON.
pub fn caption_prompt(request: &GenerationRequest) -> String {
    let topic = request.topic();
    let style = request.humor_style();
    format!(
        r#"{brief}

CRITICAL RULES:
1. NEVER use these overused phrases: {forbidden}.
2. Don't be generic. Be HYPERSPECIFIC. Specificity is where the humor lives.
3. Don't just describe the topic. Describe the EMOTIONAL DAMAGE or the WEIRD DETAIL.
4. Top text/Bottom text should feel like a cohesive thought, not two separate labels.

TOPIC: "{topic}"
STYLE: {style_upper}

Return ONLY valid JSON:
{{
    "top_text": "Setup text (max 8 words)",
    "bottom_text": "Punchline text (max 8 words)",
    "image_prompt": "Describe a funny, modern reaction image. A character with a very specific, weird expression or in a bizarre situation that perfectly captures the irony."
}}"#,
        brief = style_brief(style, topic),
        forbidden = FORBIDDEN_PHRASES.join(", "),
        style_upper = style.as_str().to_uppercase(),
    )
}

/// The scene to draw: the caption model's idea if it had one, otherwise
/// something built from the topic and tone.
pub fn scene_for(request: &GenerationRequest, caption: &Caption) -> String {
    match caption.image_prompt.as_deref() {
        Some(scene) => scene.to_string(),
        None => format!(
            "Highly expressive character with a weird, {} reaction to {}",
            request.humor_style().as_str(),
            request.topic()
        ),
    }
}

/// Full image prompt: the scene wrapped in the house style.
pub fn image_prompt(request: &GenerationRequest, caption: &Caption) -> String {
    format!(
        "Meme reaction image: {scene}\n\n\
         Style requirements:\n\
         - MODERN digital illustration / 2D cartoon style\n\
         - HIGH EXPRESSION: The face must be doing something weird and funny \
         (shock, defeat, insane joy, or blank stare)\n\
         - Clean, simple, solid-color backgrounds (no clutter)\n\
         - Leave empty space at the very top and very bottom for text\n\
         - NO TEXT in the image itself\n\
         - High contrast, meme-reaction aesthetic",
        scene = scene_for(request, caption)
    )
}

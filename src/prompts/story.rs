use serde_json::{Value, json};

const IDEA_PROMPT: &str = r#"Generate the name of a world-famous entrepreneur (e.g., Steve Jobs, Elon Musk, Oprah Winfrey), a brief, visually compelling anecdote about them, and a generic description for an image prompt. The image prompt description should capture the essence of the anecdote without using the entrepreneur's name. Focus on a specific moment of inspiration, challenge, or breakthrough.

Example Output:
{
  "name": "Marie Curie",
  "storyIdea": "Working late in her cluttered laboratory, discovering the glowing properties of radium.",
  "imagePromptDescription": "A pioneering female scientist in a dimly lit, turn-of-the-century laboratory, looking with wonder at a beaker containing a substance that is glowing with an ethereal blue light."
}"#;

/// Appended to every image description.
pub const IMAGE_STYLE: &str =
    "Style: cinematic, high-quality digital art, detailed, slightly stylized, dramatic lighting, epic.";

/// Stands in for the subject wherever the description names them.
pub const NAME_REPLACEMENT: &str = "the entrepreneur";

/// The stage-one instruction.
pub fn idea_prompt() -> &'static str {
    IDEA_PROMPT
}

/// Response schema for the stage-one call: three required strings.
pub fn idea_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": {
                "type": "STRING",
                "description": "The full name of the entrepreneur."
            },
            "storyIdea": {
                "type": "STRING",
                "description": "A short, one-sentence description of a famous story or anecdote about them. This will be used to generate a full story."
            },
            "imagePromptDescription": {
                "type": "STRING",
                "description": "A generic description of the scene for an image prompt that captures the essence of the story idea but avoids using the entrepreneur's specific name."
            }
        },
        "required": ["name", "storyIdea", "imagePromptDescription"]
    })
}

/// The stage-two instruction: a Vietnamese story of 150–200 words, no markdown.
pub fn narrative_prompt(name: &str, story_idea: &str) -> String {
    format!(
        "Viết một câu chuyện ngắn, truyền cảm hứng bằng tiếng Việt về {name}, tập trung vào khoảnh khắc cụ thể này: \"{story_idea}\". Làm cho nó hấp dẫn, được viết tốt và dài khoảng 150-200 từ. Không sử dụng định dạng markdown."
    )
}

/// The stage-three prompt. The subject's name is scrubbed from the
/// description before the style suffix is added.
pub fn image_prompt(description: &str, name: &str) -> String {
    let scene = scrub_name(description, name);
    let scene = scene.trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    format!("{scene}. {IMAGE_STYLE}")
}

/// Replace every word of `description` that matches a part of `name` with
/// [`NAME_REPLACEMENT`]. Adjacent name words collapse into one replacement.
/// Compounds such as `Musk-built` or `Jobs/Wozniak` are scrubbed segment by
/// segment. Whitespace is normalised to single spaces.
pub fn scrub_name(description: &str, name: &str) -> String {
    let parts: Vec<String> = name
        .split_whitespace()
        .map(|p| core_of(p).0.to_lowercase())
        .filter(|p| p.chars().count() >= 2)
        .collect();

    let mut out: Vec<String> = Vec::new();
    let mut run_prefix: Option<String> = None;

    for word in description.split_whitespace() {
        let (core, prefix, suffix) = core_of(word);

        if core.contains(is_compound_separator) {
            run_prefix = None;
            out.push(format!("{prefix}{}{suffix}", scrub_compound(core, &parts)));
            continue;
        }

        let (stem, possessive) = split_possessive(core);

        if stem.is_empty() || !parts.contains(&stem.to_lowercase()) {
            run_prefix = None;
            out.push(word.to_string());
            continue;
        }

        // Continue a run only when the previous name word had no trailing punctuation.
        let prefix = match run_prefix.take() {
            Some(p) => {
                out.pop();
                p
            }
            None => prefix.to_string(),
        };
        out.push(format!("{prefix}{NAME_REPLACEMENT}{possessive}{suffix}"));
        if suffix.is_empty() && possessive.is_empty() {
            run_prefix = Some(prefix);
        }
    }

    out.join(" ")
}

fn is_compound_separator(c: char) -> bool {
    matches!(c, '-' | '–' | '—' | '/')
}

/// Scrub each separator-delimited segment of a compound word on its own.
fn scrub_compound(core: &str, parts: &[String]) -> String {
    let mut out = String::with_capacity(core.len());
    let mut start = 0;
    for (i, c) in core.char_indices() {
        if is_compound_separator(c) {
            out.push_str(&scrub_segment(&core[start..i], parts));
            out.push(c);
            start = i + c.len_utf8();
        }
    }
    out.push_str(&scrub_segment(&core[start..], parts));
    out
}

fn scrub_segment(segment: &str, parts: &[String]) -> String {
    let (core, prefix, suffix) = core_of(segment);
    let (stem, possessive) = split_possessive(core);
    if !stem.is_empty() && parts.contains(&stem.to_lowercase()) {
        format!("{prefix}{NAME_REPLACEMENT}{possessive}{suffix}")
    } else {
        segment.to_string()
    }
}

/// Split a word into (alphanumeric core, leading punctuation, trailing punctuation).
fn core_of(word: &str) -> (&str, &str, &str) {
    let start = word
        .char_indices()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(word.len());
    let end = word
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start);
    let end = end.max(start);
    (&word[start..end], &word[..start], &word[end..])
}

fn split_possessive(core: &str) -> (&str, &str) {
    for marker in ["'s", "’s", "'S", "’S"] {
        if let Some(stem) = core.strip_suffix(marker) {
            return (stem, &core[stem.len()..]);
        }
    }
    (core, "")
}

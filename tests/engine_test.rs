use std::sync::Arc;

use chronicle::engine::{Stage, StoryConfig, StoryEngine};
use chronicle::error::StoryError;
use chronicle::prompts::story::IMAGE_STYLE;
use chronicle::provider::GeneratedImage;
use chronicle::provider::mock::MockProvider;
use chronicle::story::parse_data_uri;

const CURIE_IDEA: &str = r#"{
    "name": "Marie Curie",
    "storyIdea": "Working late in her cluttered laboratory, discovering the glowing properties of radium.",
    "imagePromptDescription": "A scientist in a lab looking with wonder at a beaker glowing with blue light."
}"#;

const NARRATIVE: &str = "Đêm ấy, trong phòng thí nghiệm chật chội, bà vẫn miệt mài bên những ống nghiệm. \
Ánh sáng xanh huyền ảo bừng lên, và bà hiểu rằng mọi hy sinh đều xứng đáng.";

fn jpeg() -> GeneratedImage {
    GeneratedImage {
        bytes: vec![0xff, 0xd8, 0xff, 0xe0],
        mime_type: "image/jpeg".to_string(),
    }
}

fn engine(mock: &Arc<MockProvider>) -> StoryEngine {
    StoryEngine::new(mock.clone(), StoryConfig::default())
}

/// Run the engine and collect every progress message.
async fn run(mock: &Arc<MockProvider>) -> (Result<chronicle::story::StoryResult, StoryError>, Vec<String>) {
    let mut progress = Vec::new();
    let result = engine(mock).generate(|m| progress.push(m.to_string())).await;
    (result, progress)
}

#[tokio::test]
async fn happy_path_builds_story() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(format!("\n  {NARRATIVE}  \n"))
            .with_images(vec![jpeg()]),
    );

    let (result, _) = run(&mock).await;
    let story = result.unwrap();

    assert_eq!(story.subject_name, "Marie Curie");
    assert_eq!(story.narrative, NARRATIVE);
    assert_eq!(story.image_url, "data:image/jpeg;base64,/9j/4A==");

    let (mime, bytes) = parse_data_uri(&story.image_url).unwrap();
    assert_eq!(mime, "image/jpeg");
    assert_eq!(bytes, jpeg().bytes);
}

#[tokio::test]
async fn progress_reported_three_times_in_order() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![jpeg()]),
    );

    let (result, progress) = run(&mock).await;
    assert!(result.is_ok());
    assert_eq!(
        progress,
        vec![
            Stage::Searching.message(),
            Stage::Writing("Marie Curie").message(),
            Stage::Illustrating("Marie Curie").message(),
        ]
    );
}

#[tokio::test]
async fn requests_follow_the_pipeline_contract() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![jpeg()]),
    );

    run(&mock).await.0.unwrap();

    let texts = mock.text_calls();
    assert_eq!(texts.len(), 2);

    // Idea stage: structured, default temperature.
    let schema = texts[0].schema.as_ref().expect("idea call must carry a schema");
    assert_eq!(schema["required"].as_array().unwrap().len(), 3);
    assert!(texts[0].temperature.is_none());
    assert_eq!(texts[0].model, "gemini-2.5-flash");

    // Narrative stage: name and anecdote embedded, creative temperature.
    assert!(texts[1].schema.is_none());
    assert!(texts[1].prompt.contains("Marie Curie"));
    assert!(texts[1].prompt.contains("discovering the glowing properties of radium"));
    assert!(texts[1].temperature.unwrap() > 0.0);

    let images = mock.image_calls();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].count, 1);
    assert_eq!(images[0].mime_type, "image/jpeg");
    assert_eq!(images[0].aspect_ratio, "16:9");
    assert_eq!(images[0].model, "imagen-4.0-generate-001");
    assert!(images[0].prompt.starts_with("A scientist in a lab"));
    assert!(images[0].prompt.ends_with(IMAGE_STYLE));
}

#[tokio::test]
async fn image_prompt_never_names_the_subject() {
    let leaky = r#"{
        "name": "Elon Musk",
        "storyIdea": "Watching his first rocket fail, then trying again.",
        "imagePromptDescription": "Elon Musk standing before a launch pad at dusk, Musk's jaw set in determination."
    }"#;
    let mock = Arc::new(
        MockProvider::new()
            .with_text(leaky)
            .with_text(NARRATIVE)
            .with_images(vec![jpeg()]),
    );

    let story = run(&mock).await.0.unwrap();
    assert_eq!(story.subject_name, "Elon Musk");

    let prompt = mock.image_calls()[0].prompt.to_lowercase();
    assert!(!prompt.contains("elon musk"));
    assert!(!prompt.contains("musk"));
    assert!(prompt.contains("the entrepreneur"));
}

#[tokio::test]
async fn image_prompt_scrubs_compounds_and_single_names() {
    let cases = [
        ("Oprah", "An Oprah-style talk show set under bright lights, Oprah laughing."),
        ("Elon Musk", "A Musk-built rocket rising over the desert."),
    ];
    for (name, description) in cases {
        let idea = serde_json::json!({
            "name": name,
            "storyIdea": "A turning point.",
            "imagePromptDescription": description,
        })
        .to_string();
        let mock = Arc::new(
            MockProvider::new()
                .with_text(idea)
                .with_text(NARRATIVE)
                .with_images(vec![jpeg()]),
        );

        run(&mock).await.0.unwrap();

        let prompt = mock.image_calls()[0].prompt.to_lowercase();
        for part in name.to_lowercase().split_whitespace() {
            assert!(!prompt.contains(part), "{part} leaked into: {prompt}");
        }
        assert!(prompt.contains("the entrepreneur-"));
    }
}

#[tokio::test]
async fn missing_field_stops_before_downstream_calls() {
    for idea in [
        r#"{"storyIdea": "x", "imagePromptDescription": "y"}"#,
        r#"{"name": "Jack Ma", "imagePromptDescription": "y"}"#,
        r#"{"name": "Jack Ma", "storyIdea": "x"}"#,
    ] {
        let mock = Arc::new(MockProvider::new().with_text(idea));

        let (result, progress) = run(&mock).await;
        assert!(
            matches!(result, Err(StoryError::MalformedResponse(_))),
            "expected MalformedResponse for {idea}"
        );
        assert_eq!(mock.calls().len(), 1, "no downstream call for {idea}");
        assert_eq!(progress.len(), 1);
    }
}

#[tokio::test]
async fn non_json_idea_is_malformed() {
    let mock = Arc::new(MockProvider::new().with_text("I cannot help with that."));
    let (result, _) = run(&mock).await;
    assert!(matches!(result, Err(StoryError::MalformedResponse(_))));
    assert_eq!(mock.calls().len(), 1);
}

#[tokio::test]
async fn blank_narrative_fails_before_image() {
    let mock = Arc::new(MockProvider::new().with_text(CURIE_IDEA).with_text(" \n\t "));

    let (result, progress) = run(&mock).await;
    assert!(matches!(result, Err(StoryError::EmptyNarrative)));
    assert!(mock.image_calls().is_empty());
    assert_eq!(progress.len(), 2);
}

#[tokio::test]
async fn zero_images_is_image_generation_failed() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![]),
    );

    let (result, progress) = run(&mock).await;
    assert!(matches!(result, Err(StoryError::ImageGenerationFailed)));
    assert_eq!(progress.len(), 3);
    assert_eq!(mock.image_calls().len(), 1);
}

#[tokio::test]
async fn empty_image_payload_is_image_generation_failed() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![GeneratedImage {
                bytes: vec![],
                mime_type: "image/jpeg".to_string(),
            }]),
    );

    let (result, _) = run(&mock).await;
    assert!(matches!(result, Err(StoryError::ImageGenerationFailed)));
}

#[tokio::test]
async fn upstream_errors_propagate_unchanged() {
    let mock = Arc::new(MockProvider::new().with_text_error("Gemini API error (429): quota"));
    let (result, _) = run(&mock).await;
    match result {
        Err(StoryError::Upstream(e)) => assert_eq!(e.to_string(), "Gemini API error (429): quota"),
        other => panic!("expected Upstream, got {other:?}"),
    }

    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_image_error("connection reset"),
    );
    let (result, _) = run(&mock).await;
    assert!(matches!(result, Err(StoryError::Upstream(_))));
}

#[tokio::test]
async fn no_retries_after_failure() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text_error("timeout"),
    );
    let (result, _) = run(&mock).await;
    assert!(result.is_err());
    assert_eq!(mock.text_calls().len(), 2);
    assert!(mock.image_calls().is_empty());
}

#[tokio::test]
async fn engine_is_stateless_across_runs() {
    let jack = r#"{"name": "Jack Ma", "storyIdea": "Teaching English.", "imagePromptDescription": "A teacher by a lake."}"#;
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![jpeg()])
            .with_text(jack)
            .with_text("Một câu chuyện khác.")
            .with_images(vec![jpeg()]),
    );
    let engine = engine(&mock);

    let first = engine.generate(|_| {}).await.unwrap();
    let second = engine.generate(|_| {}).await.unwrap();

    assert_eq!(first.subject_name, "Marie Curie");
    assert_eq!(second.subject_name, "Jack Ma");
    assert_eq!(second.narrative, "Một câu chuyện khác.");
}

#[tokio::test]
async fn custom_models_are_used() {
    let mock = Arc::new(
        MockProvider::new()
            .with_text(CURIE_IDEA)
            .with_text(NARRATIVE)
            .with_images(vec![jpeg()]),
    );
    let engine = StoryEngine::new(
        mock.clone(),
        StoryConfig {
            text_model: "gemini-test".to_string(),
            image_model: "imagen-test".to_string(),
            ..StoryConfig::default()
        },
    );

    engine.generate(|_| {}).await.unwrap();

    assert!(mock.text_calls().iter().all(|r| r.model == "gemini-test"));
    assert_eq!(mock.image_calls()[0].model, "imagen-test");
}

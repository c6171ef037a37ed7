use mailcraft::convert::MarkdownConverter;
use mailcraft::templating::{DefaultTemplates, TemplateEngine};
use mailcraft::{ComposeError, Composer, MessageConfig, SendIntent, compose};
use std::fs;
use tempfile::TempDir;

fn setup_templates() -> (TempDir, TemplateEngine) {
    let temp_dir = TempDir::new().unwrap();
    let template_path = temp_dir.path();

    fs::write(
        template_path.join("receipt.txt.liquid"),
        "Order {{ order_id }} for {{ recipient }}\n{{ body }}",
    )
    .unwrap();
    fs::write(
        template_path.join("receipt.html.liquid"),
        "<h1>Order {{ order_id }}</h1>{% if body != \"\" %}<p>{{ body }}</p>{% endif %}",
    )
    .unwrap();

    let engine = TemplateEngine::new(template_path.to_path_buf());
    (temp_dir, engine)
}

#[test]
fn test_plain_text_email_stays_plain() {
    let (_temp_dir, engine) = setup_templates();
    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::default();

    let config = MessageConfig::builder("user@example.com", "Notes")
        .text_body("Line one\n\nLine two")
        .build()
        .unwrap();

    let composed = compose(
        &config,
        SendIntent::text_only(),
        &defaults,
        &engine,
        &converter,
    )
    .unwrap();

    assert_eq!(composed.text.as_deref(), Some("Line one\n\nLine two"));
    assert_eq!(composed.html, None);
}

#[test]
fn test_text_body_is_rendered_as_markdown_html() {
    let (_temp_dir, engine) = setup_templates();
    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::default();

    let config = MessageConfig::builder("user@example.com", "Notes")
        .text_body("Line one\n\nLine two")
        .build()
        .unwrap();

    let composed = compose(
        &config,
        SendIntent::default(),
        &defaults,
        &engine,
        &converter,
    )
    .unwrap();

    assert_eq!(composed.text.as_deref(), Some("Line one\n\nLine two"));
    assert_eq!(
        composed.html.as_deref(),
        Some("<p>Line one</p>\n<p>Line two</p>\n")
    );
}

#[test]
fn test_both_custom_templates_render_with_context() {
    let (_temp_dir, engine) = setup_templates();
    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::default();

    let config = MessageConfig::builder("buyer@example.com", "Your order")
        .text_template("receipt.txt.liquid")
        .html_template("receipt.html.liquid")
        .text_body("Thanks!")
        .context("order_id", "A-42")
        .build()
        .unwrap();

    let composed = Composer::new(&defaults, &engine, &converter)
        .compose(&config, SendIntent::default())
        .unwrap();

    assert_eq!(
        composed.text.as_deref(),
        Some("Order A-42 for buyer@example.com\nThanks!")
    );
    assert_eq!(composed.html.as_deref(), Some("<h1>Order A-42</h1>"));
}

#[test]
fn test_single_template_requires_body_for_other_part() {
    let (_temp_dir, engine) = setup_templates();
    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::default();

    let ambiguous = MessageConfig::builder("buyer@example.com", "Your order")
        .html_template("receipt.html.liquid")
        .build()
        .unwrap();
    let result = compose(
        &ambiguous,
        SendIntent::default(),
        &defaults,
        &engine,
        &converter,
    );
    assert!(matches!(result, Err(ComposeError::AmbiguousTemplateIntent)));

    let covered = MessageConfig::builder("buyer@example.com", "Your order")
        .html_template("receipt.html.liquid")
        .text_body("Order A-42 is on its way")
        .context("order_id", "A-42")
        .build()
        .unwrap();
    let composed = compose(
        &covered,
        SendIntent::default(),
        &defaults,
        &engine,
        &converter,
    )
    .unwrap();
    assert_eq!(composed.text.as_deref(), Some("Order A-42 is on its way"));
    assert_eq!(composed.html.as_deref(), Some("<h1>Order A-42</h1>"));
}

#[test]
fn test_missing_custom_template_propagates() {
    let (_temp_dir, engine) = setup_templates();
    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::default();

    let config = MessageConfig::builder("user@example.com", "Missing")
        .text_template("nope.txt.liquid")
        .build()
        .unwrap();

    let result = compose(
        &config,
        SendIntent::text_only(),
        &defaults,
        &engine,
        &converter,
    );
    assert!(matches!(result, Err(ComposeError::Template(_))));
}

#[test]
fn test_branded_default_template_from_directory() {
    let (temp_dir, engine) = setup_templates();
    fs::write(
        temp_dir.path().join("brand.html.liquid"),
        "<div class=\"brand\">{{ body }}</div>",
    )
    .unwrap();

    let converter = MarkdownConverter::new();
    let defaults = DefaultTemplates::new(
        mailcraft::templating::DEFAULT_TEXT_TEMPLATE,
        "brand.html.liquid",
    );

    let config = MessageConfig::builder("user@example.com", "Branded")
        .text_body("**Hi**")
        .build()
        .unwrap();

    let composed = compose(
        &config,
        SendIntent::default(),
        &defaults,
        &engine,
        &converter,
    )
    .unwrap();

    assert_eq!(composed.text.as_deref(), Some("**Hi**"));
    assert_eq!(
        composed.html.as_deref(),
        Some("<div class=\"brand\"><p><strong>Hi</strong></p>\n</div>")
    );
}

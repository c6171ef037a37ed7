#[cfg(test)]
mod tests {
    use crate::templating::{
        DEFAULT_HTML_TEMPLATE, DEFAULT_TEXT_TEMPLATE, TemplateEngine, TemplateError, TemplateRef,
        TemplateRenderer,
    };
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn setup_test_templates() -> (TempDir, TemplateEngine) {
        let temp_dir = TempDir::new().unwrap();
        let template_path = temp_dir.path();

        fs::create_dir_all(template_path.join("email")).unwrap();

        let welcome_text = r#"Hi {{ user_name | default: "there" }},

{{ body }}

-- The {{ site_name }} team"#;
        fs::write(template_path.join("welcome.txt.liquid"), welcome_text).unwrap();

        let welcome_html = r#"<html>
<body>
    <h1>Welcome to {{ site_name }}</h1>
    {% if body != "" %}<div class="body">{{ body }}</div>{% endif %}
    <p>{{ subject | upcase }}</p>
</body>
</html>"#;
        fs::write(template_path.join("welcome.html.liquid"), welcome_html).unwrap();

        let engine = TemplateEngine::new(template_path.to_path_buf());

        (temp_dir, engine)
    }

    #[test]
    fn test_render_custom_text_template() {
        let (_temp_dir, engine) = setup_test_templates();

        let context = liquid::object!({
            "user_name": "Ada",
            "site_name": "Example",
            "body": "Thanks for signing up.",
        });

        let text = engine
            .render_template(&TemplateRef::from("welcome.txt.liquid"), &context)
            .unwrap();

        assert_eq!(
            text,
            "Hi Ada,\n\nThanks for signing up.\n\n-- The Example team"
        );
    }

    #[test]
    fn test_render_custom_html_template() {
        let (_temp_dir, engine) = setup_test_templates();

        let context = liquid::object!({
            "site_name": "Example",
            "subject": "hello",
            "body": "",
        });

        let html = engine
            .render_template(&TemplateRef::from("welcome.html.liquid"), &context)
            .unwrap();

        assert!(html.contains("<h1>Welcome to Example</h1>"));
        assert!(html.contains("<p>HELLO</p>"));
        assert!(!html.contains("class=\"body\""));
    }

    #[test]
    fn test_builtin_defaults_pass_body_through() {
        let (_temp_dir, engine) = setup_test_templates();

        let context = liquid::object!({
            "body": "Line one\n\nLine two",
        });

        for name in [DEFAULT_TEXT_TEMPLATE, DEFAULT_HTML_TEMPLATE] {
            let rendered = engine
                .render_template(&TemplateRef::from(name), &context)
                .unwrap();
            assert_eq!(rendered, "Line one\n\nLine two");
        }
    }

    #[test]
    fn test_directory_overrides_builtin_default() {
        let (temp_dir, engine) = setup_test_templates();

        fs::write(
            temp_dir.path().join(DEFAULT_HTML_TEMPLATE),
            "<div class=\"brand\">{{ body }}</div>",
        )
        .unwrap();

        let context = liquid::object!({ "body": "<p>Hi</p>" });
        let html = engine
            .render_template(&TemplateRef::from(DEFAULT_HTML_TEMPLATE), &context)
            .unwrap();

        assert_eq!(html, "<div class=\"brand\"><p>Hi</p></div>");
    }

    #[test]
    fn test_extra_builtin() {
        let engine = TemplateEngine::new(std::env::temp_dir().join("mailcraft-missing-dir"))
            .with_builtin("footer.txt.liquid", "-- {{ site_name }}");

        let context = liquid::object!({ "site_name": "Example" });
        let text = engine
            .render_template(&TemplateRef::from("footer.txt.liquid"), &context)
            .unwrap();

        assert_eq!(text, "-- Example");
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let (_temp_dir, engine) = setup_test_templates();

        let result = engine.render_template(
            &TemplateRef::from("does-not-exist.liquid"),
            &liquid::object!({}),
        );

        match result {
            Err(TemplateError::NotFound(name)) => assert_eq!(name, "does-not-exist.liquid"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_template_path_is_io_error() {
        let (_temp_dir, engine) = setup_test_templates();

        // An existing file used as a directory fails with something other than NotFound.
        let result = engine.render_template(
            &TemplateRef::from("welcome.txt.liquid/nested.liquid"),
            &liquid::object!({}),
        );

        assert!(
            matches!(result, Err(TemplateError::Io(_))),
            "expected Io error, got {:?}",
            result
        );
    }

    #[test]
    fn test_missing_partial_error() {
        let temp_dir = TempDir::new().unwrap();
        let template_path = temp_dir.path();

        let bad_content = r#"{% include "_missing.html.liquid" %}"#;
        fs::write(template_path.join("bad.html.liquid"), bad_content).unwrap();

        let engine = TemplateEngine::new(template_path.to_path_buf());

        let result = engine.render_template(
            &TemplateRef::from("bad.html.liquid"),
            &liquid::object!({}),
        );
        assert!(
            matches!(result, Err(TemplateError::Render { .. })),
            "Should fail with missing partial"
        );
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.liquid"), "{% if %}").unwrap();

        let engine = TemplateEngine::new(temp_dir.path().to_path_buf());
        let result =
            engine.render_template(&TemplateRef::from("broken.liquid"), &liquid::object!({}));

        match result {
            Err(TemplateError::Render { name, .. }) => assert_eq!(name, "broken.liquid"),
            other => panic!("expected Render error, got {:?}", other),
        }
    }

    #[test]
    fn test_template_caching_picks_up_changes() {
        let (temp_dir, engine) = setup_test_templates();
        let path = temp_dir.path().join("changing.liquid");
        let name = TemplateRef::from("changing.liquid");
        let context = liquid::object!({});

        fs::write(&path, "first").unwrap();
        assert_eq!(engine.render_template(&name, &context).unwrap(), "first");

        // Served from cache while the file is unchanged
        assert_eq!(engine.render_template(&name, &context).unwrap(), "first");

        fs::write(&path, "second").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        assert_eq!(engine.render_template(&name, &context).unwrap(), "second");
    }
}

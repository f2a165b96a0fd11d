//! End-to-end mailing flow tests
//!
//! Templates are written to a temporary directory and delivery goes to a
//! wiremock server standing in for the mail delivery API.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mail_dispatch_service::mailing::{
    create_config_store, ConfigStore, DeliveryFailure, MailDispatcher, MailingError,
    OutboundMessage, RenderRequest, SetupOptions, TemplateSyntax,
};

fn write_template(dir: &TempDir, file: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_render_then_send() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let store = create_config_store();
    store
        .setup(
            SetupOptions::new(format!("{}/v1/mail", mock_server.uri()), "live-key")
                .template(
                    "default",
                    write_template(&dir, "default.html", "<p>Hello <%= name %></p>"),
                )
                .template(
                    "digest",
                    write_template(
                        &dir,
                        "digest.html",
                        "<ul><% for post in posts %><li><%= post %></li><% endfor %></ul>",
                    ),
                )
                .syntax(TemplateSyntax::Ejs),
        )
        .unwrap();

    let dispatcher = MailDispatcher::new(store.clone());

    let greeting = dispatcher
        .render(&RenderRequest::new(json!({"name": "Ann"})))
        .unwrap();
    assert_eq!(greeting, "<p>Hello Ann</p>");

    let digest = dispatcher
        .render(&RenderRequest::new(json!({"posts": ["one", "two"]})).with_template("digest"))
        .unwrap();
    assert_eq!(digest, "<ul><li>one</li><li>two</li></ul>");

    let messages = vec![
        OutboundMessage {
            to: "ann@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Hello".to_string(),
            html: greeting,
        },
        OutboundMessage {
            to: "ann@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Your digest".to_string(),
            html: digest,
        },
    ];

    Mock::given(method("POST"))
        .and(path("/v1/mail"))
        .and(header("X-Api-Key", "live-key"))
        .and(body_json(json!([
            {
                "to": "ann@example.com",
                "from": "noreply@example.com",
                "subject": "Hello",
                "html": "<p>Hello Ann</p>"
            },
            {
                "to": "ann@example.com",
                "from": "noreply@example.com",
                "subject": "Your digest",
                "html": "<ul><li>one</li><li>two</li></ul>"
            }
        ])))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = dispatcher.send(&messages).await.unwrap();
    assert!(outcome.is_delivered());
}

#[test]
fn test_default_setup_renders_ejs_greeting() {
    let dir = TempDir::new().unwrap();
    let store = create_config_store();
    store
        .setup(SetupOptions::new("http://localhost:9000/mail", "key").template(
            "default",
            write_template(&dir, "default.html", "<p>Hello <%= name %></p>"),
        ))
        .unwrap();

    let html = MailDispatcher::new(store)
        .render(&RenderRequest::new(json!({"name": "Ann"})))
        .unwrap();
    assert_eq!(html, "<p>Hello Ann</p>");
}

#[tokio::test]
async fn test_operations_require_setup() {
    let store = Arc::new(ConfigStore::new());
    let dispatcher = MailDispatcher::new(store);

    assert!(matches!(
        dispatcher.render(&RenderRequest::new(json!({}))),
        Err(MailingError::SetupIncomplete)
    ));
    assert!(matches!(
        dispatcher.send(&[]).await,
        Err(MailingError::SetupIncomplete)
    ));
}

#[tokio::test]
async fn test_resetup_replaces_endpoint_and_key() {
    let first_server = MockServer::start().await;
    let second_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&first_server)
        .await;
    Mock::given(method("POST"))
        .and(header("X-Api-Key", "second-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&second_server)
        .await;

    let store = create_config_store();
    store
        .setup(
            SetupOptions::new(first_server.uri(), "first-key")
                .template("default", write_template(&dir, "first.html", "first <%= n %>"))
                .template("extra", write_template(&dir, "extra.html", "extra")),
        )
        .unwrap();

    let dispatcher = MailDispatcher::new(store.clone());
    assert_eq!(
        dispatcher
            .render(&RenderRequest::new(json!({"n": 1})))
            .unwrap(),
        "first 1"
    );

    store
        .setup(
            SetupOptions::new(second_server.uri(), "second-key")
                .template("default", write_template(&dir, "second.html", "second <%= n %>")),
        )
        .unwrap();

    assert_eq!(
        dispatcher
            .render(&RenderRequest::new(json!({"n": 2})))
            .unwrap(),
        "second 2"
    );
    assert!(matches!(
        dispatcher.render(&RenderRequest::new(json!({})).with_template("extra")),
        Err(MailingError::TemplateNotFound(_))
    ));

    let outcome = dispatcher
        .send(&[OutboundMessage {
            to: "bob@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "second 2".to_string(),
        }])
        .await
        .unwrap();
    assert!(outcome.is_delivered());
}

#[tokio::test]
async fn test_rejected_batch_reports_status() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let store = create_config_store();
    store
        .setup(
            SetupOptions::new(mock_server.uri(), "wrong-key")
                .template("default", write_template(&dir, "default.html", "hi")),
        )
        .unwrap();

    let outcome = MailDispatcher::new(store)
        .send(&[OutboundMessage {
            to: "bob@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "hi".to_string(),
        }])
        .await
        .unwrap();

    assert!(!outcome.is_delivered());
    assert_eq!(
        outcome.failure(),
        Some(&DeliveryFailure::Status {
            status: 401,
            body: None
        })
    );
}

use std::time::Duration;

use pretty_assertions::assert_eq;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::{
    ErrorDetail,
    document::{Document, Node},
    embed::Platform,
    extension::{self, EmbedType, Inserted},
    publish,
    session::{EditingSession, SubmitError, UploadStatus},
    upload::{self, ImageLimits, SelectedFile, fixture, memory},
};

async fn upload_server(url: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "imageUrl": url })),
        )
        .mount(&server)
        .await;
    server
}

fn http_client(server: &MockServer) -> upload::http::Client {
    upload::http::Client::new(
        Url::parse(&format!("{}/api/upload", server.uri())).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_article_with_embeds_and_images() {
    let server = upload_server("https://cdn.example.com/photos/1.png").await;
    let mut session = EditingSession::new(http_client(&server), ImageLimits::default())
        .with_document(Document::parse("<h1>Headline</h1><p>Intro</p>"));

    session
        .insert_embed(Platform::Twitter, "https://x.com/someone/status/1234567890", None)
        .unwrap();
    let reference = session
        .insert_image(SelectedFile::new("photo.png", fixture::png(6, 4)))
        .unwrap();
    session
        .insert_embed(Platform::LinkedIn, "https://www.linkedin.com/posts/someone_title-activity-7100000000000000000-AbCd", None)
        .unwrap();

    session.wait_for_uploads().await;
    assert_eq!(
        session.upload_status(&reference),
        Some(&UploadStatus::Resolved(
            Url::parse("https://cdn.example.com/photos/1.png").unwrap()
        ))
    );

    let html = session.submit().unwrap();
    let published = Document::parse(&html);
    assert_eq!(published.children().len(), 5);
    assert_eq!(
        published.images()[0].src,
        "https://cdn.example.com/photos/1.png"
    );
    let kinds = published.embeds().map(|embed| embed.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            EmbedType::Platform(Platform::Twitter),
            EmbedType::Platform(Platform::LinkedIn)
        ]
    );
    assert_eq!(
        published.embeds().last().map(|embed| embed.src.as_str()),
        Some("https://www.linkedin.com/embed/feed/update/urn:li:activity:7100000000000000000")
    );

    // the editor keeps working on local references
    assert!(matches!(
        &session.document().children()[3],
        Node::Image(image) if image.src == reference.as_str()
    ));
    // submitting again gives the same content
    assert_eq!(session.submit().unwrap(), html);
}

#[tokio::test]
async fn test_rejected_upload_blocks_submit_until_removed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(415).set_body_json(serde_json::json!({ "error": "Unsupported image format" })),
        )
        .mount(&server)
        .await;
    let mut session = EditingSession::new(http_client(&server), ImageLimits::default());
    session
        .insert_embed(Platform::YouTube, "https://www.youtube.com/watch?v=dQw4w9WgXcQ", None)
        .unwrap();
    let reference = session
        .insert_image(SelectedFile::new("photo.png", fixture::png(2, 2)))
        .unwrap();
    session.wait_for_uploads().await;

    assert!(matches!(
        session.submit(),
        Err(SubmitError::FailedUploads { failed }) if failed == vec![reference.clone()]
    ));
    assert!(
        session
            .notices()
            .iter()
            .any(|notice| notice.message == "Unsupported image format")
    );

    session.remove_image(&reference);
    let html = session.submit().unwrap();
    assert_eq!(html, extension::serialize(session.document().embeds().next().unwrap()));
}

#[test]
fn test_persisted_document_reopens_identically() {
    let mut document = Document::new();
    for (platform, url) in [
        (Platform::Instagram, "https://www.instagram.com/p/CxYz123/"),
        (Platform::TikTok, "7212345678901234567"),
        (Platform::Facebook, "https://www.facebook.com/watch/?v=10153231379946729"),
    ] {
        extension::insert(&mut document, platform, url).unwrap();
    }
    assert_eq!(
        extension::insert_or_fallback(&mut document, Platform::Instagram, "https://www.instagram.com/someone/", Some("Profile".into())),
        Ok(Inserted::LinkCard)
    );

    let html = document.to_html();
    let reopened = Document::parse(&html);
    assert_eq!(reopened.children(), document.children());
    assert_eq!(reopened.to_html(), html);
}

#[tokio::test]
async fn test_publish_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::create_dir(dir.path().join("img")).await.unwrap();
    tokio::fs::write(dir.path().join("img/cover.png"), fixture::png(8, 5))
        .await
        .unwrap();
    let document = dir.path().join("story.html");
    tokio::fs::write(
        &document,
        r#"<p>Lead</p><img src="img/cover.png" alt="Cover"><img src="https://cdn.example.com/existing.png" width="1" height="1"><img src="img/cover.png">"#,
    )
    .await
    .unwrap();

    let client = memory::Client::new(Url::parse("https://cdn.example.com/u/").unwrap());
    let html = publish::publish(&document, client, ImageLimits::default())
        .await
        .unwrap();
    let published = Document::parse(&html);
    let images = published.images();
    assert_eq!(images.len(), 3);
    assert!(images[0].src.starts_with("https://cdn.example.com/u/"));
    assert_eq!((images[0].width, images[0].height), (Some(8), Some(5)));
    assert_eq!(images[0].alt.as_deref(), Some("Cover"));
    assert_eq!(images[1].src, "https://cdn.example.com/existing.png");
    assert_eq!((images[1].width, images[1].height), (Some(1), Some(1)));
    assert_eq!(images[2].src, images[0].src);
}

#[tokio::test]
async fn test_publish_reports_failing_image() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("story.html");
    tokio::fs::write(dir.path().join("a.png"), fixture::png(2, 2))
        .await
        .unwrap();
    tokio::fs::write(&document, r#"<img src="a.png"><img src="missing.png">"#)
        .await
        .unwrap();
    let client = memory::Client::new(Url::parse("https://cdn.example.com/u/").unwrap());
    let error = publish::publish(&document, client, ImageLimits::default())
        .await
        .unwrap_err();
    assert!(matches!(*error.detail, ErrorDetail::ReadImage(_)));
    assert_eq!(error.context.image.as_deref(), Some("missing.png"));

    tokio::fs::write(&document, r#"<img src="a.png">"#).await.unwrap();
    let client = memory::Client::new(Url::parse("https://cdn.example.com/u/").unwrap())
        .with_behavior("a.png", memory::Behavior::Fail("storage offline".into()));
    let error = publish::publish(&document, client, ImageLimits::default())
        .await
        .unwrap_err();
    assert!(matches!(
        *error.detail,
        ErrorDetail::Submit(SubmitError::FailedUploads { .. })
    ));
}

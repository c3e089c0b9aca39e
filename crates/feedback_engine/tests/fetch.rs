use std::time::Duration;

use feedback_core::FeedbackUpdate;
use feedback_engine::{
    FeedbackSubmitter, FetchSettings, HttpFeedbackSubmitter, HttpListingSource, ImageSource,
    ListingSource, RemoteErrorKind, ReqwestImageSource, SearchState,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn image_source(server: &MockServer, settings: FetchSettings) -> ReqwestImageSource {
    engine_logging::initialize_for_tests();
    ReqwestImageSource::new(format!("{}/thumbs/{{id}}.jpg", server.uri()), settings)
        .expect("image source")
}

#[tokio::test]
async fn thumbnail_is_downloaded_for_listing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/123.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0xFF, 0xD8, 0xFF], "image/jpeg"))
        .mount(&server)
        .await;

    let source = image_source(&server, FetchSettings::default());
    let bytes = source.fetch_thumbnail("123").await.expect("thumbnail");
    assert_eq!(bytes.as_ref(), &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn listing_id_is_escaped_in_thumbnail_url() {
    let server = MockServer::start().await;
    let source = image_source(&server, FetchSettings::default());
    let url = source.thumbnail_url("a b/c").unwrap();
    assert!(url.as_str().ends_with("/thumbs/a+b%2Fc.jpg"), "{url}");
}

#[tokio::test]
async fn thumbnail_rejects_non_image_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/7.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html/>", "text/html"))
        .mount(&server)
        .await;

    let err = image_source(&server, FetchSettings::default())
        .fetch_thumbnail("7")
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        RemoteErrorKind::UnsupportedContentType {
            content_type: "text/html".to_string()
        }
    );
}

#[tokio::test]
async fn thumbnail_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/404.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = image_source(&server, FetchSettings::default())
        .fetch_thumbnail("404")
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::HttpStatus(404));
}

#[tokio::test]
async fn thumbnail_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/big.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 11], "image/png"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let err = image_source(&server, settings)
        .fetch_thumbnail("big")
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        RemoteErrorKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn thumbnail_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(vec![1u8], "image/png"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let err = image_source(&server, settings)
        .fetch_thumbnail("slow")
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Timeout);
}

#[tokio::test]
async fn listings_are_fetched_with_query_and_decoded() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listings"))
        .and(query_param("q", "brass lamp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"id":"11","title":"Brass lamp","timestamp":42,"details":"deco"},{"id":"12","title":"Lamp"}]"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source =
        HttpListingSource::new(&format!("{}/listings", server.uri()), &FetchSettings::default())
            .unwrap();
    let listings = source
        .fetch_browsable_listings(&SearchState {
            query: " brass lamp ".to_string(),
        })
        .await
        .expect("listings");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].id, "11");
    assert_eq!(listings[0].timestamp, 42);
    assert_eq!(listings[0].details, "deco");
    assert_eq!(listings[1].timestamp, 0);
}

#[tokio::test]
async fn malformed_listing_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/listings"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let source =
        HttpListingSource::new(&format!("{}/listings", server.uri()), &FetchSettings::default())
            .unwrap();
    let err = source
        .fetch_browsable_listings(&SearchState::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Decode);
}

#[tokio::test]
async fn feedback_is_posted_per_listing() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/feedback/55"))
        .and(body_json(serde_json::json!({ "status": "Done" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/feedback/56"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/feedback/57"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let submitter = HttpFeedbackSubmitter::new(
        &format!("{}/feedback/", server.uri()),
        &FetchSettings::default(),
    )
    .unwrap();

    submitter
        .submit_feedback("55", FeedbackUpdate::done())
        .await
        .expect("accepted");
    let conflict = submitter
        .submit_feedback("56", FeedbackUpdate::done())
        .await
        .unwrap_err();
    assert_eq!(conflict.kind, RemoteErrorKind::Rejected);
    let unavailable = submitter
        .submit_feedback("57", FeedbackUpdate::done())
        .await
        .unwrap_err();
    assert_eq!(unavailable.kind, RemoteErrorKind::HttpStatus(503));
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    let err = HttpListingSource::new("not a url", &FetchSettings::default()).unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::InvalidUrl);
}

use gckit::{ApiError, AppStoreConnectClient, ItemKind, upload};
use httpmock::{
    Method::{DELETE, GET, POST},
    MockServer,
};
use serde_json::json;

// Static token keeps the signing logic out of these tests.
fn client_for(server: &MockServer) -> AppStoreConnectClient {
    AppStoreConnectClient::with_static_token("test")
        .unwrap()
        .with_base_url(reqwest::Url::parse(&server.base_url()).unwrap())
}

#[tokio::test]
async fn list_all_concatenates_pages_in_order() {
    let server = MockServer::start_async().await;
    let page2 = server.url("/pages/2?cursor=abc");
    let page3 = server.url("/pages/3");

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/gameCenterDetails/gc1/gameCenterAchievements")
                .query_param("limit", "200")
                .header("authorization", "Bearer test");
            then.status(200).json_body(json!({
                "data": [{"id": "a1"}, {"id": "a2"}],
                "links": {"self": "ignored", "next": page2}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/pages/2").query_param("cursor", "abc");
            then.status(200).json_body(json!({
                "data": [{"id": "a3"}, {"id": "a4"}],
                "links": {"next": page3}
            }));
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(GET).path("/pages/3");
            then.status(200).json_body(json!({
                "data": [{"id": "a5"}, {"id": "a6"}],
                "links": {}
            }));
        })
        .await;

    let client = client_for(&server);
    let listing = client.list_items(ItemKind::Achievement, "gc1").await;

    assert!(listing.is_complete());
    let ids: Vec<String> = listing.items.iter().map(gckit::resource_id).collect();
    assert_eq!(ids, ["a1", "a2", "a3", "a4", "a5", "a6"]);
    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn list_all_returns_partial_items_when_a_page_fails() {
    let server = MockServer::start_async().await;
    let page2 = server.url("/pages/2");
    let page3 = server.url("/pages/3");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/gameCenterLeaderboards/lb1/localizations");
            then.status(200).json_body(json!({
                "data": [{"id": "l1"}, {"id": "l2"}],
                "links": {"next": page2}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pages/2");
            then.status(500).json_body(json!({
                "errors": [{"status": "500", "detail": "upstream exploded"}],
                "links": {"next": page3}
            }));
        })
        .await;
    let never = server
        .mock_async(|when, then| {
            when.method(GET).path("/pages/3");
            then.status(200).json_body(json!({"data": [{"id": "l9"}]}));
        })
        .await;

    let client = client_for(&server);
    let listing = client
        .list_localizations(ItemKind::Leaderboard, "lb1")
        .await;

    assert_eq!(listing.items.len(), 2);
    let err = listing.error.expect("page 2 failure is reported");
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert!(err.summary().contains("upstream exploded"));
    assert_eq!(never.hits_async().await, 0);
}

#[tokio::test]
async fn failed_create_is_a_structured_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gameCenterLeaderboards");
            then.status(409).json_body(json!({
                "errors": [{"status": "409", "title": "Conflict", "detail": "vendorIdentifier already used"}]
            }));
        })
        .await;

    let client = client_for(&server);
    let spec = gckit::gamecenter::LeaderboardSpec::best_score(1);
    let err = client.create_leaderboard("gc1", &spec).await.unwrap_err();

    match &err {
        ApiError::Status {
            method,
            status,
            message,
            ..
        } => {
            assert_eq!(*method, reqwest::Method::POST);
            assert_eq!(status.as_u16(), 409);
            assert_eq!(message, "vendorIdentifier already used");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn created_resource_id_is_returned() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/gameCenterDetails")
                .header("content-type", "application/json")
                .body_contains(r#""id":"123""#);
            then.status(201)
                .json_body(json!({"data": {"type": "gameCenterDetails", "id": "gc-new"}}));
        })
        .await;

    let client = client_for(&server);
    let id = client.create_game_center_detail("123").await.unwrap();
    assert_eq!(id, "gc-new");
    create.assert_async().await;
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/gameCenterAchievementReleases/rel1");
            then.status(204);
        })
        .await;

    let client = client_for(&server);
    client
        .delete_release(ItemKind::Achievement, "rel1")
        .await
        .unwrap();
    delete.assert_async().await;
}

#[tokio::test]
async fn removing_a_missing_image_is_a_no_op() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/gameCenterAchievementLocalizations/loc1/gameCenterAchievementImage");
            then.status(200)
                .json_body(json!({"data": null, "links": {"self": "x"}}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/gameCenterLeaderboardLocalizations/loc2/gameCenterLeaderboardImage");
            then.status(404).json_body(json!({"errors": [{"detail": "not found"}]}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(204);
        })
        .await;

    let client = client_for(&server);
    let removed = upload::remove_existing_image(&client, ItemKind::Achievement, "loc1")
        .await
        .unwrap();
    assert_eq!(removed, None);
    let removed = upload::remove_existing_image(&client, ItemKind::Leaderboard, "loc2")
        .await
        .unwrap();
    assert_eq!(removed, None);
    assert_eq!(delete.hits_async().await, 0);
}

#[tokio::test]
async fn removing_an_existing_image_deletes_it() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/gameCenterAchievementLocalizations/loc1/gameCenterAchievementImage");
            then.status(200)
                .json_body(json!({"data": {"type": "gameCenterAchievementImages", "id": "img7"}}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/gameCenterAchievementImages/img7");
            then.status(204);
        })
        .await;

    let client = client_for(&server);
    let removed = upload::remove_existing_image(&client, ItemKind::Achievement, "loc1")
        .await
        .unwrap();
    assert_eq!(removed.as_deref(), Some("img7"));
    delete.assert_async().await;
}

#[tokio::test]
async fn image_gone_before_delete_is_not_reported_as_removed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/gameCenterLeaderboardLocalizations/loc5/gameCenterLeaderboardImage");
            then.status(200)
                .json_body(json!({"data": {"type": "gameCenterLeaderboardImages", "id": "img5"}}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/gameCenterLeaderboardImages/img5");
            then.status(404).json_body(json!({"errors": [{"detail": "not found"}]}));
        })
        .await;

    let client = client_for(&server);
    let removed = upload::remove_existing_image(&client, ItemKind::Leaderboard, "loc5")
        .await
        .unwrap();
    assert_eq!(removed, None);
    delete.assert_async().await;
}

#[tokio::test]
async fn created_response_without_id_names_the_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/gameCenterDetailReleaseRequests");
            then.status(201).json_body(json!({"data": null}));
        })
        .await;

    let client = client_for(&server);
    let err = client
        .create_detail_release_request("gc1")
        .await
        .unwrap_err();
    match err {
        ApiError::MissingId { url } => {
            assert!(url.ends_with("/v1/gameCenterDetailReleaseRequests"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use photo_api_client::{
	ApiClient, ClientConfig, Environment, ErrorKind, RequestOptions,
	auth::CredentialUpdate,
	http::{FilePart, MultipartForm},
	retry::RetryPolicy,
	store::{MemoryStore, TokenStore},
};

fn build_client(server: &MockServer, retry: RetryPolicy) -> (ApiClient, TokenStore) {
	let config = ClientConfig::builder(Environment::Development)
		.base_url(server.url("/api"))
		.timeout(Duration::from_secs(5))
		.retry_policy(retry)
		.build()
		.expect("Mock server configuration should validate.");
	let store = TokenStore::new(Arc::new(MemoryStore::default()));
	let client = ApiClient::new(&config, store.clone()).expect("Reqwest client should build.");

	(client, store)
}

async fn seed(store: &TokenStore, access: &str, refresh: &str) {
	store
		.store(
			CredentialUpdate::new()
				.access_token(access)
				.refresh_token(refresh)
				.expires_in(Duration::from_secs(3600)),
		)
		.await
		.expect("Seeding the credential should succeed.");
}

#[tokio::test]
async fn signed_get_sends_bearer_and_decodes_json() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server, RetryPolicy::new(1));

	seed(&store, "access-1", "refresh-1").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/groups/g1")
				.header("authorization", "Bearer access-1")
				.header("accept", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"g1\",\"name\":\"Family\"}");
		})
		.await;
	let group: Value =
		client.get("/groups/g1", RequestOptions::new()).await.expect("Signed GET should succeed.");

	assert_eq!(group["name"], "Family");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn query_parameters_are_appended() {
	let server = MockServer::start_async().await;
	let (client, _) = build_client(&server, RetryPolicy::new(1));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/photos/search").query_param("q", "sunset beach");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let photos: Vec<Value> = client
		.get("/photos/search", RequestOptions::new().query("q", "sunset beach"))
		.await
		.expect("Search should succeed.");

	assert!(photos.is_empty());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unavailable_server_is_retried_until_budget_is_spent() {
	let server = MockServer::start_async().await;
	let (client, _) =
		build_client(&server, RetryPolicy::new(3).with_base_delay(Duration::from_millis(5)));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/groups");
			then.status(503).header("content-type", "application/json").body("{\"error\":\"down\"}");
		})
		.await;
	let error =
		client.get::<Value>("/groups", RequestOptions::new()).await.expect_err("503 should fail.");

	assert_eq!(error.kind, ErrorKind::Server);
	assert_eq!(error.message, "down");
	assert_eq!(error.http_status, Some(503));

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn unauthorized_response_refreshes_and_resends() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server, RetryPolicy::new(1));

	seed(&store, "access-old", "refresh-old").await;

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/profile/me").header("authorization", "Bearer access-old");
			then.status(401).body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh")
				.json_body(json!({ "refresh_token": "refresh-old" }));
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-new\",\"refresh_token\":\"refresh-new\",\"expires_in\":3600}",
			);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/profile/me").header("authorization", "Bearer access-new");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"u1\",\"email\":\"ada@example.com\"}");
		})
		.await;
	let me: Value =
		client.get("/profile/me", RequestOptions::new()).await.expect("Resend should succeed.");

	assert_eq!(me["id"], "u1");

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;

	let refresh_token =
		store.get_refresh_token().await.expect("Read should succeed.").expect("Token should exist.");

	assert_eq!(refresh_token.expose(), "refresh-new");
}

#[tokio::test]
async fn multipart_upload_reports_progress_to_completion() {
	let server = MockServer::start_async().await;
	let (client, store) = build_client(&server, RetryPolicy::new(1));

	seed(&store, "access-1", "refresh-1").await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/photos/upload").header("authorization", "Bearer access-1");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"id\":\"p1\",\"group_id\":\"g1\",\"url\":\"https://cdn.test/p1.jpg\"}");
		})
		.await;
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let form = MultipartForm::new().text("group_id", "g1").file(FilePart::new(
		"photo",
		"beach.jpg",
		"image/jpeg",
		vec![7_u8; 200 * 1024],
	));
	let photo: Value = client
		.upload_multipart(
			"/photos/upload",
			form,
			RequestOptions::new().on_progress(move |p| sink.lock().push(p)),
		)
		.await
		.expect("Upload should succeed.");

	assert_eq!(photo["id"], "p1");

	mock.assert_calls_async(1).await;

	let seen = seen.lock();

	assert_eq!(seen.last(), Some(&100));
	assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn binary_download_returns_bytes_and_progress() {
	let server = MockServer::start_async().await;
	let (client, _) = build_client(&server, RetryPolicy::new(1));
	let payload = vec![42_u8; 96 * 1024];
	let body = payload.clone();
	let mock = server
		.mock_async(move |when, then| {
			when.method(GET).path("/api/photos/p1/download");
			then.status(200).header("content-type", "image/jpeg").body(body);
		})
		.await;
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let bytes = client
		.download_binary(
			"/photos/p1/download",
			RequestOptions::new().on_progress(move |p| sink.lock().push(p)),
		)
		.await
		.expect("Download should succeed.");

	assert_eq!(bytes, payload);
	assert_eq!(seen.lock().last(), Some(&100));

	mock.assert_calls_async(1).await;
}

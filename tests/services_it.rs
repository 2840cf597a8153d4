mod common;

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use serde_json::json;
// self
use common::{ScriptedBackend, Step};
use photo_api_client::{
	ClientConfig, ClientContext, Environment, ErrorKind,
	http::RequestBody,
	services::{NewGroup, PhotoService, ProfileUpdate},
	store::token::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY},
};

fn context(backend: Arc<ScriptedBackend>) -> (ClientContext, photo_api_client::store::MemoryStore) {
	let (store, memory) = common::memory_store();

	(ClientContext::with_backend(common::config(common::fast_retry(3)), store, backend), memory)
}

fn grant() -> Step {
	Step::json(
		200,
		json!({
			"access_token": "a1",
			"refresh_token": "r1",
			"expires_in": 3600,
			"user": { "id": "u1", "email": "ada@example.com", "name": "Ada" },
		}),
	)
}

#[tokio::test]
async fn login_persists_grant_and_user() -> Result<()> {
	let backend = ScriptedBackend::new(|_, _| grant());
	let (ctx, memory) = context(backend.clone());
	let session = ctx.auth().login("ada@example.com", "hunter2").await?;

	assert_eq!(session.user.as_ref().map(|u| u.id.as_str()), Some("u1"));
	assert!(session.expires_at.is_some());
	assert!(ctx.auth().is_authenticated().await?);
	assert_eq!(ctx.auth().current_user().await?.and_then(|u| u.name), Some("Ada".into()));
	assert!(memory.contains(REFRESH_TOKEN_KEY));

	let request = &backend.requests()[0];

	assert!(request.url.path().ends_with("/auth/login"));
	assert!(matches!(
		&request.body,
		RequestBody::Json(body) if body["email"] == "ada@example.com" && body["password"] == "hunter2"
	));

	Ok(())
}

#[tokio::test]
async fn login_rejection_surfaces_validation_and_stores_nothing() -> Result<()> {
	let backend =
		ScriptedBackend::new(|_, _| Step::json(400, json!({ "message": "Invalid credentials" })));
	let (ctx, memory) = context(backend.clone());
	let error = ctx.auth().login("ada@example.com", "wrong").await.expect_err("Login should fail.");

	assert_eq!(error.kind(), Some(ErrorKind::Validation));
	assert_eq!(error.to_string(), "Invalid credentials");
	assert!(memory.is_empty());

	Ok(())
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() -> Result<()> {
	let backend = ScriptedBackend::new(|request, _| match request.url.path() {
		"/api/auth/login" => grant(),
		_ => Step::status(500),
	});
	let (ctx, memory) = context(backend.clone());

	ctx.auth().login("ada@example.com", "hunter2").await?;
	ctx.auth().logout().await?;

	assert!(!ctx.auth().is_authenticated().await?);
	assert!(!memory.contains(ACCESS_TOKEN_KEY));
	assert!(!memory.contains(USER_DATA_KEY));
	assert!(backend.calls("/auth/logout") >= 1);

	let logout = &backend.requests_to("/auth/logout")[0];

	assert_eq!(common::bearer(logout).as_deref(), Some("Bearer a1"));
	assert!(matches!(&logout.body, RequestBody::Json(body) if body["refresh_token"] == "r1"));

	Ok(())
}

#[tokio::test]
async fn profile_reads_cache_the_user_record() -> Result<()> {
	let backend = ScriptedBackend::new(|request, _| match request.url.path() {
		"/api/profile/me" =>
			Step::json(200, json!({ "user": { "id": "u1", "email": "ada@example.com", "bio": "hi" } })),
		_ => Step::json(200, json!({ "id": "u1", "email": "ada@example.com", "name": "Ada L." })),
	});
	let (ctx, _) = context(backend.clone());
	let me = ctx.profile().me().await?;

	assert_eq!(me.bio.as_deref(), Some("hi"));
	assert_eq!(ctx.auth().current_user().await?, Some(me));

	let updated = ctx
		.profile()
		.update(&ProfileUpdate { name: Some("Ada L.".into()), bio: None })
		.await?;

	assert_eq!(ctx.auth().current_user().await?, Some(updated));

	let update = &backend.requests_to("/profile")[0];

	assert_eq!(update.method, photo_api_client::http::Method::Put);
	assert!(matches!(&update.body, RequestBody::Json(body) if body == &json!({ "name": "Ada L." })));

	Ok(())
}

#[tokio::test]
async fn photo_listing_sends_paging_query() -> Result<()> {
	let backend = ScriptedBackend::new(|_, _| {
		Step::json(
			200,
			json!({
				"data": [{ "id": "p1", "group_id": "g1", "url": "https://cdn.test/p1.jpg", "likes": 3 }],
				"page": 2,
				"limit": 20,
				"total": 21,
			}),
		)
	});
	let (ctx, _) = context(backend.clone());
	let page = ctx.photos().list_by_group("g1", 2, 0).await?;

	assert_eq!(page.items[0].likes, 3);
	assert_eq!(page.total, Some(21));

	let url = &backend.requests()[0].url;

	assert_eq!(url.path(), "/api/groups/g1/photos");
	assert_eq!(url.query(), Some(&*format!("page=2&limit={}", PhotoService::DEFAULT_PAGE_SIZE)));

	Ok(())
}

#[tokio::test]
async fn group_operations_hit_their_endpoints() -> Result<()> {
	let backend = ScriptedBackend::new(|request, _| match request.url.path() {
		"/api/groups/search" => Step::json(200, json!([{ "id": "g2", "name": "Hiking" }])),
		"/api/groups/g2/leave" => Step::json(200, json!({ "success": true })),
		_ => Step::json(201, json!({ "id": "g1", "name": "Family", "invite_code": "XYZ" })),
	});
	let (ctx, _) = context(backend.clone());
	let created =
		ctx.groups().create(&NewGroup { name: "Family".into(), description: None }).await?;
	let found = ctx.groups().search("hik ing").await?;

	ctx.groups().leave("g2").await?;

	assert_eq!(created.invite_code.as_deref(), Some("XYZ"));
	assert_eq!(found[0].name, "Hiking");

	let requests = backend.requests();

	assert!(matches!(&requests[0].body, RequestBody::Json(body) if body == &json!({ "name": "Family" })));
	assert_eq!(requests[1].url.query(), Some("q=hik+ing"));
	assert!(matches!(&requests[2].body, RequestBody::Json(body) if body == &json!({})));

	Ok(())
}

#[tokio::test]
async fn reconfigure_points_services_at_new_base_url_and_keeps_credentials() -> Result<()> {
	let backend = ScriptedBackend::new(|_, _| Step::json(200, json!([])));
	let (mut ctx, _) = context(backend.clone());

	common::sign_in(ctx.token_store(), "a1", Some("r1")).await;

	let before = ctx.client();
	let config = ClientConfig::builder(Environment::Staging)
		.base_url("https://eu.api.test/api")
		.build()?;

	ctx.reconfigure(config);
	ctx.groups().list().await?;

	let request = &backend.requests()[0];

	assert_eq!(ctx.config().environment, Environment::Staging);
	assert!(!Arc::ptr_eq(&before, &ctx.client()));
	assert_eq!(request.url.as_str(), "https://eu.api.test/api/groups");
	assert_eq!(common::bearer(request).as_deref(), Some("Bearer a1"));

	Ok(())
}

//! Signed-in user's profile.

// self
use crate::{
	_prelude::*,
	auth::CredentialUpdate,
	client::{ApiClient, RequestOptions},
	endpoints,
	http::{FilePart, MultipartForm},
	services::{User, decode_value},
};

/// Editable profile fields; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New biography.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
}

/// Profile endpoints; successful reads refresh the cached user record.
#[derive(Clone, Debug)]
pub struct ProfileService {
	client: Arc<ApiClient>,
}
impl ProfileService {
	/// Creates a service over `client`.
	pub fn new(client: Arc<ApiClient>) -> Self {
		Self { client }
	}

	/// Fetches the signed-in user.
	pub async fn me(&self) -> Result<User> {
		let value: Value = self.client.get(endpoints::profile::ME, RequestOptions::new()).await?;

		self.cache(value).await
	}

	/// Updates profile fields.
	pub async fn update(&self, update: &ProfileUpdate) -> Result<User> {
		let value: Value =
			self.client.put(endpoints::profile::UPDATE, update, RequestOptions::new()).await?;

		self.cache(value).await
	}

	/// Uploads a new avatar image; `options` carries progress and cancellation.
	pub async fn upload_avatar(
		&self,
		file_name: &str,
		mime_type: &str,
		bytes: impl Into<Arc<[u8]>>,
		options: RequestOptions,
	) -> Result<User> {
		let form = MultipartForm::new().file(FilePart::new("avatar", file_name, mime_type, bytes));
		let value: Value =
			self.client.upload_multipart(endpoints::profile::AVATAR, form, options).await?;

		self.cache(value).await
	}

	/// Changes the password of the signed-in account.
	pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
		let payload = serde_json::json!({
			"current_password": current_password,
			"new_password": new_password,
		});
		let _: Value = self
			.client
			.post(endpoints::profile::CHANGE_PASSWORD, &payload, RequestOptions::new())
			.await?;

		Ok(())
	}

	async fn cache(&self, value: Value) -> Result<User> {
		// Some deployments wrap the record as `{ "user": {...} }`.
		let value = match value {
			Value::Object(mut map) if map.contains_key("user") && !map.contains_key("id") =>
				map.remove("user").unwrap_or(Value::Null),
			other => other,
		};
		let user = decode_value::<User>(value.clone())?;

		self.client.token_store().store(CredentialUpdate::new().user(value)).await?;

		Ok(user)
	}
}

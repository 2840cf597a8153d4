//! Photo-sharing groups.

// self
use crate::{
	_prelude::*,
	client::{ApiClient, RequestOptions},
	endpoints,
};

/// Group summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
	/// Server-side identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Optional description.
	#[serde(default)]
	pub description: Option<String>,
	/// Code other users join with.
	#[serde(default)]
	pub invite_code: Option<String>,
	/// Number of members, when reported.
	#[serde(default)]
	pub member_count: Option<u32>,
}

/// Fields for `POST /groups`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NewGroup {
	/// Display name.
	pub name: String,
	/// Optional description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// One member of a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
	/// User identifier.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Role label such as `owner` or `member`.
	#[serde(default)]
	pub role: Option<String>,
}

/// Group endpoints.
#[derive(Clone, Debug)]
pub struct GroupService {
	client: Arc<ApiClient>,
}
impl GroupService {
	/// Creates a service over `client`.
	pub fn new(client: Arc<ApiClient>) -> Self {
		Self { client }
	}

	/// Creates a group owned by the signed-in user.
	pub async fn create(&self, group: &NewGroup) -> Result<Group> {
		Ok(self.client.post(endpoints::groups::ROOT, group, RequestOptions::new()).await?)
	}

	/// Joins a group by invite code.
	pub async fn join(&self, invite_code: &str) -> Result<Group> {
		let payload = serde_json::json!({ "invite_code": invite_code });

		Ok(self.client.post(endpoints::groups::JOIN, &payload, RequestOptions::new()).await?)
	}

	/// Leaves a group.
	pub async fn leave(&self, group_id: &str) -> Result<()> {
		let _: Value = self
			.client
			.post(&endpoints::groups::leave(group_id), &serde_json::json!({}), RequestOptions::new())
			.await?;

		Ok(())
	}

	/// Groups the signed-in user belongs to.
	pub async fn list(&self) -> Result<Vec<Group>> {
		Ok(self.client.get(endpoints::groups::ROOT, RequestOptions::new()).await?)
	}

	/// One group.
	pub async fn details(&self, group_id: &str) -> Result<Group> {
		Ok(self.client.get(&endpoints::groups::details(group_id), RequestOptions::new()).await?)
	}

	/// Members of a group.
	pub async fn members(&self, group_id: &str) -> Result<Vec<Member>> {
		Ok(self.client.get(&endpoints::groups::members(group_id), RequestOptions::new()).await?)
	}

	/// Groups matching `query`.
	pub async fn search(&self, query: &str) -> Result<Vec<Group>> {
		let options = RequestOptions::new().query("q", query);

		Ok(self.client.get(endpoints::groups::SEARCH, options).await?)
	}
}

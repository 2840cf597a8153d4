//! Photos: uploads, listings, reactions, and downloads.

// self
use crate::{
	_prelude::*,
	client::{ApiClient, RequestOptions},
	endpoints,
	http::{FilePart, MultipartForm},
};

/// Photo metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
	/// Server-side identifier.
	pub id: String,
	/// Owning group.
	pub group_id: String,
	/// Display URL.
	pub url: String,
	/// Optional caption.
	#[serde(default)]
	pub caption: Option<String>,
	/// Like counter.
	#[serde(default)]
	pub likes: u32,
	/// Whether the signed-in user liked the photo.
	#[serde(default)]
	pub liked: bool,
}

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Entries on this page.
	#[serde(alias = "photos", alias = "data")]
	pub items: Vec<T>,
	/// 1-based page number.
	pub page: u32,
	/// Page size.
	pub limit: u32,
	/// Total entries, when reported.
	#[serde(default)]
	pub total: Option<u64>,
}

/// Result of toggling a like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
	/// Whether the photo is now liked.
	pub liked: bool,
	/// Updated like counter.
	pub likes: u32,
}

/// Comment on a photo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
	/// Server-side identifier.
	pub id: String,
	/// Comment body.
	pub text: String,
	/// Author identifier.
	#[serde(default)]
	pub author_id: Option<String>,
}

/// File to upload.
#[derive(Clone, Debug)]
pub struct PhotoFile {
	/// File name announced to the server.
	pub file_name: String,
	/// MIME type, e.g. `image/jpeg`.
	pub mime_type: String,
	/// Raw bytes.
	pub bytes: Arc<[u8]>,
}
impl PhotoFile {
	/// Creates an upload payload.
	pub fn new(
		file_name: impl Into<String>,
		mime_type: impl Into<String>,
		bytes: impl Into<Arc<[u8]>>,
	) -> Self {
		Self { file_name: file_name.into(), mime_type: mime_type.into(), bytes: bytes.into() }
	}

	fn into_part(self, field: &str) -> FilePart {
		FilePart::new(field, self.file_name, self.mime_type, self.bytes)
	}
}

/// Photo endpoints.
#[derive(Clone, Debug)]
pub struct PhotoService {
	client: Arc<ApiClient>,
}
impl PhotoService {
	/// Page size used when the caller passes zero.
	pub const DEFAULT_PAGE_SIZE: u32 = 20;

	/// Creates a service over `client`.
	pub fn new(client: Arc<ApiClient>) -> Self {
		Self { client }
	}

	/// Uploads one photo into a group; `options` carries progress and cancellation.
	pub async fn upload(
		&self,
		group_id: &str,
		file: PhotoFile,
		caption: Option<&str>,
		options: RequestOptions,
	) -> Result<Photo> {
		let mut form = MultipartForm::new().text("group_id", group_id);

		if let Some(caption) = caption {
			form = form.text("caption", caption);
		}

		form = form.file(file.into_part("photo"));

		Ok(self.client.upload_multipart(endpoints::photos::UPLOAD, form, options).await?)
	}

	/// Uploads several photos in one request; progress covers all files together.
	pub async fn upload_multiple(
		&self,
		group_id: &str,
		files: Vec<PhotoFile>,
		options: RequestOptions,
	) -> Result<Vec<Photo>> {
		let form = files
			.into_iter()
			.fold(MultipartForm::new().text("group_id", group_id), |form, file| {
				form.file(file.into_part("photos"))
			});

		Ok(self.client.upload_multipart(endpoints::photos::UPLOAD_MULTIPLE, form, options).await?)
	}

	/// Lists a group's photos; `page` is 1-based.
	pub async fn list_by_group(&self, group_id: &str, page: u32, limit: u32) -> Result<Page<Photo>> {
		let limit = if limit == 0 { Self::DEFAULT_PAGE_SIZE } else { limit };
		let options = RequestOptions::new().query("page", page.max(1)).query("limit", limit);

		Ok(self.client.get(&endpoints::groups::photos(group_id), options).await?)
	}

	/// Deletes a photo.
	pub async fn delete(&self, photo_id: &str) -> Result<()> {
		let _: Value =
			self.client.delete(&endpoints::photos::delete(photo_id), RequestOptions::new()).await?;

		Ok(())
	}

	/// Toggles the signed-in user's like.
	pub async fn like(&self, photo_id: &str) -> Result<LikeStatus> {
		Ok(self
			.client
			.post(&endpoints::photos::like(photo_id), &serde_json::json!({}), RequestOptions::new())
			.await?)
	}

	/// Adds a comment.
	pub async fn comment(&self, photo_id: &str, text: &str) -> Result<Comment> {
		let payload = serde_json::json!({ "text": text });

		Ok(self
			.client
			.post(&endpoints::photos::comments(photo_id), &payload, RequestOptions::new())
			.await?)
	}

	/// Downloads the original bytes; `options` carries progress and cancellation.
	pub async fn download(&self, photo_id: &str, options: RequestOptions) -> Result<Vec<u8>> {
		Ok(self.client.download_binary(&endpoints::photos::download(photo_id), options).await?)
	}

	/// Photos matching `query`.
	pub async fn search(&self, query: &str) -> Result<Vec<Photo>> {
		let options = RequestOptions::new().query("q", query);

		Ok(self.client.get(endpoints::photos::SEARCH, options).await?)
	}
}

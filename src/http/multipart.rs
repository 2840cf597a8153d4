//! Transport-agnostic multipart form model.

// self
use crate::_prelude::*;

/// One file attached to a multipart form.
#[derive(Clone)]
pub struct FilePart {
	/// Form field name.
	pub field: String,
	/// File name announced to the server.
	pub file_name: String,
	/// MIME type of the payload.
	pub mime_type: String,
	/// Raw file bytes, shared across retries.
	pub data: Arc<[u8]>,
}
impl FilePart {
	/// Creates a file part.
	pub fn new(
		field: impl Into<String>,
		file_name: impl Into<String>,
		mime_type: impl Into<String>,
		data: impl Into<Arc<[u8]>>,
	) -> Self {
		Self {
			field: field.into(),
			file_name: file_name.into(),
			mime_type: mime_type.into(),
			data: data.into(),
		}
	}

	/// Payload size in bytes.
	pub fn len(&self) -> u64 {
		self.data.len() as u64
	}

	/// Returns `true` if the payload is empty.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}
impl Debug for FilePart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FilePart")
			.field("field", &self.field)
			.field("file_name", &self.file_name)
			.field("mime_type", &self.mime_type)
			.field("len", &self.data.len())
			.finish()
	}
}

/// Multipart form made of text fields and file parts, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MultipartForm {
	/// Text fields.
	pub fields: Vec<(String, String)>,
	/// File parts.
	pub files: Vec<FilePart>,
}
impl MultipartForm {
	/// Starts an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.fields.push((name.into(), value.into()));

		self
	}

	/// Appends a file part.
	pub fn file(mut self, part: FilePart) -> Self {
		self.files.push(part);

		self
	}

	/// Total number of file bytes, which is what upload progress is measured against.
	pub fn file_bytes(&self) -> u64 {
		self.files.iter().map(FilePart::len).sum()
	}
}

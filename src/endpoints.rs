//! REST paths relative to the environment base URL.

/// Session endpoints.
pub mod auth {
	/// `POST` credentials, returns a token grant.
	pub const LOGIN: &str = "/auth/login";
	/// `POST` to revoke the current session server-side.
	pub const LOGOUT: &str = "/auth/logout";
	/// `POST { refresh_token }`, returns a token grant.
	pub const REFRESH: &str = "/auth/refresh";
	/// `POST` a new account, returns a token grant.
	pub const REGISTER: &str = "/auth/register";
	/// `POST { email }` to start a password reset.
	pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
	/// `POST { token, password }` to finish a password reset.
	pub const RESET_PASSWORD: &str = "/auth/reset-password";
}

/// Profile endpoints.
pub mod profile {
	/// `GET` the signed-in user.
	pub const ME: &str = "/profile/me";
	/// `PUT` profile fields.
	pub const UPDATE: &str = "/profile";
	/// `POST` multipart avatar image.
	pub const AVATAR: &str = "/profile/avatar";
	/// `POST { current_password, new_password }`.
	pub const CHANGE_PASSWORD: &str = "/profile/change-password";
}

/// Group endpoints.
pub mod groups {
	/// `POST` to create, `GET` to list.
	pub const ROOT: &str = "/groups";
	/// `POST { invite_code }`.
	pub const JOIN: &str = "/groups/join";
	/// `GET ?q=`.
	pub const SEARCH: &str = "/groups/search";

	/// `GET` one group.
	pub fn details(group_id: &str) -> String {
		format!("/groups/{group_id}")
	}

	/// `POST` to leave a group.
	pub fn leave(group_id: &str) -> String {
		format!("/groups/{group_id}/leave")
	}

	/// `GET` group members.
	pub fn members(group_id: &str) -> String {
		format!("/groups/{group_id}/members")
	}

	/// `GET ?page=&limit=` photos of a group.
	pub fn photos(group_id: &str) -> String {
		format!("/groups/{group_id}/photos")
	}
}

/// Photo endpoints.
pub mod photos {
	/// `POST` multipart single photo.
	pub const UPLOAD: &str = "/photos/upload";
	/// `POST` multipart batch of photos.
	pub const UPLOAD_MULTIPLE: &str = "/photos/upload-multiple";
	/// `GET ?q=`.
	pub const SEARCH: &str = "/photos/search";

	/// `DELETE` a photo.
	pub fn delete(photo_id: &str) -> String {
		format!("/photos/{photo_id}")
	}

	/// `POST` to toggle a like.
	pub fn like(photo_id: &str) -> String {
		format!("/photos/{photo_id}/like")
	}

	/// `POST { text }` to comment.
	pub fn comments(photo_id: &str) -> String {
		format!("/photos/{photo_id}/comments")
	}

	/// `GET` original bytes.
	pub fn download(photo_id: &str) -> String {
		format!("/photos/{photo_id}/download")
	}
}

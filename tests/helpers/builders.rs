use axum::http::{HeaderMap, HeaderValue};
use propertypulse::form::{FilePayload, FormData};
use propertypulse::session::SessionCookie;
use propertypulse::storage;
use sea_orm::DatabaseConnection;

/// Builder for listing submissions. Starts from a complete, valid form.
pub struct FormBuilder {
    fields: Vec<(String, String)>,
    files: Vec<FilePayload>,
}

impl FormBuilder {
    pub fn new() -> Self {
        let fields = [
            ("name", "Cabin"),
            ("type", "Cabin Or Cottage"),
            ("location.street", "1 Pine Rd"),
            ("location.city", "Aspen"),
            ("location.state", "CO"),
            ("location.zipcode", "81611"),
            ("beds", "2"),
            ("baths", "1"),
            ("square_feet", "900"),
            ("description", "Quiet cabin near the lifts"),
            ("amenities", "Wifi"),
            ("amenities", "Fireplace"),
            ("rates.nightly", ""),
            ("rates.weekly", "1200"),
            ("rates.monthly", ""),
            ("seller_info.name", "Sam Seller"),
            ("seller_info.email", "sam@example.com"),
            ("seller_info.phone", "555-0100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Replace every value of `name` with `value`.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.fields.retain(|(k, _)| k != name);
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.fields.retain(|(k, _)| k != name);
        self
    }

    /// Attach an image whose first byte is `tag`.
    pub fn with_image(mut self, name: &str, tag: u8) -> Self {
        self.files
            .push(FilePayload::new(name, "image/jpeg", vec![tag, 0xD8, 0xFF]));
        self
    }

    /// The part a browser sends for an untouched file input.
    pub fn with_empty_file_input(mut self) -> Self {
        self.files
            .push(FilePayload::new("", "application/octet-stream", Vec::new()));
        self
    }

    pub fn build(self) -> FormData {
        let mut form = FormData::new();
        for (k, v) in &self.fields {
            form.append_text(k, v);
        }
        for file in self.files {
            form.append_file("images", file);
        }
        form
    }

    /// Multipart body and boundary for HTTP tests.
    pub fn multipart(self) -> (String, Vec<u8>) {
        let boundary = "XPROPERTYPULSEBOUNDARY".to_string();
        let mut body = Vec::new();
        for (k, v) in &self.fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{k}\"\r\n\r\n{v}\r\n"
                )
                .as_bytes(),
            );
        }
        for file in &self.files {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    file.name, file.content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(&file.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (boundary, body)
    }
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test sessions
pub struct SessionBuilder {
    subject: String,
    ttl: i64,
}

impl SessionBuilder {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            ttl: 3600, // 1 hour
        }
    }

    pub fn expired(mut self) -> Self {
        self.ttl = -60;
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> storage::Session {
        storage::create_session(db, &self.subject, self.ttl)
            .await
            .expect("Failed to create test session")
    }
}

/// Request headers carrying the session cookie.
pub fn session_headers(session_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cookie = SessionCookie::new(session_id.to_string());
    headers.insert(
        axum::http::header::COOKIE,
        HeaderValue::from_str(&cookie.to_request_header()).expect("valid cookie"),
    );
    headers
}

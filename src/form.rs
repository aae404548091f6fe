//! Form handling for listing submissions.
//!
//! A submission arrives as a multi-valued map of field names to text or file
//! entries. This module turns those raw entries into typed listing fields.
//! Dotted names (`location.city`, `rates.nightly`) address nested groups.
use crate::errors::PulseError;
use crate::storage::{Location, PropertyFields, Rates, SellerInfo};
use axum::body::Bytes;
use axum::extract::Multipart;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An uploaded file as received in the submission.
#[derive(Clone, Debug, PartialEq)]
pub struct FilePayload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(name: &str, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Browsers send an unnamed, empty part for a file input left blank.
    pub fn is_attached(&self) -> bool {
        !self.name.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FilePayload),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }
}

/// Ordered multi-valued form map. Entry order is submission order.
#[derive(Clone, Debug, Default)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: FormValue) {
        self.entries.push((name.to_string(), value));
    }

    pub fn append_text(&mut self, name: &str, value: &str) {
        self.append(name, FormValue::Text(value.to_string()));
    }

    pub fn append_file(&mut self, name: &str, file: FilePayload) {
        self.append(name, FormValue::File(file));
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_all_text(&self, name: &str) -> Vec<String> {
        self.get_all(name)
            .filter_map(FormValue::as_text)
            .map(str::to_string)
            .collect()
    }

    /// Attached files under `name`, in submission order.
    pub fn files(&self, name: &str) -> Vec<FilePayload> {
        self.get_all(name)
            .filter_map(|v| match v {
                FormValue::File(f) if f.is_attached() => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drain an HTTP multipart body. Parts carrying a filename become file
    /// entries; everything else is read as text.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, PulseError> {
        let mut form = FormData::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| PulseError::BadRequest(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PulseError::BadRequest(e.to_string()))?;
                form.append_file(&name, FilePayload::new(&file_name, &content_type, bytes));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| PulseError::BadRequest(e.to_string()))?;
                form.append_text(&name, &text);
            }
        }
        Ok(form)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    #[error("is required")]
    Missing,
    #[error("must be text")]
    NotText,
    #[error("must not be blank")]
    Blank,
    #[error("must be a number")]
    NotANumber,
    #[error("must not be negative")]
    Negative,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field} {problem}")]
pub struct FieldError {
    pub field: String,
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn new(field: &str, problem: FieldProblem) -> Self {
        Self {
            field: field.to_string(),
            problem,
        }
    }
}

/// How strictly raw form text is turned into listing fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPolicy {
    /// Blank measures become `0`, malformed numbers become `NaN`.
    #[default]
    Lenient,
    /// Blank or malformed values are reported as field errors.
    Strict,
}

/// Required string field.
pub fn get_string(form: &FormData, path: &str) -> Result<String, FieldError> {
    match form.get(path) {
        Some(FormValue::Text(s)) => Ok(s.clone()),
        Some(FormValue::File(_)) => Err(FieldError::new(path, FieldProblem::NotText)),
        None => Err(FieldError::new(path, FieldProblem::Missing)),
    }
}

/// Optional number: absent or blank yields `None`, anything else is cast.
pub fn parse_optional_number(form: &FormData, path: &str) -> Option<f64> {
    let raw = form.get(path)?.as_text()?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(coerce_number(raw))
}

/// Bare numeric cast: blank is `0`, anything unparseable is `NaN`.
pub fn coerce_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    // Rust also accepts "inf" and "nan" spellings, which are not numbers here
    let lowered = s.to_ascii_lowercase();
    if lowered.contains("inf") || lowered.contains("nan") {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Unsigned digits in `radix`, accumulated as a float so values past
/// `u64::MAX` still round instead of failing. No sign, at least one digit.
fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

struct FieldReader<'a> {
    form: &'a FormData,
    policy: CoercionPolicy,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn string(&mut self, path: &str) -> String {
        match get_string(self.form, path) {
            Ok(s) if self.policy == CoercionPolicy::Strict && s.trim().is_empty() => {
                self.errors.push(FieldError::new(path, FieldProblem::Blank));
                s
            }
            Ok(s) => s,
            Err(e) => {
                self.errors.push(e);
                String::new()
            }
        }
    }

    fn measure(&mut self, path: &str) -> f64 {
        let raw = match get_string(self.form, path) {
            Ok(raw) => raw,
            Err(e) => {
                self.errors.push(e);
                return f64::NAN;
            }
        };

        let value = coerce_number(&raw);
        if self.policy == CoercionPolicy::Strict {
            if raw.trim().is_empty() {
                self.errors.push(FieldError::new(path, FieldProblem::Blank));
            } else if value.is_nan() {
                self.errors.push(FieldError::new(path, FieldProblem::NotANumber));
            } else if value < 0.0 {
                self.errors.push(FieldError::new(path, FieldProblem::Negative));
            }
        }
        value
    }

    fn rate(&mut self, path: &str) -> Option<f64> {
        let value = parse_optional_number(self.form, path);
        if self.policy == CoercionPolicy::Strict {
            match value {
                Some(v) if v.is_nan() => {
                    self.errors.push(FieldError::new(path, FieldProblem::NotANumber));
                }
                Some(v) if v < 0.0 => {
                    self.errors.push(FieldError::new(path, FieldProblem::Negative));
                }
                _ => {}
            }
        }
        value
    }
}

/// Coerce every listing field of a submission. All failing fields are
/// reported together.
pub fn property_fields(
    form: &FormData,
    policy: CoercionPolicy,
) -> Result<PropertyFields, Vec<FieldError>> {
    let mut r = FieldReader {
        form,
        policy,
        errors: Vec::new(),
    };

    let fields = PropertyFields {
        name: r.string("name"),
        property_type: r.string("type"),
        location: Location {
            street: r.string("location.street"),
            city: r.string("location.city"),
            state: r.string("location.state"),
            zipcode: r.string("location.zipcode"),
        },
        beds: r.measure("beds"),
        baths: r.measure("baths"),
        square_feet: r.measure("square_feet"),
        description: r.string("description"),
        amenities: form.get_all_text("amenities"),
        rates: Rates {
            nightly: r.rate("rates.nightly"),
            weekly: r.rate("rates.weekly"),
            monthly: r.rate("rates.monthly"),
        },
        seller_info: SellerInfo {
            name: r.string("seller_info.name"),
            email: r.string("seller_info.email"),
            phone: r.string("seller_info.phone"),
        },
    };

    if r.errors.is_empty() {
        Ok(fields)
    } else {
        Err(r.errors)
    }
}

use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::Path,
    time::Duration,
};

use clap::ValueEnum;
use log::debug;

use crate::{
    args::Args,
    error::{Error, Result},
    utils::{
        parse_key_value_list, validate_body_data, validate_json, validate_timeout, validate_url,
        Separator, APPLICATION_JSON, FORM_URLENCODED, OCTET_STREAM,
    },
};

/// HTTP methods accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Method {
    #[default]
    Get,
    Post,
    Patch,
    Delete,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

/// A file read fully into memory for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Base name of the file on disk.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The single payload of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Data(String),
    Json(String),
    File(FileUpload),
}

impl Body {
    /// Content type injected when the user did not set one.
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Data(_) => FORM_URLENCODED,
            Body::Json(_) => APPLICATION_JSON,
            Body::File(_) => OCTET_STREAM,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Data(text) | Body::Json(text) => text.into_bytes(),
            Body::File(file) => file.bytes,
        }
    }

    fn from_parts(
        data: Option<String>,
        json: Option<String>,
        file: Option<FileUpload>,
    ) -> Option<Self> {
        data.map(Body::Data)
            .or_else(|| json.map(Body::Json))
            .or_else(|| file.map(Body::File))
    }
}

/// A validated outbound request, built once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,
    pub method: Method,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub queries: BTreeMap<String, String>,
    pub body: Option<Body>,
    /// `None` means wait forever.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// Validate and normalise the command line into a request.
    ///
    /// # Arguments
    ///
    /// * `args` - Parsed command line arguments.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The request, or the first fatal validation error.
    pub fn from_args(args: &Args) -> Result<Self> {
        let url = validate_url(&args.url)?;
        let headers = parse_key_value_list(args.headers.as_slice(), Separator::Header).entries;
        let queries = parse_key_value_list(args.queries.as_slice(), Separator::Query).entries;
        let data = validate_body_data(args.data.clone(), &headers);
        let json = validate_json(args.json.clone());
        let file = load_file(args.file.as_deref())?;
        let timeout = validate_timeout(args.timeout)?;

        let headers =
            resolve_content_type(headers, data.as_deref(), json.as_deref(), file.as_ref())?;
        let body = Body::from_parts(data, json, file);

        debug!(
            "Built {} request for {} ({} headers, {} query params)",
            args.method,
            url,
            headers.len(),
            queries.len()
        );

        Ok(Self {
            url,
            method: args.method,
            headers,
            queries,
            body,
            timeout,
        })
    }
}

/// Read the whole upload file into memory.
///
/// Returns `Ok(None)` when no path was given.
pub fn load_file(path: Option<&Path>) -> Result<Option<FileUpload>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::FileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!("Loaded {} bytes from {}", bytes.len(), path.display());

    Ok(Some(FileUpload { name, bytes }))
}

/// Inject a `content-type` header derived from the body variant.
///
/// More than one body variant is always rejected. A content type set by the
/// user is left alone, and no header is added when there is no body.
pub fn resolve_content_type(
    mut headers: BTreeMap<String, String>,
    data: Option<&str>,
    json: Option<&str>,
    file: Option<&FileUpload>,
) -> Result<BTreeMap<String, String>> {
    let mut parts = Vec::with_capacity(3);
    if data.is_some() {
        parts.push(FORM_URLENCODED);
    }
    if json.is_some() {
        parts.push(APPLICATION_JSON);
    }
    if file.is_some() {
        parts.push(OCTET_STREAM);
    }

    if parts.len() > 1 {
        return Err(Error::ConflictingBodyArguments);
    }

    if !headers.contains_key("content-type") {
        if let Some(content_type) = parts.first() {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
    }

    Ok(headers)
}

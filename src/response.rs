use std::{
    fs::File,
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};

use crate::{
    args::Args,
    error::{Error, Result},
    html::prettify,
    utils::split_media_type,
};

const CHUNK_SIZE: usize = 1024;
const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// A received response: header list plus an unread body.
pub struct ResponseView {
    pub status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Box<dyn Read>,
}

impl ResponseView {
    pub fn new<K, V>(headers: Vec<(K, V)>, body: impl Read + 'static) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            status: None,
            headers: headers
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            body: Box::new(body),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<reqwest::blocking::Response> for ResponseView {
    fn from(response: reqwest::blocking::Response) -> Self {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect::<Vec<_>>();
        let mut view = ResponseView::new(headers, response);
        view.status = Some(status);
        view
    }
}

/// How and where a response body is persisted.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory for derived `file_{date}.{subtype}` names. Never created.
    pub save_dir: PathBuf,
    /// Explicit destination overriding the derived name.
    pub output: Option<PathBuf>,
    /// Pause after each chunk so the progress bar is visible.
    pub chunk_delay: Duration,
    pub show_progress: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("./saved"),
            output: None,
            chunk_delay: Duration::from_millis(100),
            show_progress: true,
        }
    }
}

impl From<&Args> for RenderOptions {
    fn from(args: &Args) -> Self {
        Self {
            save_dir: args.save_dir.clone(),
            output: args.output.clone(),
            chunk_delay: Duration::from_millis(args.chunk_delay_ms),
            show_progress: true,
        }
    }
}

/// Print the response headers and persist the body.
///
/// # Arguments
///
/// * `response` - The response, or `None` when the transport produced nothing.
/// * `options` - Where to save the body and how to report progress.
/// * `out` - Destination for headers and echoed content, normally stdout.
///
/// # Returns
///
/// * `Result<Option<PathBuf>>` - The file the body was saved to, if any.
pub fn render_response<W: Write>(
    response: Option<ResponseView>,
    options: &RenderOptions,
    out: &mut W,
) -> Result<Option<PathBuf>> {
    let Some(mut response) = response else {
        writeln!(out, "Client did not receive any response").map_err(Error::Output)?;
        return Ok(None);
    };

    for (key, value) in response.headers() {
        writeln!(out, "{}: {}", key, value).map_err(Error::Output)?;
    }
    writeln!(out).map_err(Error::Output)?;

    let date = response.header("Date").unwrap_or("unknown").to_string();
    let content_length = response
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let Some((media_type, media_subtype)) = response
        .header("Content-Type")
        .and_then(split_media_type)
    else {
        // No usable media type: echo the raw body and skip saving.
        let mut content = Vec::new();
        response
            .body
            .read_to_end(&mut content)
            .map_err(Error::Read)?;
        out.write_all(&content).map_err(Error::Output)?;
        writeln!(out).map_err(Error::Output)?;
        return Ok(None);
    };

    let path = options
        .output
        .clone()
        .unwrap_or_else(|| options.save_dir.join(format!("file_{}.{}", date, media_subtype)));
    debug!("Saving {}/{} body to {}", media_type, media_subtype, path.display());

    let content = stream_to_file(&mut response.body, &path, content_length, options)?;
    info!("Saved {} bytes to {}", content.len(), path.display());

    if media_type == "text" && media_subtype == "html" {
        out.write_all(prettify(&content).as_bytes())
            .map_err(Error::Output)?;
    }

    Ok(Some(path))
}

/// Copy `body` into a new file chunk by chunk, returning everything written.
fn stream_to_file(
    body: &mut dyn Read,
    path: &Path,
    content_length: u64,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(write_error)?;
    let bar = progress_bar(content_length, options.show_progress);
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut content = Vec::with_capacity(content_length.min(MAX_PREALLOCATION) as usize);

    loop {
        let read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                bar.abandon();
                return Err(Error::Read(err));
            }
        };

        file.write_all(&buffer[..read]).map_err(write_error)?;
        content.extend_from_slice(&buffer[..read]);
        bar.inc(read as u64);

        if !options.chunk_delay.is_zero() {
            thread::sleep(options.chunk_delay);
        }
    }

    file.flush().map_err(write_error)?;
    bar.finish();

    Ok(content)
}

fn progress_bar(length: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::with_draw_target(Some(length), ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message("Downloading");
    bar
}

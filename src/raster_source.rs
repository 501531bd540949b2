//! Loading a PNG from either a URL or a local path.

use std::{io, path::PathBuf};

use fs_err as fs;
use image::{DynamicImage, ImageFormat};
use reqwest::{StatusCode, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterSourceError {
    #[error("failed to fetch image from '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch image from '{url}': unexpected response status {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read response body from '{url}'")]
    Read {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to open local image at '{}'", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode image from '{origin}'")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },
}

/// Whether `path` should be fetched over the network: it has to parse as an
/// absolute URL with both a scheme and a host. Everything else, including
/// Windows paths like `C:\border.png`, is treated as a local file.
pub fn is_remote(path: &str) -> bool {
    match Url::parse(path) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

/// Fetches or reads the image at `path` and decodes it as a PNG.
pub fn load_png(path: &str) -> Result<DynamicImage, RasterSourceError> {
    let data = if is_remote(path) {
        fetch_remote(path)?
    } else {
        read_local(path)?
    };

    log::debug!("decoding {} bytes from '{}'", data.len(), path);

    image::load_from_memory_with_format(&data, ImageFormat::Png).map_err(|source| {
        RasterSourceError::Decode {
            origin: path.to_owned(),
            source,
        }
    })
}

fn fetch_remote(url: &str) -> Result<Vec<u8>, RasterSourceError> {
    log::debug!("fetching '{}'", url);

    let response = reqwest::blocking::get(url).map_err(|source| RasterSourceError::Fetch {
        url: url.to_owned(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RasterSourceError::Status {
            url: url.to_owned(),
            status,
        });
    }

    let body = response.bytes().map_err(|source| RasterSourceError::Read {
        url: url.to_owned(),
        source,
    })?;

    Ok(body.to_vec())
}

fn read_local(path: &str) -> Result<Vec<u8>, RasterSourceError> {
    fs::read(path).map_err(|source| RasterSourceError::Open {
        path: PathBuf::from(path),
        source,
    })
}

use std::fmt;

use reqwest::{
    blocking::{Client, Response},
    StatusCode,
};
use thiserror::Error;

const ICON_URL_PREFIX: &str = "https://wow.zamimg.com/images/wow/icons/large/";

#[derive(Debug, Error)]
pub enum IconHostError {
    #[error("icon host HTTP error for '{slug}'")]
    Http {
        slug: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("icon host returned unexpected status {status} for '{slug}'")]
    Status { slug: String, status: StatusCode },

    #[error("'{slug}' is not a valid icon ID")]
    InvalidSlug { slug: String },
}

/// Client for the site that serves the icons, one JPEG per slug.
pub struct IconHost {
    client: Client,
    url_prefix: String,
}

impl fmt::Debug for IconHost {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "IconHost({})", self.url_prefix)
    }
}

impl IconHost {
    pub fn new() -> Self {
        Self::with_url_prefix(ICON_URL_PREFIX)
    }

    /// A host serving `<url_prefix><slug>.jpg`.
    pub fn with_url_prefix(url_prefix: &str) -> Self {
        Self {
            client: Client::new(),
            url_prefix: url_prefix.to_owned(),
        }
    }

    pub fn icon_url(&self, slug: &str) -> String {
        format!("{}{}.jpg", self.url_prefix, slug)
    }

    /// Starts downloading the icon. The body is left unread so it can be
    /// streamed straight into the output.
    pub fn fetch(&self, slug: &str) -> Result<Response, IconHostError> {
        check_slug(slug)?;

        let url = self.icon_url(slug);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| IconHostError::Http {
                slug: slug.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => Err(IconHostError::Status {
                slug: slug.to_owned(),
                status,
            }),
        }
    }
}

impl Default for IconHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Slugs end up in both a URL and a file name, so they must be a single
/// plain path component.
fn check_slug(slug: &str) -> Result<(), IconHostError> {
    let is_valid = !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\', ':', '?', '#'])
        && !slug.chars().any(char::is_control);

    if is_valid {
        Ok(())
    } else {
        Err(IconHostError::InvalidSlug {
            slug: slug.to_owned(),
        })
    }
}

/// Name of the file an icon is saved to, relative to the output directory.
pub fn icon_file_name(slug: &str) -> Result<String, IconHostError> {
    check_slug(slug)?;
    Ok(format!("{}.jpg", slug))
}

use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Args;
use fs_err as fs;
use log::{error, info};

use crate::{
    compositor::{Offset, DEFAULT_BASE_OFFSET, DEFAULT_OVERLAY_OFFSET},
    icon_host::{icon_file_name, IconHost},
    options::Global,
    pipeline::{transform, OverlayPipeline},
    prompt::prompt_for_slugs,
    summary::Summary,
};

pub const DEFAULT_OVERLAY_URL: &str = "https://wow.zamimg.com/images/Icon/large/border/default.png";

#[derive(Debug, Args)]
pub struct DownloadIconsOptions {
    /// The IDs of the icons to download, e.g. classicon_paladin. If none are
    /// given, they are asked for interactively.
    pub ids: Vec<String>,

    /// Path or URL of a PNG image to overlay on top of icons.
    #[clap(long, env("ICON_FETCH_OVERLAY"), default_value(DEFAULT_OVERLAY_URL))]
    pub overlay: String,

    /// If set, nothing will be overlaid on top of icons and they are saved
    /// exactly as downloaded.
    #[clap(long)]
    pub no_overlay: bool,

    /// The point of the icon drawn at the top-left corner of the output, as
    /// X,Y. Defaults to -7,-7, which centers an icon inside the default
    /// border.
    #[clap(long, allow_hyphen_values(true))]
    pub base_offset: Option<Offset>,

    /// The point of the overlay drawn at the top-left corner of the output,
    /// as X,Y. Defaults to 0,0.
    #[clap(long, allow_hyphen_values(true))]
    pub overlay_offset: Option<Offset>,
}

impl DownloadIconsOptions {
    pub fn overlay_path(&self) -> Option<&str> {
        if self.no_overlay {
            None
        } else {
            Some(&self.overlay)
        }
    }
}

pub fn download_icons(_: Global, options: DownloadIconsOptions) -> Result<()> {
    let pipeline = match options.overlay_path() {
        Some(path) => {
            let pipeline = OverlayPipeline::from_path(path)
                .context("could not set up the icon overlay")?
                .with_offsets(
                    options.base_offset.unwrap_or(DEFAULT_BASE_OFFSET),
                    options.overlay_offset.unwrap_or(DEFAULT_OVERLAY_OFFSET),
                );
            Some(pipeline)
        }
        None => None,
    };

    let slugs = if options.ids.is_empty() {
        let stdin = io::stdin();
        match prompt_for_slugs(stdin.lock(), io::stdout())? {
            Some(slugs) => slugs,
            None => return Ok(()),
        }
    } else {
        options.ids
    };

    let host = IconHost::new();
    download_all(&host, &slugs, pipeline.as_ref(), Path::new(".")).log();

    Ok(())
}

/// Downloads every icon in order into `dir`. A failing icon is reported and
/// skipped; it never stops the rest.
fn download_all(
    host: &IconHost,
    slugs: &[String],
    pipeline: Option<&OverlayPipeline>,
    dir: &Path,
) -> Summary {
    let mut failed = 0;
    for slug in slugs {
        info!("Downloading {}...", slug);

        match download_icon(host, slug, pipeline, dir) {
            Ok(path) => info!("Saved {}", path.display()),
            Err(err) => {
                error!("Failed to download {}: {:?}", slug, err);
                failed += 1;
            }
        }
    }

    Summary::from_counts(failed, slugs.len())
}

/// Downloads one icon into `<dir>/<slug>.jpg`. A partly written file is left
/// in place if anything fails after it was created.
fn download_icon(
    host: &IconHost,
    slug: &str,
    pipeline: Option<&OverlayPipeline>,
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join(icon_file_name(slug)?);
    let response = host.fetch(slug)?;

    let mut file = BufWriter::new(fs::File::create(&path)?);
    transform(pipeline, response, &mut file)
        .with_context(|| format!("could not save icon '{}'", slug))?;
    file.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, Rgba, RgbaImage};

    use crate::test_server::{Route, TestServer};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("icon-fetch-{}-{}", std::process::id(), name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn red_jpeg() -> Vec<u8> {
        let rgb = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([255, 0, 0, 255])))
            .into_rgb8();
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, 90)
            .encode_image(&rgb)
            .unwrap();
        data
    }

    fn slugs(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn failures_do_not_stop_the_rest() {
        let icon = red_jpeg();
        let server = TestServer::start(vec![
            Route::new("/icons/first.jpg", 200, icon.clone()),
            Route::new("/icons/last.jpg", 200, icon.clone()),
        ]);
        let host = IconHost::with_url_prefix(&server.url("/icons/"));
        let dir = temp_dir("failures_do_not_stop_the_rest");

        let summary = download_all(
            &host,
            &slugs(&["first", "missing", "../escape", "last"]),
            None,
            &dir,
        );

        assert_eq!(summary, Summary::Partial { failed: 2, total: 4 });
        assert_eq!(fs::read(dir.join("first.jpg")).unwrap(), icon);
        assert_eq!(fs::read(dir.join("last.jpg")).unwrap(), icon);
        assert!(!dir.join("missing.jpg").exists());
        assert!(!dir.join("../escape.jpg").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn all_missing() {
        let server = TestServer::start(Vec::new());
        let host = IconHost::with_url_prefix(&server.url("/icons/"));
        let dir = temp_dir("all_missing");

        let summary = download_all(&host, &slugs(&["a", "b"]), None, &dir);

        assert_eq!(summary, Summary::AllFailed);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn overlay_applied_to_download() {
        let server = TestServer::start(vec![Route::new("/icons/icon.jpg", 200, red_jpeg())]);
        let host = IconHost::with_url_prefix(&server.url("/icons/"));
        let dir = temp_dir("overlay_applied_to_download");
        let pipeline = OverlayPipeline::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            78,
            78,
            Rgba([0, 0, 255, 255]),
        )));

        let path = download_icon(&host, "icon", Some(&pipeline), &dir).unwrap();

        assert_eq!(path, dir.join("icon.jpg"));
        let saved = image::load_from_memory_with_format(&fs::read(&path).unwrap(), ImageFormat::Jpeg)
            .unwrap();
        assert_eq!((saved.width(), saved.height()), (78, 78));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_icon_creates_no_file() {
        let server = TestServer::start(Vec::new());
        let host = IconHost::with_url_prefix(&server.url("/icons/"));
        let dir = temp_dir("missing_icon_creates_no_file");

        let err = download_icon(&host, "nope", None, &dir).unwrap_err();

        assert!(format!("{err:?}").contains("404"), "{err:?}");
        assert!(!dir.join("nope.jpg").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}

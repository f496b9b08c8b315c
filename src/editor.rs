//! Editing session over one generated DocBook document.
//!
//! The session backs the preview/editor front end: it hands out the current
//! markup with an HTML rendering, renders arbitrary markup on request and
//! persists saved markup to disk (and into the zip package, when one is
//! attached).

use crate::error::{Error, Result};
use crate::extract::xml;
use crate::package::replace_root_file;
use crate::render::{HtmlRenderer, MEDIA_DIR};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Prefix under which the service exposes document media.
pub const MEDIA_ROUTE: &str = "/api/media/";

/// Payload of the editor `init` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    /// Book title
    pub title: String,

    /// Current markup
    pub xml: String,

    /// HTML rendering of the markup
    pub html: String,

    /// Whether media files can be served
    #[serde(rename = "hasMultimedia")]
    pub has_multimedia: bool,
}

#[derive(Debug, Default)]
struct Current {
    xml: String,
    title: String,
}

/// The active document of the editor.
#[derive(Debug, Default)]
pub struct EditorSession {
    xml_path: Option<PathBuf>,
    package_path: Option<PathBuf>,
    media_dir: Option<PathBuf>,
    renderer: HtmlRenderer,
    current: RwLock<Current>,
}

impl EditorSession {
    /// Session over in-memory markup that is never written to disk.
    pub fn new(xml: impl Into<String>) -> Self {
        let xml = xml.into();
        let title = title_of(&xml).unwrap_or_default();
        Self {
            renderer: HtmlRenderer::new().with_image_base(MEDIA_ROUTE),
            current: RwLock::new(Current { xml, title }),
            ..Default::default()
        }
    }

    /// Open a markup file. Saves are written back to it.
    ///
    /// Media are looked up in a `multimedia` directory next to the file,
    /// else in the file's own directory (the job directory layout).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)?;
        let title = title_of(&xml).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let media_dir = if parent.join(MEDIA_DIR).is_dir() {
            parent.join(MEDIA_DIR)
        } else {
            parent
        };
        log::info!("Editing {} ({})", path.display(), title);

        Ok(Self {
            xml_path: Some(path.to_path_buf()),
            package_path: None,
            media_dir: Some(media_dir),
            renderer: HtmlRenderer::new().with_image_base(MEDIA_ROUTE),
            current: RwLock::new(Current { xml, title }),
        })
    }

    /// Keep the root markup of a zip package in sync with saves.
    pub fn with_package(mut self, path: impl Into<PathBuf>) -> Self {
        self.package_path = Some(path.into());
        self
    }

    /// Serve media from the given directory.
    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(dir.into());
        self
    }

    /// Current book title.
    pub fn title(&self) -> String {
        self.current.read().title.clone()
    }

    /// Current markup.
    pub fn xml(&self) -> String {
        self.current.read().xml.clone()
    }

    /// Current markup with its HTML rendering.
    pub fn init(&self) -> Result<EditorState> {
        let (xml, title) = {
            let current = self.current.read();
            (current.xml.clone(), current.title.clone())
        };
        if xml.trim().is_empty() {
            return Err(Error::Input("no document loaded".into()));
        }
        let html = self.renderer.render(&xml)?;
        Ok(EditorState {
            title,
            xml,
            html,
            has_multimedia: self.media_dir.is_some(),
        })
    }

    /// Render markup to HTML without touching the session.
    pub fn render_html(&self, xml: &str) -> Result<String> {
        self.renderer.render(xml)
    }

    /// Replace the current markup.
    ///
    /// Malformed markup is rejected and leaves the session unchanged.
    /// Concurrent saves are serialized. The package is rewritten before the
    /// markup file, so a package failure leaves both files untouched.
    pub fn save(&self, xml: &str) -> Result<()> {
        if xml.trim().is_empty() {
            return Err(Error::Input("no XML content provided".into()));
        }
        let root = xml::parse(xml)
            .map_err(|e| Error::Input(format!("markup is not well-formed: {}", e)))?;
        let title = book_title(&root);

        let mut current = self.current.write();
        if let Some(package) = &self.package_path {
            if package.exists() {
                let bytes = replace_root_file(&fs::read(package)?, xml)?;
                write_atomic(package, &bytes)?;
            }
        }
        if let Some(path) = &self.xml_path {
            write_atomic(path, xml.as_bytes())?;
        }

        current.xml = xml.to_string();
        if let Some(title) = title {
            current.title = title;
        }
        log::debug!("Saved {} bytes of markup", xml.len());
        Ok(())
    }

    /// Location of a media file, e.g. "multimedia/img_0001.png".
    ///
    /// Only plain file names inside the media directory resolve.
    pub fn media_path(&self, name: &str) -> Result<PathBuf> {
        let not_found = || Error::FileNotFound(name.to_string());
        let dir = self.media_dir.as_ref().ok_or_else(not_found)?;
        let relative = name
            .strip_prefix(MEDIA_DIR)
            .and_then(|n| n.strip_prefix('/'))
            .unwrap_or(name);

        let mut components = Path::new(relative).components();
        let file = match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => file,
            _ => return Err(not_found()),
        };
        let path = dir.join(file);
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found())
        }
    }
}

fn title_of(markup: &str) -> Option<String> {
    xml::parse(markup).ok().and_then(|root| book_title(&root))
}

fn book_title(root: &xml::Element) -> Option<String> {
    root.child("bookinfo")
        .and_then(|info| info.child("title"))
        .or_else(|| root.child("title"))
        .map(|title| title.text().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

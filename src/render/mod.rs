//! Rendering of content models to DocBook XML and of DocBook to HTML.

mod docbook;
mod escape;
mod html;
mod options;
mod result;

pub use docbook::{render_inline, to_docbook, DocBookGenerator, BOOK_ID, MEDIA_DIR};
pub use escape::{clean_line, clean_text, escape_xml, normalize_text};
pub use html::{to_html, HtmlRenderer};
pub use options::{DocBookOptions, Schema};
pub use result::{ExtractionStats, RenderResult};

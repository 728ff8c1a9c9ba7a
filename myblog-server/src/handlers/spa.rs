use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Static files of the single-page app. Unknown paths fall back to
/// `index.html` with a 200 so client-side routing keeps working.
pub fn spa_service(root: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(root).fallback(ServeFile::new(root.join("index.html")))
}

use std::path::{Path, PathBuf};

use crate::dashboard::io_excel::read_excel_text;
use crate::dashboard::*;

/// The last component of a path, used to label the sources in the summary.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Relative paths are taken from the directory of the configuration.
pub fn resolve_path(root: &Path, file_path: &str) -> PathBuf {
    let p = Path::new(file_path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

pub fn is_excel_path(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("xlsx") | Some("xlsm")
    )
}

/// The text of an export: spreadsheets are flattened, anything else is read
/// as UTF-8 text.
pub fn read_input_text(path: &Path, worksheet: Option<&str>) -> DashboardResult<String> {
    let path_s = path.display().to_string();
    if is_excel_path(path) {
        read_excel_text(&path_s, worksheet)
    } else {
        debug!("read_input_text: path: {:?}", path_s);
        fs::read_to_string(path).context(ReadingInputSnafu { path: path_s })
    }
}

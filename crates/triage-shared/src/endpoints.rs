//! Paths of the error endpoints, relative to the server base URL.

use crate::build::BuildCommand;
use crate::columns::ColumnKey;
use crate::query::{escape, escape_component};

pub const SEARCH_PATH: &str = "errors/search2";
pub const COUNT_PATH: &str = "errors/count2";
pub const GROUP_PATH: &str = "errors/group";
pub const FILE_PATH: &str = "errors/file";
pub const SOURCE_PATH: &str = "errors/source";
pub const ACTION_PATH: &str = "action";

pub fn search(query: &str) -> String {
    format!("{}{}", SEARCH_PATH, query)
}

pub fn count(query: &str) -> String {
    format!("{}{}", COUNT_PATH, query)
}

pub fn group(field: ColumnKey, query: &str) -> String {
    format!("{}/{}{}", GROUP_PATH, field, query)
}

/// Representative row for `content` in the active field
pub fn hide(field: ColumnKey, content: &str) -> String {
    format!("{}?{}={}&hide=true", SEARCH_PATH, field, escape(content))
}

pub fn file(path: &str, child: bool) -> String {
    format!("{}?child={}&file={}", FILE_PATH, child, escape_component(path))
}

pub fn source(path: &str) -> String {
    format!("{}?{}", SOURCE_PATH, escape_component(path))
}

pub fn action(command: &BuildCommand) -> String {
    format!("{}?{}", ACTION_PATH, escape_component(&command.to_string()))
}

/// Join a relative endpoint path onto the base URL
pub fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

include!(concat!(env!("OUT_DIR"), "/psalms.rs"));

/// An embedded file with its path and content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct File {
    pub path: &'static str,
    pub content: &'static str,
}

/// Get a file by its path, e.g. `abc/psalm23.abc`
pub fn get_file(path: &str) -> Option<File> {
    FILES
        .iter()
        .find(|(p, _)| *p == path)
        .map(|&(path, content)| File { path, content })
}

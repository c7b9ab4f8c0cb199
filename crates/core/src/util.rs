use std::io;

/// Short, platform-neutral description of a filesystem error.
///
/// Missing paths always read "no such file or directory" and permission
/// failures "permission denied"; anything else is the OS text lower-cased with
/// the trailing `(os error N)` removed.
pub fn concise_io_error(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "no such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        io::ErrorKind::AlreadyExists => "file exists".to_string(),
        _ => {
            let text = err.to_string();
            let trimmed = match text.find(" (os error") {
                Some(idx) => &text[..idx],
                None => text.as_str(),
            };
            trimmed.trim().to_lowercase()
        }
    }
}

use crate::api::error::AppError;
use std::path::{Component, Path, PathBuf};

/// Longest stored name accepted, in bytes (common filesystem limit)
pub const MAX_FILENAME_LEN: usize = 255;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// Maps every character outside `[A-Za-z0-9_.-]` to `_`.
///
/// The mapping is per character, so the result is deterministic and applying it
/// twice yields the same name. Names that would still be unusable as a single
/// path component (`.`, `..`, empty, over-long) are rejected.
pub fn sanitize_filename(requested: &str) -> Result<String, AppError> {
    if requested.is_empty() {
        return Err(AppError::InvalidInput("Filename is required".to_string()));
    }

    let sanitized: String = requested
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();

    if sanitized == "." || sanitized == ".." {
        return Err(AppError::InvalidInput(format!(
            "Filename '{}' is not allowed",
            requested
        )));
    }

    if sanitized.len() > MAX_FILENAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "Filename exceeds {} characters",
            MAX_FILENAME_LEN
        )));
    }

    Ok(sanitized)
}

/// Resolves a caller-supplied name to a path directly inside `root`.
///
/// Names are not re-sanitized here; anything that could step outside the
/// storage directory is rejected instead.
pub fn resolve_in_root(root: &Path, name: &str) -> Result<PathBuf, AppError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        tracing::warn!("Rejected file name outside storage directory: {:?}", name);
        return Err(AppError::InvalidInput(format!("Invalid file name '{}'", name)));
    }

    let path = root.join(name);

    // Exactly one normal component below the root
    let mut rest = match path.strip_prefix(root) {
        Ok(rest) => rest.components(),
        Err(_) => {
            return Err(AppError::InvalidInput(format!("Invalid file name '{}'", name)));
        }
    };
    match (rest.next(), rest.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => {
            tracing::warn!("Rejected file name outside storage directory: {:?}", name);
            Err(AppError::InvalidInput(format!("Invalid file name '{}'", name)))
        }
    }
}

/// Human-readable size with binary prefixes, e.g. `512 B`, `1.50 KB`, `3.00 GB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{:.2} KB", kb);
    }
    let mb = kb / 1024.0;
    if mb < 1024.0 {
        return format!("{:.2} MB", mb);
    }
    format!("{:.2} GB", mb / 1024.0)
}

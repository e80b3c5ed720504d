use std::fs;
use std::io;
use std::path::Path;

use zip::ZipArchive;

use crate::error::PaperfetchError;

/// Walks every entry once without writing anything; truncated or hostile
/// archives fail here, before extraction starts.
pub fn validate_zip(zip_path: &Path) -> Result<(), PaperfetchError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        PaperfetchError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        if entry.enclosed_name().is_none() {
            return Err(PaperfetchError::Filesystem(
                "zip entry path traversal detected".to_string(),
            ));
        }
        if !entry.is_dir() {
            io::copy(&mut entry, &mut io::sink())
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        }
    }
    Ok(())
}

pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), PaperfetchError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        PaperfetchError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(PaperfetchError::Filesystem(
                    "zip entry path traversal detected".to_string(),
                ));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
            continue;
        }
        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        }
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|err| PaperfetchError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

/// Last path segment of a URL, with any query string dropped. Used to name
/// files fetched by the generic URL handler.
pub fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let trimmed = without_query.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if segment.is_empty() || segment.contains(':') {
        "download".to_string()
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_plain_url() {
        assert_eq!(filename_from_url("https://example.com/data.zip"), "data.zip");
    }

    #[test]
    fn filename_ignores_query_and_fragment() {
        assert_eq!(
            filename_from_url("https://example.com/a/b/data.tar.gz?token=x#frag"),
            "data.tar.gz"
        );
    }

    #[test]
    fn filename_falls_back_for_bare_host() {
        assert_eq!(filename_from_url("https://example.com/"), "example.com");
        assert_eq!(filename_from_url("https://"), "download");
    }
}

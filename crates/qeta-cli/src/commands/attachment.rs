//! Attachment command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use qeta_core::{AttachmentParams, LocationType, Store};

use crate::output::Output;

/// Location type for an external URI
fn external_location(uri: &str) -> LocationType {
    if uri.starts_with("s3://") {
        LocationType::S3
    } else {
        LocationType::Filesystem
    }
}

/// MIME type and extension guessed from the file name
fn describe(path: &Path) -> (String, String) {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    (mime.essence_str().to_string(), extension)
}

/// Build store parameters for `file`, inline unless `external` is given
pub fn params_for(file: &Path, external: Option<String>, creator: Option<&str>) -> Result<AttachmentParams> {
    let (mime_type, extension) = describe(file);

    let mut params = match external {
        Some(uri) => {
            let location = external_location(&uri);
            AttachmentParams::external(location, uri, mime_type, extension)
                .with_path(file.to_string_lossy())
        }
        None => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read attachment: {:?}", file))?;
            AttachmentParams::inline(bytes, mime_type, extension)
        }
    };
    if let Some(creator) = creator {
        params = params.with_creator(creator);
    }
    Ok(params)
}

/// Store a file as an attachment
pub fn add(
    store: &Store,
    user: Option<&str>,
    file: PathBuf,
    external: Option<String>,
    output: &Output,
) -> Result<()> {
    let params = params_for(&file, external, user)?;
    let attachment = store
        .post_attachment(&params)
        .context("Failed to store attachment")?;

    let message = format!("Stored attachment #{} ({})", attachment.id, attachment.uuid);
    output.attachment_changed(&message, &attachment)
}

/// Show an attachment, or write its content to `out`
pub fn get(store: &Store, uuid: String, out: Option<PathBuf>, output: &Output) -> Result<()> {
    let attachment = store
        .get_attachment(&uuid)?
        .ok_or_else(|| anyhow::anyhow!("Attachment not found: {}", uuid))?;

    match out {
        Some(path) => {
            let Some(bytes) = &attachment.binary_image else {
                bail!(
                    "Attachment {} is stored at {}, not in the database",
                    uuid,
                    attachment.location_uri
                );
            };
            std::fs::write(&path, bytes)
                .with_context(|| format!("Failed to write attachment to {:?}", path))?;
            output.success(&format!("Wrote {} bytes to {}", bytes.len(), path.display()));
            Ok(())
        }
        None => output.print_attachment(&attachment),
    }
}

use fieldreport_core::TransportFileRef;
use reqwest::Url;
use std::path::Path;

/// Name for the relayed object: the transport's unique file id plus the
/// original extension.
///
/// The extension comes from the user's file name, else from the transport's
/// storage path, else `default_extension`.
pub fn object_name(file: &TransportFileRef, source_path: Option<&str>, default_extension: &str) -> String {
    let ext = file
        .file_name
        .as_deref()
        .and_then(extension_of)
        .or_else(|| source_path.and_then(extension_of))
        .unwrap_or_else(|| default_extension.trim_start_matches('.').to_ascii_lowercase());

    let stem = if file.file_unique_id.is_empty() {
        &file.file_id
    } else {
        &file.file_unique_id
    };

    if ext.is_empty() {
        stem.clone()
    } else {
        format!("{stem}.{ext}")
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Rewrite provider "viewer" links into direct-download links.
///
/// Google Drive serves `/file/d/<id>/view` and `/open?id=<id>` as an HTML
/// viewer; consumers that embed the link need `/uc?export=download&id=<id>`.
/// Other URLs are returned unchanged.
pub fn normalize_download_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.host_str() != Some("drive.google.com") {
        return url.to_string();
    }

    let segments: Vec<&str> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
    let id = match segments.as_slice() {
        ["file", "d", id, ..] => Some((*id).to_string()),
        ["open"] => parsed
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned()),
        _ => None,
    };

    match id {
        Some(id) if !id.is_empty() => format!("https://drive.google.com/uc?export=download&id={id}"),
        _ => url.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fieldreport_core::MediaKind;

    fn file(name: Option<&str>) -> TransportFileRef {
        TransportFileRef {
            file_id: "BQACAgIAAxk".into(),
            file_unique_id: "AgADxw4AAi".into(),
            file_name: name.map(String::from),
            mime_type: None,
            file_size: None,
            kind: MediaKind::Document,
        }
    }

    #[test]
    fn name_uses_original_extension() {
        assert_eq!(object_name(&file(Some("Plan.PDF")), None, ".jpg"), "AgADxw4AAi.pdf");
    }

    #[test]
    fn name_falls_back_to_source_path() {
        assert_eq!(
            object_name(&file(None), Some("photos/file_12.png"), ".jpg"),
            "AgADxw4AAi.png"
        );
    }

    #[test]
    fn name_falls_back_to_default_extension() {
        assert_eq!(object_name(&file(Some("README")), None, ".jpg"), "AgADxw4AAi.jpg");
        assert_eq!(object_name(&file(None), Some("documents/file_3"), "bin"), "AgADxw4AAi.bin");
    }

    #[test]
    fn drive_view_url_becomes_download_url() {
        assert_eq!(
            normalize_download_url("https://drive.google.com/file/d/1AbC_dEf/view?usp=drivesdk"),
            "https://drive.google.com/uc?export=download&id=1AbC_dEf"
        );
        assert_eq!(
            normalize_download_url("https://drive.google.com/open?id=1AbC"),
            "https://drive.google.com/uc?export=download&id=1AbC"
        );
    }

    #[test]
    fn other_urls_are_untouched() {
        let gcs = "https://storage.googleapis.com/bucket/AgAD.jpg";
        assert_eq!(normalize_download_url(gcs), gcs);
        assert_eq!(normalize_download_url("not a url"), "not a url");
        let already = "https://drive.google.com/uc?export=download&id=1AbC";
        assert_eq!(normalize_download_url(already), already);
    }
}

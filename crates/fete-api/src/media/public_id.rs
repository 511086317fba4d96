//! Recovering the Cloudinary public id from a delivery URL:
//! `/<cloud>/<resource_type>/upload/[transformations/][v<digits>/]<public_id>.<ext>`

use url::Url;

use super::{MediaAsset, ResourceType};

/// Transformation parameter names; a path segment made only of
/// `<key>_<value>` pairs with these keys is a transformation, not a folder.
const TRANSFORMATION_KEYS: &[&str] = &[
    "a", "ac", "af", "ar", "b", "bo", "br", "c", "co", "cs", "d", "dl", "dn", "dpr", "du", "e",
    "eo", "f", "fl", "fn", "fps", "g", "h", "if", "ki", "l", "o", "p", "pg", "q", "r", "so",
    "sp", "t", "u", "vc", "vs", "w", "x", "y", "z",
];

/// `None` for anything that is not a Cloudinary delivery URL.
pub fn extract(raw: &str) -> Option<MediaAsset> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    if host != "cloudinary.com" && !host.ends_with(".cloudinary.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let upload = segments.iter().position(|s| *s == "upload")?;
    if upload == 0 {
        return None;
    }

    let resource_type = match segments[upload - 1] {
        "video" => ResourceType::Video,
        "raw" => ResourceType::Raw,
        _ => ResourceType::Image,
    };

    let rest = &segments[upload + 1..];
    let rest = match rest.iter().position(|s| is_version(s)) {
        Some(v) => &rest[v + 1..],
        None => {
            let skip = rest.iter().take_while(|s| is_transformation(s)).count();
            &rest[skip..]
        }
    };

    let (last, folders) = rest.split_last()?;
    let stem = match last.rfind('.') {
        Some(dot) if dot > 0 && resource_type != ResourceType::Raw => &last[..dot],
        _ => last,
    };
    if stem.is_empty() {
        return None;
    }

    let mut public_id = folders.join("/");
    if !public_id.is_empty() {
        public_id.push('/');
    }
    public_id.push_str(stem);

    Some(MediaAsset {
        resource_type,
        public_id,
    })
}

fn is_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn is_transformation(segment: &str) -> bool {
    segment.split(',').all(|part| {
        part.split_once('_')
            .is_some_and(|(key, value)| !value.is_empty() && TRANSFORMATION_KEYS.contains(&key))
    })
}

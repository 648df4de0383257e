//! Product image URL helpers.

/// Size suffix used for cart drawer thumbnails.
pub const THUMBNAIL_SIZE: &str = "128x128";

/// Rewrite an image URL to its 128x128 thumbnail variant.
///
/// The CDN serves resized images when a `_<width>x<height>` suffix is placed
/// before the file extension: `product.jpg` becomes `product_128x128.jpg`.
/// Only the last path segment is considered, and a query string or fragment
/// is carried over untouched. URLs whose last segment has no extension are
/// returned as-is.
///
/// ## Examples
///
/// ```
/// use cart_drawer_core::thumbnail_url;
///
/// assert_eq!(
///     thumbnail_url("https://cdn/x/product.jpg"),
///     "https://cdn/x/product_128x128.jpg"
/// );
/// assert_eq!(thumbnail_url("https://cdn/x/product"), "https://cdn/x/product");
/// ```
#[must_use]
pub fn thumbnail_url(url: &str) -> String {
    sized_image_url(url, THUMBNAIL_SIZE)
}

/// Insert an arbitrary `_<size>` suffix before the file extension.
#[must_use]
pub fn sized_image_url(url: &str, size: &str) -> String {
    let suffix_start = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(suffix_start);

    // A bare origin ("https://cdn.example.com") has no file segment at all
    if let Some(authority) = path.find("//").and_then(|i| path.get(i + 2..))
        && !authority.contains('/')
    {
        return url.to_string();
    }

    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let Some(dot) = path.get(segment_start..).and_then(|segment| segment.rfind('.')) else {
        return url.to_string();
    };
    let dot = segment_start + dot;

    // "name." or ".hidden" have no usable stem/extension pair
    if dot == segment_start || dot + 1 == path.len() {
        return url.to_string();
    }

    let (stem, extension) = path.split_at(dot);
    format!("{stem}_{size}{extension}{suffix}")
}
